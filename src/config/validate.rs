// Configuration validation against plan limits. Runs on the platform's
// write path before a config is persisted; checks run in a fixed order and
// the first failure is returned.

use thiserror::Error;

use super::types::{BackupConfig, BackupEncryption, DatabasePlan, RetentionPolicyType};
use crate::environment::Environment;
use crate::period::Period;

/// A backup configuration rejected by [`BackupConfig::validate`].
///
/// Messages are part of the platform contract: the write path surfaces them
/// to users verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No schedule reference and no inline schedule.
    #[error("backup interval is required")]
    BackupIntervalRequired,

    /// Time-period policy without a period.
    #[error("retention time period is required")]
    RetentionTimePeriodRequired,

    /// Configured period is longer than the plan allows.
    #[error("storage period exceeds plan limit")]
    StoragePeriodExceedsPlanLimit,

    /// Count policy with a zero budget.
    #[error("retention count must be greater than 0")]
    RetentionCountNotPositive,

    /// GFS policy with every slot budget at zero.
    #[error("at least one GFS retention field must be greater than 0")]
    GfsRetentionFieldsAllZero,

    /// Unrecognized policy type.
    #[error("invalid retention policy type")]
    InvalidRetentionPolicyType,

    /// Retries enabled without a positive budget.
    #[error("max failed tries count must be greater than 0")]
    MaxFailedTriesCountNotPositive,

    /// Unrecognized encryption value.
    #[error("encryption must be NONE or ENCRYPTED")]
    InvalidEncryption,

    /// Cloud deployments require encrypted backups.
    #[error("encryption is mandatory for cloud storage")]
    EncryptionMandatoryForCloud,

    /// Negative per-backup size cap.
    #[error("max backup size must be non-negative")]
    MaxBackupSizeNegative,

    /// Negative total-size cap.
    #[error("max backups total size must be non-negative")]
    MaxBackupsTotalSizeNegative,

    /// Per-backup size cap over the plan limit, or unlimited where the
    /// plan caps it.
    #[error("max backup size exceeds plan limit")]
    MaxBackupSizeExceedsPlanLimit,

    /// Total-size cap over the plan limit, or unlimited where the plan
    /// caps it.
    #[error("max total backups size exceeds plan limit")]
    MaxTotalSizeExceedsPlanLimit,
}

impl BackupConfig {
    /// Checks this configuration for internal consistency and against the
    /// database's plan. Returns the first violation.
    pub fn validate(
        &self,
        plan: &DatabasePlan,
        environment: &Environment,
    ) -> Result<(), ValidationError> {
        if self.backup_interval_id.is_none() && self.backup_interval.is_none() {
            return Err(ValidationError::BackupIntervalRequired);
        }

        self.validate_retention_policy(plan)?;

        if self.is_retry_if_failed && self.max_failed_tries_count <= 0 {
            return Err(ValidationError::MaxFailedTriesCountNotPositive);
        }

        if matches!(self.encryption, BackupEncryption::Other(_)) {
            return Err(ValidationError::InvalidEncryption);
        }

        if environment.is_cloud && self.encryption != BackupEncryption::Encrypted {
            return Err(ValidationError::EncryptionMandatoryForCloud);
        }

        if self.max_backup_size_mb < 0 {
            return Err(ValidationError::MaxBackupSizeNegative);
        }

        if self.max_backups_total_size_mb < 0 {
            return Err(ValidationError::MaxBackupsTotalSizeNegative);
        }

        // 0 means unlimited in the config, which is itself a violation when
        // the plan caps the value.
        if plan.max_backup_size_mb > 0
            && (self.max_backup_size_mb == 0 || self.max_backup_size_mb > plan.max_backup_size_mb)
        {
            return Err(ValidationError::MaxBackupSizeExceedsPlanLimit);
        }

        if plan.max_backups_total_size_mb > 0
            && (self.max_backups_total_size_mb == 0
                || self.max_backups_total_size_mb > plan.max_backups_total_size_mb)
        {
            return Err(ValidationError::MaxTotalSizeExceedsPlanLimit);
        }

        Ok(())
    }

    fn validate_retention_policy(&self, plan: &DatabasePlan) -> Result<(), ValidationError> {
        match &self.retention_policy_type {
            RetentionPolicyType::TimePeriod => {
                let period = self
                    .retention_time_period
                    .ok_or(ValidationError::RetentionTimePeriodRequired)?;

                if plan.max_storage_period != Period::Forever && period > plan.max_storage_period {
                    return Err(ValidationError::StoragePeriodExceedsPlanLimit);
                }

                Ok(())
            }

            RetentionPolicyType::Count => {
                if self.retention_count == 0 {
                    return Err(ValidationError::RetentionCountNotPositive);
                }
                Ok(())
            }

            RetentionPolicyType::Gfs => {
                if self.retention_gfs_hours == 0
                    && self.retention_gfs_days == 0
                    && self.retention_gfs_weeks == 0
                    && self.retention_gfs_months == 0
                    && self.retention_gfs_years == 0
                {
                    return Err(ValidationError::GfsRetentionFieldsAllZero);
                }
                Ok(())
            }

            RetentionPolicyType::Other(_) => Err(ValidationError::InvalidRetentionPolicyType),
        }
    }
}
