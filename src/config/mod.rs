//! Backup configuration records, plan limits, and their validation.

mod service;
mod types;
mod validate;

pub use service::{BackupConfigService, ConfigServiceError, MemoryBackupConfigService};
pub use types::{
    BackupConfig, BackupEncryption, BackupInterval, BackupNotificationType, DatabasePlan,
    RetentionPolicyType, ScheduleInterval,
};
pub use validate::ValidationError;
