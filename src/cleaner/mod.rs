//! The background cleaner: retention-policy evaluation, total-size
//! enforcement, and the backup deletion pipeline.
//!
//! One [`Cleaner`] runs per deployment. [`Cleaner::run`] drives a periodic
//! tick that first applies each database's retention policy and then
//! converges each database's total footprint under its size cap. Every
//! deletion goes through the same pipeline: pre-removal hooks, best-effort
//! object-store cleanup, then the authoritative catalog delete.

mod gfs;

pub use gfs::{build_gfs_keep_set, GfsSlots};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{Backup, BackupRepository, BackupStatus, CatalogError};
use crate::config::{BackupConfig, BackupConfigService, ConfigServiceError, RetentionPolicyType};
use crate::storage::{FieldEncryptor, StorageError, StorageService};

/// How often the cleaner wakes up.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Rolling window after creation during which no policy may delete a
/// backup.
pub const GRACE_PERIOD_MINUTES: i64 = 60;

/// Errors from the deletion pipeline and the cleaner phases.
#[derive(Debug, Error)]
pub enum CleanerError {
    /// A pre-removal hook vetoed the deletion.
    #[error("pre-removal hook rejected backup {backup_id}: {source}")]
    ListenerRejected {
        /// Backup the hook vetoed.
        backup_id: Uuid,
        /// The hook's error.
        #[source]
        source: anyhow::Error,
    },

    /// Storage-handle lookup failed; the catalog row is left untouched.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The authoritative catalog delete failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Config listing failed; the whole phase is skipped this tick.
    #[error(transparent)]
    Config(#[from] ConfigServiceError),
}

/// Hook invoked before a backup is removed. Returning an error aborts that
/// single deletion; nothing is mutated.
#[async_trait]
pub trait BackupRemoveListener: Send + Sync {
    /// Called with the backup about to be removed.
    async fn on_before_backup_remove(&self, backup: &Backup) -> anyhow::Result<()>;
}

/// Timing knobs of the cleaner. The defaults are the design constants;
/// tests shrink them.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Wake-up interval of the periodic loop.
    pub tick_interval: Duration,
    /// Grace window protecting just-created backups.
    pub grace_period: chrono::Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            grace_period: chrono::Duration::minutes(GRACE_PERIOD_MINUTES),
        }
    }
}

/// Background driver that deletes backups past their retention policy and
/// converges databases under their total-size cap.
pub struct Cleaner {
    repository: Arc<dyn BackupRepository>,
    storage_service: Arc<dyn StorageService>,
    config_service: Arc<dyn BackupConfigService>,
    field_encryptor: Arc<dyn FieldEncryptor>,
    listeners: Vec<Arc<dyn BackupRemoveListener>>,
    config: CleanerConfig,
    has_run: AtomicBool,
}

impl Cleaner {
    /// Creates a cleaner over the given collaborators with default timing.
    pub fn new(
        repository: Arc<dyn BackupRepository>,
        storage_service: Arc<dyn StorageService>,
        config_service: Arc<dyn BackupConfigService>,
        field_encryptor: Arc<dyn FieldEncryptor>,
    ) -> Self {
        Self {
            repository,
            storage_service,
            config_service,
            field_encryptor,
            listeners: Vec::new(),
            config: CleanerConfig::default(),
            has_run: AtomicBool::new(false),
        }
    }

    /// Overrides the timing configuration.
    pub fn with_config(mut self, config: CleanerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a pre-removal hook. Hooks run in registration order.
    /// Registration must happen before [`Cleaner::run`] starts.
    pub fn add_backup_remove_listener(&mut self, listener: Arc<dyn BackupRemoveListener>) {
        self.listeners.push(listener);
    }

    /// Runs the periodic cleaning loop until `cancel` fires.
    ///
    /// Strictly single-shot: the first call owns the loop for the lifetime
    /// of the cleaner, and a second call panics.
    ///
    /// # Panics
    ///
    /// Panics when called more than once on the same instance.
    pub async fn run(&self, cancel: CancellationToken) {
        if self.has_run.swap(true, Ordering::SeqCst) {
            panic!("Cleaner::run() called multiple times");
        }

        if cancel.is_cancelled() {
            return;
        }

        let mut ticker = interval_at(
            Instant::now() + self.config.tick_interval,
            self.config.tick_interval,
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(error) = self.clean_by_retention_policy().await {
                        error!(error = %error, "failed to clean backups by retention policy");
                    }

                    if let Err(error) = self.clean_exceeded_backups().await {
                        error!(error = %error, "failed to clean exceeded backups");
                    }
                }
            }
        }
    }

    /// One pass of the retention phase: applies each enabled database's
    /// retention policy. [`Cleaner::run`] invokes this every tick; it is
    /// public so embedders can drive ticks themselves.
    pub async fn clean_by_retention_policy(&self) -> Result<(), CleanerError> {
        let configs = self
            .config_service
            .get_backup_configs_with_enabled_backups()
            .await?;

        for config in &configs {
            let result = match config.retention_policy_type {
                RetentionPolicyType::Count => self.clean_by_count(config).await,
                RetentionPolicyType::Gfs => self.clean_by_gfs(config).await,
                // Time-period is also the fallback for legacy rows with an
                // unrecognized policy type.
                _ => self.clean_by_time_period(config).await,
            };

            if let Err(error) = result {
                error!(
                    database_id = %config.database_id,
                    policy = %config.retention_policy_type,
                    error = %error,
                    "failed to clean backups by retention policy"
                );
            }
        }

        Ok(())
    }

    /// One pass of the size phase: converges each enabled database with a
    /// total-size cap by evicting from the oldest end.
    pub async fn clean_exceeded_backups(&self) -> Result<(), CleanerError> {
        let configs = self
            .config_service
            .get_backup_configs_with_enabled_backups()
            .await?;

        for config in &configs {
            if config.max_backups_total_size_mb <= 0 {
                continue;
            }

            if let Err(error) = self
                .clean_exceeded_for_database(config.database_id, config.max_backups_total_size_mb)
                .await
            {
                error!(
                    database_id = %config.database_id,
                    error = %error,
                    "failed to clean exceeded backups for database"
                );
            }
        }

        Ok(())
    }

    /// Removes one backup end-to-end: pre-removal hooks, then the blob and
    /// its metadata companion (best effort), then the catalog row
    /// (authoritative).
    pub async fn delete_backup(&self, backup: &Backup) -> Result<(), CleanerError> {
        for listener in &self.listeners {
            listener
                .on_before_backup_remove(backup)
                .await
                .map_err(|source| CleanerError::ListenerRejected {
                    backup_id: backup.id,
                    source,
                })?;
        }

        let storage = self
            .storage_service
            .get_storage_by_id(backup.storage_id)
            .await?;

        // Storage may be temporarily unreachable or already cleaned up; the
        // catalog row must still be reconciled so listings stay accurate.
        if let Err(error) = storage
            .delete_file(self.field_encryptor.as_ref(), &backup.file_name)
            .await
        {
            warn!(
                backup_id = %backup.id,
                file_name = %backup.file_name,
                error = %error,
                "failed to delete backup file"
            );
        }

        let metadata_file_name = format!("{}.metadata", backup.file_name);
        if let Err(error) = storage
            .delete_file(self.field_encryptor.as_ref(), &metadata_file_name)
            .await
        {
            warn!(
                backup_id = %backup.id,
                file_name = %metadata_file_name,
                error = %error,
                "failed to delete backup metadata file"
            );
        }

        self.repository.delete_by_id(backup.id).await?;
        Ok(())
    }

    async fn clean_by_time_period(&self, config: &BackupConfig) -> Result<(), CleanerError> {
        let Some(period) = config.retention_time_period else {
            return Ok(());
        };
        // FOREVER keeps everything.
        let Some(retention) = period.duration() else {
            return Ok(());
        };

        let cutoff = Utc::now() - retention;
        let expired = self
            .repository
            .find_backups_before_date(config.database_id, cutoff)
            .await?;

        for backup in &expired {
            if self.is_recent(backup) {
                continue;
            }

            if let Err(error) = self.delete_backup(backup).await {
                error!(backup_id = %backup.id, error = %error, "failed to delete expired backup");
                continue;
            }

            info!(
                backup_id = %backup.id,
                database_id = %config.database_id,
                "deleted backup past retention period"
            );
        }

        Ok(())
    }

    async fn clean_by_count(&self, config: &BackupConfig) -> Result<(), CleanerError> {
        if config.retention_count == 0 {
            return Ok(());
        }

        let completed = self
            .repository
            .find_by_database_id_and_status(config.database_id, BackupStatus::Completed)
            .await?;

        // Newest first; everything beyond position retention_count is excess.
        if completed.len() <= config.retention_count as usize {
            return Ok(());
        }

        for backup in &completed[config.retention_count as usize..] {
            if self.is_recent(backup) {
                continue;
            }

            if let Err(error) = self.delete_backup(backup).await {
                error!(
                    backup_id = %backup.id,
                    error = %error,
                    "failed to delete backup by count policy"
                );
                continue;
            }

            info!(
                backup_id = %backup.id,
                database_id = %config.database_id,
                retention_count = config.retention_count,
                "deleted backup by count policy"
            );
        }

        Ok(())
    }

    async fn clean_by_gfs(&self, config: &BackupConfig) -> Result<(), CleanerError> {
        let slots = GfsSlots {
            hours: config.retention_gfs_hours,
            days: config.retention_gfs_days,
            weeks: config.retention_gfs_weeks,
            months: config.retention_gfs_months,
            years: config.retention_gfs_years,
        };
        if slots.is_empty() {
            return Ok(());
        }

        let completed = self
            .repository
            .find_by_database_id_and_status(config.database_id, BackupStatus::Completed)
            .await?;

        let keep = build_gfs_keep_set(&completed, slots);

        for backup in &completed {
            if keep.contains(&backup.id) {
                continue;
            }

            if self.is_recent(backup) {
                continue;
            }

            if let Err(error) = self.delete_backup(backup).await {
                error!(
                    backup_id = %backup.id,
                    error = %error,
                    "failed to delete backup by GFS policy"
                );
                continue;
            }

            info!(
                backup_id = %backup.id,
                database_id = %config.database_id,
                "deleted backup by GFS policy"
            );
        }

        Ok(())
    }

    async fn clean_exceeded_for_database(
        &self,
        database_id: Uuid,
        limit_mb: i64,
    ) -> Result<(), CleanerError> {
        loop {
            let total_size_mb = self
                .repository
                .get_total_size_by_database(database_id)
                .await?;

            if total_size_mb <= limit_mb as f64 {
                break;
            }

            let oldest = self
                .repository
                .find_oldest_by_database_excluding_in_progress(database_id, 1)
                .await?;

            let Some(backup) = oldest.first() else {
                warn!(
                    database_id = %database_id,
                    total_size_mb,
                    limit_mb,
                    "backups exceed size limit but none are deletable"
                );
                break;
            };

            // If the oldest candidate is still inside the grace window, every
            // survivor is newer; nothing is deletable this tick.
            if self.is_recent(backup) {
                warn!(
                    database_id = %database_id,
                    backup_id = %backup.id,
                    total_size_mb,
                    limit_mb,
                    "oldest backup is too recent to delete, stopping size cleanup"
                );
                break;
            }

            if let Err(error) = self.delete_backup(backup).await {
                error!(
                    backup_id = %backup.id,
                    database_id = %database_id,
                    error = %error,
                    "failed to delete backup while enforcing size limit"
                );
                return Err(error);
            }

            info!(
                backup_id = %backup.id,
                database_id = %database_id,
                backup_size_mb = backup.backup_size_mb,
                total_size_mb,
                limit_mb,
                "deleted backup to enforce total size limit"
            );
        }

        Ok(())
    }

    fn is_recent(&self, backup: &Backup) -> bool {
        Utc::now() - backup.created_at < self.config.grace_period
    }
}
