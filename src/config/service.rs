// Backup-config lookup seam consumed by the cleaner, plus an in-memory
// implementation that also carries the platform's validated write path.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use super::types::{BackupConfig, DatabasePlan};
use super::validate::ValidationError;
use crate::environment::Environment;

/// Errors from config-service operations.
#[derive(Debug, Error)]
pub enum ConfigServiceError {
    /// No configuration stored for the database.
    #[error("backup config not found for database {0}")]
    NotFound(Uuid),

    /// The configuration failed validation on the write path.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The underlying config store failed.
    #[error("config query failed: {0}")]
    QueryFailed(String),
}

/// Read surface the cleaner consumes.
#[async_trait]
pub trait BackupConfigService: Send + Sync {
    /// Configurations with `is_backups_enabled` set, one per database.
    async fn get_backup_configs_with_enabled_backups(
        &self,
    ) -> Result<Vec<BackupConfig>, ConfigServiceError>;
}

/// [`BackupConfigService`] backed by a concurrent in-memory map.
///
/// Carries the write path as inherent methods: saving validates the config
/// against the database's plan first, so invalid records never become
/// visible to the cleaner.
pub struct MemoryBackupConfigService {
    environment: Environment,
    configs: DashMap<Uuid, BackupConfig>,
    plans: DashMap<Uuid, DatabasePlan>,
}

impl MemoryBackupConfigService {
    /// Creates an empty service for the given environment.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            configs: DashMap::new(),
            plans: DashMap::new(),
        }
    }

    /// Sets the plan used to validate the database's config. Databases
    /// without an explicit plan validate against an unlimited one.
    pub fn set_plan(&self, database_id: Uuid, plan: DatabasePlan) {
        self.plans.insert(database_id, plan);
    }

    /// Validates and stores a configuration, replacing any previous one
    /// for the same database.
    pub async fn save_backup_config(
        &self,
        config: BackupConfig,
    ) -> Result<BackupConfig, ConfigServiceError> {
        let plan = self
            .plans
            .get(&config.database_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(DatabasePlan::unlimited);

        config.validate(&plan, &self.environment)?;

        self.configs.insert(config.database_id, config.clone());
        Ok(config)
    }

    /// The stored configuration of a database, if any.
    pub fn get_backup_config(&self, database_id: Uuid) -> Option<BackupConfig> {
        self.configs.get(&database_id).map(|entry| entry.value().clone())
    }

    /// Removes a database's configuration.
    pub fn remove_backup_config(&self, database_id: Uuid) {
        self.configs.remove(&database_id);
    }
}

#[async_trait]
impl BackupConfigService for MemoryBackupConfigService {
    async fn get_backup_configs_with_enabled_backups(
        &self,
    ) -> Result<Vec<BackupConfig>, ConfigServiceError> {
        Ok(self
            .configs
            .iter()
            .filter(|entry| entry.value().is_backups_enabled)
            .map(|entry| entry.value().clone())
            .collect())
    }
}
