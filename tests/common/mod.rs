// Shared fixtures for the cleaner integration tests: in-memory
// collaborators, scripted storage backends, and listener doubles.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use backup_retention::catalog::{Backup, BackupRepository, BackupStatus, MemoryBackupRepository};
use backup_retention::cleaner::{BackupRemoveListener, Cleaner};
use backup_retention::config::{
    BackupConfig, BackupConfigService, BackupEncryption, BackupInterval, ConfigServiceError,
    MemoryBackupConfigService, RetentionPolicyType, ScheduleInterval,
};
use backup_retention::storage::{
    FieldEncryptor, MemoryStorageService, PlaintextFieldEncryptor, StorageBackend, StorageError,
};
use backup_retention::Environment;

/// Storage backend that records every deleted file name and always
/// succeeds.
#[derive(Default)]
pub struct RecordingStorageBackend {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl StorageBackend for RecordingStorageBackend {
    async fn delete_file(
        &self,
        _encryptor: &dyn FieldEncryptor,
        file_name: &str,
    ) -> Result<(), StorageError> {
        self.deleted.lock().unwrap().push(file_name.to_string());
        Ok(())
    }
}

impl RecordingStorageBackend {
    pub fn deleted_files(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

/// Storage backend that fails every call, as an unreachable object store
/// would.
pub struct FailingStorageBackend;

#[async_trait]
impl StorageBackend for FailingStorageBackend {
    async fn delete_file(
        &self,
        _encryptor: &dyn FieldEncryptor,
        _file_name: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::Backend("storage offline".to_string()))
    }
}

/// Listener that appends its name to a shared log when invoked.
pub struct OrderTrackingListener {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl BackupRemoveListener for OrderTrackingListener {
    async fn on_before_backup_remove(&self, _backup: &Backup) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.name);
        Ok(())
    }
}

/// Listener that vetoes every removal.
pub struct RejectingListener;

#[async_trait]
impl BackupRemoveListener for RejectingListener {
    async fn on_before_backup_remove(&self, backup: &Backup) -> anyhow::Result<()> {
        anyhow::bail!("removal of {} vetoed", backup.id)
    }
}

/// Config service that returns a fixed list, bypassing write-path
/// validation. For exercising the cleaner against legacy rows a validator
/// would no longer accept.
pub struct StaticConfigService(pub Vec<BackupConfig>);

#[async_trait]
impl BackupConfigService for StaticConfigService {
    async fn get_backup_configs_with_enabled_backups(
        &self,
    ) -> Result<Vec<BackupConfig>, ConfigServiceError> {
        Ok(self.0.iter().filter(|c| c.is_backups_enabled).cloned().collect())
    }
}

pub fn make_backup(
    database_id: Uuid,
    storage_id: Uuid,
    status: BackupStatus,
    size_mb: f64,
    age: Duration,
) -> Backup {
    let id = Uuid::new_v4();
    Backup {
        id,
        database_id,
        storage_id,
        status,
        backup_size_mb: size_mb,
        created_at: Utc::now() - age,
        file_name: format!("{database_id}/{id}.dump"),
    }
}

/// Valid enabled config: time-period policy with FOREVER retention, a daily
/// schedule, and no size caps. Tests adjust the fields they exercise.
pub fn base_config(database_id: Uuid, storage_id: Uuid) -> BackupConfig {
    BackupConfig {
        database_id,
        is_backups_enabled: true,
        retention_policy_type: RetentionPolicyType::TimePeriod,
        retention_time_period: Some(backup_retention::Period::Forever),
        retention_count: 0,
        retention_gfs_hours: 0,
        retention_gfs_days: 0,
        retention_gfs_weeks: 0,
        retention_gfs_months: 0,
        retention_gfs_years: 0,
        backup_interval_id: None,
        backup_interval: Some(BackupInterval {
            interval: ScheduleInterval::Daily,
            time_of_day: Some("04:00".to_string()),
        }),
        storage_id: Some(storage_id),
        send_notifications_on: vec![],
        is_retry_if_failed: false,
        max_failed_tries_count: 0,
        encryption: BackupEncryption::None,
        max_backup_size_mb: 0,
        max_backups_total_size_mb: 0,
    }
}

/// Fully wired cleaner over in-memory collaborators and a recording
/// storage backend.
pub struct Harness {
    pub repository: MemoryBackupRepository,
    pub storage_service: MemoryStorageService,
    pub config_service: Arc<MemoryBackupConfigService>,
    pub storage: Arc<RecordingStorageBackend>,
    pub storage_id: Uuid,
    pub cleaner: Cleaner,
}

pub fn harness() -> Harness {
    let repository = MemoryBackupRepository::new();
    let storage_service = MemoryStorageService::new();
    let storage = Arc::new(RecordingStorageBackend::default());
    let storage_id = Uuid::new_v4();
    storage_service.register(storage_id, storage.clone());

    let config_service = Arc::new(MemoryBackupConfigService::new(Environment::self_hosted()));

    let cleaner = Cleaner::new(
        Arc::new(repository.clone()),
        Arc::new(storage_service.clone()),
        config_service.clone(),
        Arc::new(PlaintextFieldEncryptor),
    );

    Harness {
        repository,
        storage_service,
        config_service,
        storage,
        storage_id,
        cleaner,
    }
}

/// Ids of the backups still present for a database.
pub async fn remaining_ids(repository: &MemoryBackupRepository, database_id: Uuid) -> Vec<Uuid> {
    repository
        .find_by_database_id(database_id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect()
}
