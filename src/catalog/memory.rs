// In-memory backup catalog for embedders without a SQL catalog and for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{Backup, BackupRepository, BackupStatus, CatalogError};

/// [`BackupRepository`] backed by a concurrent in-memory map.
#[derive(Clone, Default)]
pub struct MemoryBackupRepository {
    backups: std::sync::Arc<DashMap<Uuid, Backup>>,
}

impl MemoryBackupRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn backups_of(&self, database_id: Uuid) -> Vec<Backup> {
        self.backups
            .iter()
            .filter(|entry| entry.value().database_id == database_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

fn newest_first(mut backups: Vec<Backup>) -> Vec<Backup> {
    backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    backups
}

fn oldest_first(mut backups: Vec<Backup>) -> Vec<Backup> {
    backups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    backups
}

#[async_trait]
impl BackupRepository for MemoryBackupRepository {
    async fn find_backups_before_date(
        &self,
        database_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Vec<Backup>, CatalogError> {
        let matching = self
            .backups_of(database_id)
            .into_iter()
            .filter(|b| b.created_at < before)
            .collect();
        Ok(newest_first(matching))
    }

    async fn find_by_database_id_and_status(
        &self,
        database_id: Uuid,
        status: BackupStatus,
    ) -> Result<Vec<Backup>, CatalogError> {
        let matching = self
            .backups_of(database_id)
            .into_iter()
            .filter(|b| b.status == status)
            .collect();
        Ok(newest_first(matching))
    }

    async fn find_oldest_by_database_excluding_in_progress(
        &self,
        database_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Backup>, CatalogError> {
        let matching = self
            .backups_of(database_id)
            .into_iter()
            .filter(|b| b.status != BackupStatus::InProgress)
            .collect();
        let mut oldest = oldest_first(matching);
        oldest.truncate(limit);
        Ok(oldest)
    }

    async fn get_total_size_by_database(&self, database_id: Uuid) -> Result<f64, CatalogError> {
        Ok(self
            .backups_of(database_id)
            .iter()
            .filter(|b| b.status == BackupStatus::Completed)
            .map(|b| b.backup_size_mb)
            .sum())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), CatalogError> {
        self.backups.remove(&id);
        Ok(())
    }

    async fn find_by_database_id(&self, database_id: Uuid) -> Result<Vec<Backup>, CatalogError> {
        Ok(newest_first(self.backups_of(database_id)))
    }

    async fn save(&self, backup: Backup) -> Result<(), CatalogError> {
        self.backups.insert(backup.id, backup);
        Ok(())
    }
}
