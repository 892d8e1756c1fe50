//! Backup catalog rows and the repository seam.
//!
//! The catalog owns one row per produced backup. The retention engine is a
//! non-owning consumer: it queries rows through [`BackupRepository`] and
//! deletes them, but never creates or updates them.

mod memory;

pub use memory::MemoryBackupRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested backup row does not exist.
    #[error("backup not found: {0}")]
    NotFound(Uuid),

    /// The underlying catalog store failed.
    #[error("catalog query failed: {0}")]
    QueryFailed(String),
}

/// Terminal states a backup can occupy in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupStatus {
    /// Still being produced; immune to deletion.
    InProgress,
    /// Finished successfully; the only status counted against size caps.
    Completed,
    /// Production failed; the blob may or may not exist.
    Failed,
}

/// One catalog row per produced backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Row identity.
    pub id: Uuid,
    /// Database the backup belongs to.
    pub database_id: Uuid,
    /// Object store the blob was written to.
    pub storage_id: Uuid,
    /// Terminal state.
    pub status: BackupStatus,
    /// Blob size in MiB.
    pub backup_size_mb: f64,
    /// Creation instant, UTC.
    pub created_at: DateTime<Utc>,
    /// Object-store key of the main blob.
    pub file_name: String,
}

/// Query and delete surface of the backup catalog.
///
/// Ordering contracts matter: the count and GFS policies rely on
/// newest-first results, the size enforcer on oldest-first.
#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// All backups of a database created strictly before `before`,
    /// any status, newest first.
    async fn find_backups_before_date(
        &self,
        database_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Vec<Backup>, CatalogError>;

    /// Backups of a database in the given status, newest first.
    async fn find_by_database_id_and_status(
        &self,
        database_id: Uuid,
        status: BackupStatus,
    ) -> Result<Vec<Backup>, CatalogError>;

    /// Up to `limit` backups of a database, oldest first, excluding
    /// in-progress ones.
    async fn find_oldest_by_database_excluding_in_progress(
        &self,
        database_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Backup>, CatalogError>;

    /// Sum of `backup_size_mb` over the database's completed backups.
    async fn get_total_size_by_database(&self, database_id: Uuid) -> Result<f64, CatalogError>;

    /// Deletes a row by id. Deleting a nonexistent id is benign.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), CatalogError>;

    /// All backups of a database, newest first.
    async fn find_by_database_id(&self, database_id: Uuid) -> Result<Vec<Backup>, CatalogError>;

    /// Inserts or replaces a row. The backup scheduler's write path; also
    /// used by embedders and tests to seed state.
    async fn save(&self, backup: Backup) -> Result<(), CatalogError>;
}
