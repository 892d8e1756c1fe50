//! Retention engine for a managed database-backup service.
//!
//! A surrounding platform takes scheduled logical backups of user
//! databases, stores the blobs (plus a metadata companion) in the user's
//! object store, and records one catalog row per backup. This crate is the
//! background subsystem that decides which recorded backups must go and
//! deletes them from both places, keeping every database inside its
//! retention policy and size limits.
//!
//! ## Overview
//!
//! - [`period`] — named retention spans with a total order (`FOREVER` is
//!   the maximum).
//! - [`config`] — per-database backup configuration, plan limits, and the
//!   write-path validator.
//! - [`catalog`] — backup rows and the repository seam over the catalog.
//! - [`storage`] — object-store backends (filesystem, S3-compatible) and
//!   the credential-decryption hook.
//! - [`cleaner`] — the periodic driver: retention policies (time-period,
//!   count, GFS), total-size enforcement, the grace guard, and the
//!   deletion pipeline.
//!
//! The engine assumes a single active cleaner per deployment. Deletes are
//! idempotent, so a redundant instance costs log noise and extra storage
//! calls, not correctness.

#![warn(missing_docs)]

pub mod catalog;
pub mod cleaner;
pub mod config;
pub mod environment;
pub mod period;
pub mod storage;

pub use catalog::{Backup, BackupRepository, BackupStatus, MemoryBackupRepository};
pub use cleaner::{BackupRemoveListener, Cleaner, CleanerConfig, GfsSlots};
pub use config::{
    BackupConfig, BackupConfigService, DatabasePlan, MemoryBackupConfigService,
    RetentionPolicyType,
};
pub use environment::Environment;
pub use period::Period;
pub use storage::{
    FieldEncryptor, LocalFileStorage, MemoryStorageService, PlaintextFieldEncryptor,
    StorageBackend, StorageService,
};

use thiserror::Error;

/// Umbrella error over every engine subsystem.
#[derive(Debug, Error)]
pub enum RetentionError {
    /// Period parsing failed.
    #[error(transparent)]
    Period(#[from] period::UnknownPeriodError),

    /// A backup configuration failed validation.
    #[error(transparent)]
    Validation(#[from] config::ValidationError),

    /// Config-service operation failed.
    #[error(transparent)]
    ConfigService(#[from] config::ConfigServiceError),

    /// Catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),

    /// Storage operation failed.
    #[error(transparent)]
    Storage(#[from] storage::StorageError),

    /// Cleaner or deletion-pipeline operation failed.
    #[error(transparent)]
    Cleaner(#[from] cleaner::CleanerError),
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, RetentionError>;
