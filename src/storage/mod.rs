//! Object-store seam: storage backends, the lookup service, and the
//! credential-decryption hook.

mod local;
mod memory;
mod s3;

pub use local::LocalFileStorage;
pub use memory::MemoryStorageService;
pub use s3::{S3Storage, S3StorageConfig};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No storage registered under the requested id.
    #[error("storage not found: {0}")]
    NotFound(Uuid),

    /// Stored credentials could not be decrypted.
    #[error("credential decryption failed: {0}")]
    Decryption(String),

    /// Filesystem I/O failed.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// The remote backend rejected or failed the call.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Decrypts field-encrypted storage credentials.
///
/// Storage records keep credentials encrypted at rest; backends pass each
/// credential through the encryptor before use. The engine never sees key
/// material.
pub trait FieldEncryptor: Send + Sync {
    /// Decrypts one field value.
    fn decrypt(&self, ciphertext: &str) -> Result<String, StorageError>;
}

/// Pass-through encryptor for deployments that store credentials in plain
/// text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextFieldEncryptor;

impl FieldEncryptor for PlaintextFieldEncryptor {
    fn decrypt(&self, ciphertext: &str) -> Result<String, StorageError> {
        Ok(ciphertext.to_string())
    }
}

/// One configured object store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Deletes an object by name. Deleting a missing object is not an
    /// error; retention runs must be able to re-delete safely.
    async fn delete_file(
        &self,
        encryptor: &dyn FieldEncryptor,
        file_name: &str,
    ) -> Result<(), StorageError>;
}

/// Resolves a backup's `storage_id` to its backend.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// The backend registered under `id`, or [`StorageError::NotFound`].
    async fn get_storage_by_id(&self, id: Uuid) -> Result<Arc<dyn StorageBackend>, StorageError>;
}
