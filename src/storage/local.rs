// Filesystem storage backend rooted at a directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{FieldEncryptor, StorageBackend, StorageError};

/// [`StorageBackend`] that keeps blobs as files under a root directory.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Creates a backend rooted at `root`. The directory is not created
    /// eagerly; deletion of anything under a missing root is a no-op.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageBackend for LocalFileStorage {
    async fn delete_file(
        &self,
        _encryptor: &dyn FieldEncryptor,
        file_name: &str,
    ) -> Result<(), StorageError> {
        let path = self.root.join(file_name);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!(
                "failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
