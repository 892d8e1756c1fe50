// In-memory storage registry for embedders and tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{StorageBackend, StorageError, StorageService};

/// [`StorageService`] backed by a concurrent in-memory map of registered
/// backends.
#[derive(Clone, Default)]
pub struct MemoryStorageService {
    backends: Arc<DashMap<Uuid, Arc<dyn StorageBackend>>>,
}

impl MemoryStorageService {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend under `id`, replacing any previous registration.
    pub fn register(&self, id: Uuid, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(id, backend);
    }

    /// Removes the backend registered under `id`.
    pub fn unregister(&self, id: Uuid) {
        self.backends.remove(&id);
    }
}

#[async_trait]
impl StorageService for MemoryStorageService {
    async fn get_storage_by_id(&self, id: Uuid) -> Result<Arc<dyn StorageBackend>, StorageError> {
        self.backends
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(StorageError::NotFound(id))
    }
}
