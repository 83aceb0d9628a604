use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use object_store::memory::InMemory;
use object_store::ObjectStore;
use stt_batch_core::StorageLocation;

use crate::traits::{StorageResult, StoreProvider};

/// In-process object stores, one per `(endpoint, container)` pair.
///
/// Connecting twice to the same container returns the same store, so data
/// written through one binding is visible through a later one. Used for dry
/// runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStoreProvider {
    stores: Arc<Mutex<HashMap<(String, String), Arc<InMemory>>>>,
}

impl MemoryStoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store backing `location`'s container, created on first use.
    pub fn store_for(&self, location: &StorageLocation) -> Arc<InMemory> {
        let key = (
            location.endpoint().to_string(),
            location.container_name().to_string(),
        );
        let mut stores = self
            .stores
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stores
            .entry(key)
            .or_insert_with(|| Arc::new(InMemory::new()))
            .clone()
    }
}

impl StoreProvider for MemoryStoreProvider {
    fn connect(&self, location: &StorageLocation) -> StorageResult<Arc<dyn ObjectStore>> {
        Ok(self.store_for(location))
    }
}
