//! # Memory Backend
//!
//! An in-process storage backend. Used by tests and headless callers
//! that do not need durability.

use std::collections::HashMap;
use std::io;

use parking_lot::RwLock;
use tracing::debug;

use crate::store::providers::StorageBackend;
use crate::store::types::{StoreResult, StoredEntry};

type CacheMap = HashMap<String, HashMap<String, StoredEntry>>;

/// Memory storage backend implementation
#[derive(Default)]
pub struct MemoryStore {
    caches: RwLock<CacheMap>,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStore {
    async fn list_caches(&self) -> StoreResult<Vec<String>> {
        let caches = self.caches.read();
        let mut ids: Vec<String> = caches.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn create_cache(&self, id: &str) -> StoreResult<()> {
        let mut caches = self.caches.write();
        if caches.contains_key(id) {
            return Ok(());
        }

        caches.insert(id.to_string(), HashMap::new());
        debug!(cache_id = id, "Memory cache created");
        Ok(())
    }

    async fn delete_cache(&self, id: &str) -> StoreResult<()> {
        let mut caches = self.caches.write();
        if caches.remove(id).is_none() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such cache: {id}"),
            ));
        }

        debug!(cache_id = id, "Memory cache deleted");
        Ok(())
    }

    async fn get(&self, id: &str, key: &str) -> StoreResult<Option<StoredEntry>> {
        let caches = self.caches.read();
        Ok(caches.get(id).and_then(|entries| entries.get(key)).cloned())
    }

    async fn put(&self, id: &str, key: &str, entry: StoredEntry) -> StoreResult<()> {
        let mut caches = self.caches.write();
        caches
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn entries(&self, id: &str) -> StoreResult<Vec<(String, StoredEntry)>> {
        let caches = self.caches.read();
        let mut pairs: Vec<(String, StoredEntry)> = caches
            .get(id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs)
    }
}
