//! # Cache Store Accessor
//!
//! The accessor every other component goes through. It wraps a storage
//! backend and enforces the engine's policy: listing fails soft, deleting
//! a missing cache is an error, and the default cache is immutable on the
//! single-entry write path.

use std::sync::Arc;

use tracing::error;

use crate::error::EngineError;
use crate::identity::default_cache_id;
use crate::store::providers::StorageBackend;
use crate::store::types::StoredEntry;

/// Accessor over a shared storage backend
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn StorageBackend>,
    default_id: String,
}

impl CacheStore {
    /// Create an accessor over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            default_id: default_cache_id(),
        }
    }

    /// Identifier of the default cache this accessor protects
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Enumerate every existing cache identifier.
    ///
    /// Fails soft: a backend failure is logged and yields an empty list,
    /// never an error. Callers must treat an empty list as "nothing
    /// visible", not as proof of emptiness.
    pub async fn list_cache_ids(&self) -> Vec<String> {
        match self.backend.list_caches().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Cache storage unavailable while listing caches");
                Vec::new()
            }
        }
    }

    /// Open a cache, creating it when absent. Idempotent.
    pub async fn open_or_create(&self, id: &str) -> Result<(), EngineError> {
        self.backend
            .create_cache(id)
            .await
            .map_err(|e| EngineError::CacheUnavailable(e.to_string()))
    }

    /// Whether a cache with this identifier exists
    pub async fn exists(&self, id: &str) -> bool {
        self.list_cache_ids().await.iter().any(|c| c == id)
    }

    /// Delete a cache and its contents.
    ///
    /// Deleting an absent cache is an error: a silent no-op here would
    /// mask caller bugs such as double-deleting a profile.
    pub async fn delete(&self, id: &str) -> Result<(), EngineError> {
        self.backend.delete_cache(id).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound(format!("cache {id}"))
            } else {
                EngineError::Io(e)
            }
        })
    }

    /// Write or overwrite one entry.
    ///
    /// Rejects writes into the default cache: its contents may only be
    /// populated through [`CacheStore::bulk_seed`] at bootstrap.
    pub async fn put(&self, id: &str, key: &str, entry: StoredEntry) -> Result<(), EngineError> {
        if id == self.default_id {
            return Err(EngineError::WriteRejected(key.to_string()));
        }

        self.backend.put(id, key, entry).await?;
        Ok(())
    }

    /// Write-back path for the resolution chain. The default-cache guard
    /// protects the asset-edit path only; the chain captures network
    /// responses on its own authority.
    pub(crate) async fn capture_put(
        &self,
        id: &str,
        key: &str,
        entry: StoredEntry,
    ) -> Result<(), EngineError> {
        self.backend.create_cache(id).await?;
        self.backend.put(id, key, entry).await?;
        Ok(())
    }

    /// Bulk-seed a cache, bypassing the default-cache write guard.
    ///
    /// Bootstrap-only population path for the default asset layer.
    pub async fn bulk_seed(
        &self,
        id: &str,
        entries: Vec<(String, StoredEntry)>,
    ) -> Result<(), EngineError> {
        self.backend.create_cache(id).await?;
        for (key, entry) in entries {
            self.backend.put(id, &key, entry).await?;
        }
        Ok(())
    }

    /// Get one entry from a cache
    pub async fn get(&self, id: &str, key: &str) -> Result<Option<StoredEntry>, EngineError> {
        Ok(self.backend.get(id, key).await?)
    }

    /// Enumerate every stored `(key, entry)` pair of a cache
    pub async fn entries(&self, id: &str) -> Result<Vec<(String, StoredEntry)>, EngineError> {
        Ok(self.backend.entries(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::providers::MemoryStore;
    use bytes::Bytes;

    fn store() -> CacheStore {
        CacheStore::new(Arc::new(MemoryStore::new()))
    }

    fn entry(body: &str) -> StoredEntry {
        StoredEntry::new(Bytes::from(body.to_string()), Some("image/png".to_string()))
    }

    #[tokio::test]
    async fn test_put_into_default_cache_is_rejected() {
        let store = store();
        let default_id = store.default_id().to_string();

        let err = store
            .put(&default_id, "https://x/a.png", entry("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::WriteRejected(_)));
    }

    #[tokio::test]
    async fn test_bulk_seed_reaches_default_cache() {
        let store = store();
        let default_id = store.default_id().to_string();

        store
            .bulk_seed(&default_id, vec![("https://x/a.png".to_string(), entry("a"))])
            .await
            .unwrap();

        let got = store.get(&default_id, "https://x/a.png").await.unwrap();
        assert!(got.is_some());
    }

    #[tokio::test]
    async fn test_put_into_other_cache_succeeds() {
        let store = store();
        store
            .put("reskin-demo-cache", "https://x/a.png", entry("a"))
            .await
            .unwrap();

        assert!(
            store
                .get("reskin-demo-cache", "https://x/a.png")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = store();
        let err = store.delete("ghost").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists_follows_listing() {
        let store = store();
        assert!(!store.exists("reskin-demo-cache").await);

        store.open_or_create("reskin-demo-cache").await.unwrap();
        assert!(store.exists("reskin-demo-cache").await);
    }
}
