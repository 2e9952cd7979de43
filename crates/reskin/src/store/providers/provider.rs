//! # Storage Backend
//!
//! This module defines the backend trait every storage implementation
//! must follow. A backend owns a flat set of named caches, each holding
//! URL-keyed entries.

use async_trait::async_trait;

use crate::store::types::{StoreResult, StoredEntry};

/// A trait for storage backends hosting named key/value caches
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Enumerate the identifiers of every existing cache
    async fn list_caches(&self) -> StoreResult<Vec<String>>;

    /// Create a cache with the given identifier. Creating an existing
    /// cache is a no-op.
    async fn create_cache(&self, id: &str) -> StoreResult<()>;

    /// Delete a cache and everything stored in it. Deleting an absent
    /// cache is an error at this layer.
    async fn delete_cache(&self, id: &str) -> StoreResult<()>;

    /// Get one entry from a cache. An absent cache yields `None`, not an
    /// error.
    async fn get(&self, id: &str, key: &str) -> StoreResult<Option<StoredEntry>>;

    /// Write or overwrite one entry in a cache, creating the cache when
    /// it does not exist yet.
    async fn put(&self, id: &str, key: &str, entry: StoredEntry) -> StoreResult<()>;

    /// Enumerate every `(key, entry)` pair stored in a cache. An absent
    /// cache yields an empty list.
    async fn entries(&self, id: &str) -> StoreResult<Vec<(String, StoredEntry)>>;
}
