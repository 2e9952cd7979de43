//! # File Backend
//!
//! A directory-per-cache persistent storage backend. Each cache directory
//! carries a `cache.json` naming its durable identifier and an `entries/`
//! directory with one body file and one `.meta` sidecar per entry.

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io;
use tracing::{debug, warn};

use crate::store::providers::StorageBackend;
use crate::store::types::{EntryMetadata, StoreResult, StoredEntry, key_to_filename};

const CACHE_RECORD_FILE: &str = "cache.json";
const ENTRIES_DIR: &str = "entries";

/// Identifier record written into every cache directory
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    id: String,
}

/// Sidecar record written next to every entry body
#[derive(Serialize, Deserialize)]
struct MetaRecord {
    key: String,
    metadata: EntryMetadata,
}

/// File storage backend implementation
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    initialized: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl FileStore {
    /// Create a file store rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            initialized: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Initialize the root directory
    async fn ensure_initialized(&self) -> io::Result<()> {
        use std::sync::atomic::Ordering;

        // Fast path - already initialized
        if self.initialized.load(Ordering::Relaxed) {
            return Ok(());
        }

        // Use compare_exchange to ensure only one task initializes
        if self
            .initialized
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            fs::create_dir_all(&self.root).await?;
            self.initialized.store(true, Ordering::Release);
        } else {
            while !self.initialized.load(Ordering::Acquire) {
                tokio::task::yield_now().await;
            }
        }

        Ok(())
    }

    fn cache_dir(&self, id: &str) -> PathBuf {
        self.root.join(key_to_filename(id))
    }

    fn entries_dir(&self, id: &str) -> PathBuf {
        self.cache_dir(id).join(ENTRIES_DIR)
    }

    fn body_path(&self, id: &str, key: &str) -> PathBuf {
        self.entries_dir(id).join(key_to_filename(key))
    }

    fn meta_path(&self, id: &str, key: &str) -> PathBuf {
        let mut path = self.body_path(id, key);
        path.set_extension("meta");
        path
    }

    async fn ensure_cache_dir(&self, id: &str) -> io::Result<()> {
        self.ensure_initialized().await?;

        let dir = self.cache_dir(id);
        let record_path = dir.join(CACHE_RECORD_FILE);

        fs::create_dir_all(dir.join(ENTRIES_DIR)).await?;

        // The identifier record is written once and never overwritten.
        if !fs::try_exists(&record_path).await? {
            let record = CacheRecord { id: id.to_string() };
            let json = serde_json::to_vec(&record)?;
            fs::write(&record_path, json).await?;
            debug!(cache_id = id, "File cache created");
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for FileStore {
    async fn list_caches(&self) -> StoreResult<Vec<String>> {
        self.ensure_initialized().await?;

        let mut ids = Vec::new();
        let mut dirs = fs::read_dir(&self.root).await?;

        while let Some(dir_entry) = dirs.next_entry().await? {
            if !dir_entry.file_type().await?.is_dir() {
                continue;
            }

            let record_path = dir_entry.path().join(CACHE_RECORD_FILE);
            match fs::read(&record_path).await {
                Ok(raw) => match serde_json::from_slice::<CacheRecord>(&raw) {
                    Ok(record) => ids.push(record.id),
                    Err(e) => {
                        warn!(path = %record_path.display(), error = %e, "Skipping unreadable cache record");
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // Not a cache directory, ignore it.
                }
                Err(e) => return Err(e),
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn create_cache(&self, id: &str) -> StoreResult<()> {
        self.ensure_cache_dir(id).await
    }

    async fn delete_cache(&self, id: &str) -> StoreResult<()> {
        self.ensure_initialized().await?;

        let dir = self.cache_dir(id);
        if !fs::try_exists(&dir).await? {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such cache: {id}"),
            ));
        }

        fs::remove_dir_all(&dir).await?;
        debug!(cache_id = id, "File cache deleted");
        Ok(())
    }

    async fn get(&self, id: &str, key: &str) -> StoreResult<Option<StoredEntry>> {
        self.ensure_initialized().await?;

        let meta_path = self.meta_path(id, key);
        let raw_meta = match fs::read(&meta_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let record: MetaRecord = serde_json::from_slice(&raw_meta)?;
        let body = fs::read(self.body_path(id, key)).await?;

        Ok(Some(StoredEntry {
            body: Bytes::from(body),
            metadata: record.metadata,
        }))
    }

    async fn put(&self, id: &str, key: &str, entry: StoredEntry) -> StoreResult<()> {
        self.ensure_cache_dir(id).await?;

        let body_path = self.body_path(id, key);
        let meta_path = self.meta_path(id, key);

        fs::write(&body_path, &entry.body).await?;

        let record = MetaRecord {
            key: key.to_string(),
            metadata: entry.metadata,
        };
        let json = serde_json::to_vec(&record)?;

        if let Err(e) = fs::write(&meta_path, json).await {
            // Half-written entries are invisible to get/entries, which
            // require the sidecar. Drop the orphaned body.
            let _ = fs::remove_file(&body_path).await;
            return Err(e);
        }

        Ok(())
    }

    async fn entries(&self, id: &str) -> StoreResult<Vec<(String, StoredEntry)>> {
        self.ensure_initialized().await?;

        let entries_dir = self.entries_dir(id);
        let mut files = match fs::read_dir(&entries_dir).await {
            Ok(files) => files,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut pairs = Vec::new();
        while let Some(file) = files.next_entry().await? {
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some("meta") {
                continue;
            }

            let record: MetaRecord = serde_json::from_slice(&fs::read(&path).await?)?;

            let mut body_path = path.clone();
            body_path.set_extension("");
            let body = fs::read(&body_path).await?;

            pairs.push((
                record.key,
                StoredEntry {
                    body: Bytes::from(body),
                    metadata: record.metadata,
                },
            ));
        }

        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("caches"));
        (dir, store)
    }

    fn entry(body: &str, content_type: &str) -> StoredEntry {
        StoredEntry::new(
            Bytes::from(body.to_string()),
            Some(content_type.to_string()),
        )
    }

    #[tokio::test]
    async fn test_round_trip_entry() {
        let (_dir, store) = store();
        store
            .put(
                "reskin-demo-cache",
                "https://x/img.png?v=2",
                entry("payload", "image/png"),
            )
            .await
            .unwrap();

        let got = store
            .get("reskin-demo-cache", "https://x/img.png?v=2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.body, Bytes::from_static(b"payload"));
        assert_eq!(got.metadata.content_type.as_deref(), Some("image/png"));
        assert_eq!(got.metadata.size, 7);
    }

    #[tokio::test]
    async fn test_list_recovers_original_ids() {
        let (_dir, store) = store();
        store.create_cache("reskin-default-cache").await.unwrap();
        store.create_cache("reskin-demo-cache").await.unwrap();

        assert_eq!(
            store.list_caches().await.unwrap(),
            vec!["reskin-default-cache", "reskin-demo-cache"]
        );
    }

    #[tokio::test]
    async fn test_entries_recover_original_keys() {
        let (_dir, store) = store();
        store
            .put("c", "https://x/a b.png", entry("a", "image/png"))
            .await
            .unwrap();
        store
            .put("c", "https://x/z.json", entry("{}", "application/json"))
            .await
            .unwrap();

        let pairs = store.entries("c").await.unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["https://x/a b.png", "https://x/z.json"]);
    }

    #[tokio::test]
    async fn test_delete_missing_cache_errors() {
        let (_dir, store) = store();
        let err = store.delete_cache("ghost").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_removes_entries() {
        let (_dir, store) = store();
        store
            .put("c", "https://x/a.png", entry("a", "image/png"))
            .await
            .unwrap();
        store.delete_cache("c").await.unwrap();

        assert!(store.get("c", "https://x/a.png").await.unwrap().is_none());
        assert!(store.list_caches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let (_dir, store) = store();
        store.create_cache("c").await.unwrap();
        store
            .put("c", "https://x/a.png", entry("a", "image/png"))
            .await
            .unwrap();
        store.create_cache("c").await.unwrap();

        assert!(store.get("c", "https://x/a.png").await.unwrap().is_some());
    }
}
