//! # Overlay Merge Resolver
//!
//! Merges the default and override cache layers into the single typed
//! view the configurator works against. Override entries win on key
//! collision; entries whose content type cannot be classified are
//! invisible.

use bytes::Bytes;
use std::collections::HashMap;
use tracing::warn;

use crate::error::EngineError;
use crate::store::{CacheStore, StoredEntry};

/// Classified type of a resolved asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Audio,
    Video,
    Json,
}

/// Resolved payload of an asset
#[derive(Debug, Clone, PartialEq)]
pub enum AssetValue {
    /// Decoded binary payload
    Blob(Bytes),
    /// Parsed JSON document
    Json(serde_json::Value),
}

/// One entry of the merged overlay view
#[derive(Debug, Clone)]
pub struct CacheAsset {
    /// Classified asset type
    pub kind: AssetKind,
    /// Request URL identifying the asset
    pub key: String,
    /// Resolved payload
    pub value: AssetValue,
}

/// Classify a declared content type. `None` marks the entry invisible.
fn classify(content_type: &str) -> Option<AssetKind> {
    if content_type.starts_with("image/") {
        Some(AssetKind::Image)
    } else if content_type.starts_with("audio/") {
        Some(AssetKind::Audio)
    } else if content_type.starts_with("video/") {
        Some(AssetKind::Video)
    } else if content_type.starts_with("application/json") {
        Some(AssetKind::Json)
    } else {
        None
    }
}

/// Resolve the merged, typed view of a default and an override cache.
///
/// Absent caches contribute empty key sets. Any storage failure collapses
/// the whole call to an empty list: callers must read an empty overlay as
/// "nothing to show", not as confirmed emptiness.
pub async fn resolve_overlay(
    store: &CacheStore,
    default_id: &str,
    override_id: &str,
) -> Vec<CacheAsset> {
    match try_resolve(store, default_id, override_id).await {
        Ok(assets) => assets,
        Err(e) => {
            warn!(default_id, override_id, error = %e, "Overlay resolution failed, returning empty view");
            Vec::new()
        }
    }
}

async fn try_resolve(
    store: &CacheStore,
    default_id: &str,
    override_id: &str,
) -> Result<Vec<CacheAsset>, EngineError> {
    let default_entries = store.entries(default_id).await?;
    let override_entries = store.entries(override_id).await?;

    // Union of both layers' keys; the request URL is the identity. First
    // seen wins for ordering, the override layer wins for content.
    let mut keys: Vec<String> = Vec::new();
    let mut default_map: HashMap<String, StoredEntry> = HashMap::new();
    let mut override_map: HashMap<String, StoredEntry> = HashMap::new();

    for (key, entry) in default_entries {
        keys.push(key.clone());
        default_map.insert(key, entry);
    }
    for (key, entry) in override_entries {
        if !default_map.contains_key(&key) {
            keys.push(key.clone());
        }
        override_map.insert(key, entry);
    }

    let mut assets = Vec::with_capacity(keys.len());
    for key in keys {
        let entry = match override_map.remove(&key).or_else(|| default_map.remove(&key)) {
            Some(entry) => entry,
            None => continue,
        };

        let Some(content_type) = entry.metadata.content_type.as_deref() else {
            continue;
        };
        let Some(kind) = classify(content_type) else {
            continue;
        };

        let value = match kind {
            AssetKind::Json => match serde_json::from_slice(&entry.body) {
                Ok(value) => AssetValue::Json(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping JSON asset with unparseable body");
                    continue;
                }
            },
            _ => AssetValue::Blob(entry.body),
        };

        assets.push(CacheAsset { kind, key, value });
    }

    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    const DEFAULT_ID: &str = "reskin-default-cache";
    const OVERRIDE_ID: &str = "reskin-demo-cache";

    fn store() -> CacheStore {
        CacheStore::new(Arc::new(MemoryStore::new()))
    }

    async fn seed_default(store: &CacheStore, key: &str, body: &str, content_type: &str) {
        store
            .bulk_seed(
                DEFAULT_ID,
                vec![(
                    key.to_string(),
                    StoredEntry::new(
                        Bytes::from(body.to_string()),
                        Some(content_type.to_string()),
                    ),
                )],
            )
            .await
            .unwrap();
    }

    async fn put_override(store: &CacheStore, key: &str, body: &str, content_type: &str) {
        store
            .put(
                OVERRIDE_ID,
                key,
                StoredEntry::new(
                    Bytes::from(body.to_string()),
                    Some(content_type.to_string()),
                ),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_union_of_both_layers() {
        let store = store();
        seed_default(&store, "https://x/a.png", "a", "image/png").await;
        put_override(&store, "https://x/b.png", "b", "image/png").await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        let mut keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["https://x/a.png", "https://x/b.png"]);
    }

    #[tokio::test]
    async fn test_override_wins_on_collision() {
        let store = store();
        seed_default(&store, "https://x/a.png", "base", "image/png").await;
        put_override(&store, "https://x/a.png", "skin", "image/png").await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].value, AssetValue::Blob(Bytes::from_static(b"skin")));
    }

    #[tokio::test]
    async fn test_unclassified_entries_are_invisible() {
        let store = store();
        seed_default(&store, "https://x/a.png", "a", "image/png").await;
        seed_default(&store, "https://x/notes.txt", "n", "text/plain").await;
        put_override(&store, "https://x/page.html", "h", "text/html").await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].key, "https://x/a.png");
    }

    #[tokio::test]
    async fn test_classification_by_content_type_prefix() {
        let store = store();
        seed_default(&store, "https://x/a.png", "a", "image/png").await;
        seed_default(&store, "https://x/t.mp3", "t", "audio/mpeg").await;
        seed_default(&store, "https://x/v.mp4", "v", "video/mp4").await;
        seed_default(
            &store,
            "https://x/d.json",
            r#"{"v":1}"#,
            "application/json; charset=utf-8",
        )
        .await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        let kind_of = |key: &str| {
            assets
                .iter()
                .find(|a| a.key.ends_with(key))
                .map(|a| a.kind)
                .unwrap()
        };

        assert_eq!(kind_of("a.png"), AssetKind::Image);
        assert_eq!(kind_of("t.mp3"), AssetKind::Audio);
        assert_eq!(kind_of("v.mp4"), AssetKind::Video);
        assert_eq!(kind_of("d.json"), AssetKind::Json);
    }

    #[tokio::test]
    async fn test_single_json_override_scenario() {
        let store = store();
        put_override(&store, "https://x/data.json", r#"{"v":1}"#, "application/json").await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].kind, AssetKind::Json);
        assert_eq!(assets[0].key, "https://x/data.json");
        assert_eq!(
            assets[0].value,
            AssetValue::Json(serde_json::json!({"v": 1}))
        );
    }

    #[tokio::test]
    async fn test_unparseable_json_is_skipped() {
        let store = store();
        put_override(&store, "https://x/bad.json", "{not json", "application/json").await;
        put_override(&store, "https://x/a.png", "a", "image/png").await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].key, "https://x/a.png");
    }

    #[tokio::test]
    async fn test_absent_caches_resolve_empty() {
        let store = store();
        assert!(resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let store = store();
        seed_default(&store, "https://x/a.png", "a", "image/png").await;
        put_override(&store, "https://x/b.json", r#"[1,2]"#, "application/json").await;

        let first = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        let second = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;

        let summarize = |assets: &[CacheAsset]| {
            assets
                .iter()
                .map(|a| (a.key.clone(), a.kind))
                .collect::<Vec<_>>()
        };
        assert_eq!(summarize(&first), summarize(&second));
    }

    #[tokio::test]
    async fn test_fresh_override_key_surfaces() {
        let store = store();
        put_override(&store, "https://x/new.png", "fresh", "image/png").await;

        let assets = resolve_overlay(&store, DEFAULT_ID, OVERRIDE_ID).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].key, "https://x/new.png");
    }
}
