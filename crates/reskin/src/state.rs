//! # Durable Session State
//!
//! A one-file JSON key/value store. The engine keeps exactly one key in
//! it: the name of the last-active profile, read at bootstrap and
//! written on every successful activation.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::fs;
use tracing::warn;

use crate::error::EngineError;

/// Key under which the last-active profile name is recorded
pub const LAST_ACTIVE_PROFILE_KEY: &str = "last-active-profile";

/// File-backed string key/value store
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the given file. The file is created on
    /// the first write.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_map(&self) -> HashMap<String, String> {
        match fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "State file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    /// Read one value
    pub async fn get(&self, key: &str) -> Option<String> {
        self.read_map().await.remove(key)
    }

    /// Whether a key is present
    pub async fn contains(&self, key: &str) -> bool {
        self.read_map().await.contains_key(key)
    }

    /// Write one value through to disk
    pub async fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        let mut map = self.read_map().await;
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&map).map_err(std::io::Error::from)?)
            .await?;
        Ok(())
    }
}
