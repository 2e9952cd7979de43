//! # Store Types
//!
//! Common types shared across the cache storage layer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Metadata recorded alongside every stored entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Declared content type of the entry, when known
    pub content_type: Option<String>,
    /// Size of the stored body in bytes
    pub size: u64,
    /// When the entry was stored (seconds since the epoch)
    pub cached_at: u64,
}

impl EntryMetadata {
    /// Create metadata for a body of the given size
    pub fn new(size: u64) -> Self {
        Self {
            content_type: None,
            size,
            cached_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the content type as an Option
    pub fn with_content_type_option(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }
}

/// A stored response body with its metadata
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Raw body bytes
    pub body: Bytes,
    /// Metadata for the stored body
    pub metadata: EntryMetadata,
}

impl StoredEntry {
    /// Create an entry from a body and an optional declared content type
    pub fn new(body: Bytes, content_type: Option<String>) -> Self {
        let metadata = EntryMetadata::new(body.len() as u64).with_content_type_option(content_type);
        Self { body, metadata }
    }
}

/// Result of a raw storage operation
pub type StoreResult<T> = std::result::Result<T, std::io::Error>;

/// Convert a storage key (a request URL) to a filename-safe string
pub fn key_to_filename(key: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(key);

    let hash = hasher.finalize();
    format!("{hash:x}")
}
