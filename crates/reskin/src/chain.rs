//! # Interception Resolution Chain
//!
//! The per-request decision procedure behind the interception script:
//! try the active profile's override cache, then the default cache, then
//! the network, capturing allow-listed network responses back into cache
//! on a best-effort basis.

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, error, warn};
use url::Url;

use crate::EngineConfig;
use crate::error::EngineError;
use crate::identity::default_cache_id;
use crate::store::{CacheStore, StoredEntry};

/// Layer that answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOrigin {
    /// Served from the active profile's override cache
    OverrideCache,
    /// Served from the default cache
    DefaultCache,
    /// Fetched from the network
    Network,
}

/// A response produced by the resolution chain
#[derive(Debug, Clone)]
pub struct ServedAsset {
    /// Layer that produced the body
    pub origin: ServeOrigin,
    /// Declared content type, when known
    pub content_type: Option<String>,
    /// Response body
    pub body: Bytes,
}

/// Suffix allow-list deciding which fetched URLs are captured into cache.
///
/// Matching runs case-insensitively against the URL path, so query
/// strings do not defeat the suffix test.
#[derive(Debug, Clone)]
pub struct CaptureFilter {
    suffixes: Vec<String>,
}

impl Default for CaptureFilter {
    fn default() -> Self {
        let suffixes = [
            // images
            ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp",
            // video
            ".mp4", ".webm", ".ogg",
            // audio
            ".mp3", ".wav",
            // structured data
            ".json",
        ];

        Self {
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CaptureFilter {
    /// An allow-list that captures nothing
    pub fn none() -> Self {
        Self {
            suffixes: Vec::new(),
        }
    }

    /// Add a suffix (lowercased, leading dot expected)
    pub fn add(&mut self, suffix: impl Into<String>) {
        self.suffixes.push(suffix.into().to_ascii_lowercase());
    }

    /// Whether a request URL is eligible for capture
    pub fn matches(&self, request_url: &str) -> bool {
        let path = match Url::parse(request_url) {
            Ok(url) => url.path().to_ascii_lowercase(),
            // Bare paths are used as-is, minus any query or fragment.
            Err(_) => request_url
                .split(['?', '#'])
                .next()
                .unwrap_or(request_url)
                .to_ascii_lowercase(),
        };

        self.suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &EngineConfig) -> Result<Client, EngineError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(EngineError::from)
}

/// Request-time resolution chain for one profile's derived cache
#[derive(Clone)]
pub struct ResolutionChain {
    store: CacheStore,
    client: Client,
    override_id: String,
    default_id: String,
    capture_id: String,
    filter: CaptureFilter,
}

impl ResolutionChain {
    /// Create a chain for the given override cache, building its own
    /// HTTP client from the configuration
    pub fn new(
        store: CacheStore,
        override_id: impl Into<String>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let client = create_client(config)?;
        Ok(Self::with_client(store, client, override_id, config))
    }

    /// Create a chain reusing an existing HTTP client
    pub fn with_client(
        store: CacheStore,
        client: Client,
        override_id: impl Into<String>,
        config: &EngineConfig,
    ) -> Self {
        let capture_id = config
            .capture_cache_id
            .clone()
            .unwrap_or_else(default_cache_id);

        Self {
            store,
            client,
            override_id: override_id.into(),
            default_id: default_cache_id(),
            capture_id,
            filter: config.capture_filter.clone(),
        }
    }

    /// Resolve one request: override cache, then default cache, then the
    /// network. Stateless per request; only cache contents persist.
    pub async fn serve(&self, request_url: &str) -> Result<ServedAsset, EngineError> {
        if let Some(entry) = self.layer_lookup(&self.override_id, request_url).await {
            debug!(url = request_url, "Served from override cache");
            return Ok(served(ServeOrigin::OverrideCache, entry));
        }

        if let Some(entry) = self.layer_lookup(&self.default_id, request_url).await {
            debug!(url = request_url, "Served from default cache");
            return Ok(served(ServeOrigin::DefaultCache, entry));
        }

        self.fetch_and_capture(request_url).await
    }

    /// Look a request up in one cache layer. A storage failure at this
    /// point degrades to a miss so the chain can keep falling through.
    async fn layer_lookup(&self, cache_id: &str, request_url: &str) -> Option<StoredEntry> {
        match self.store.get(cache_id, request_url).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(cache_id, url = request_url, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Single-attempt network fetch with best-effort write-back
    async fn fetch_and_capture(&self, request_url: &str) -> Result<ServedAsset, EngineError> {
        let response = match self.client.get(request_url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(url = request_url, error = %e, "Network fetch failed");
                return Err(EngineError::Network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(url = request_url, status = %status, "Network fetch returned error status");
            return Err(EngineError::StatusCode(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                error!(url = request_url, error = %e, "Network body read failed");
                return Err(EngineError::Network(e));
            }
        };

        if self.filter.matches(request_url) {
            // The caller gets its response immediately; the write-back
            // runs detached and its errors are swallowed.
            let store = self.store.clone();
            let capture_id = self.capture_id.clone();
            let key = request_url.to_string();
            let clone = StoredEntry::new(body.clone(), content_type.clone());

            tokio::spawn(async move {
                if let Err(e) = store.capture_put(&capture_id, &key, clone).await {
                    warn!(cache_id = %capture_id, url = %key, error = %e, "Best-effort capture failed");
                }
            });
        }

        Ok(ServedAsset {
            origin: ServeOrigin::Network,
            content_type,
            body,
        })
    }
}

fn served(origin: ServeOrigin, entry: StoredEntry) -> ServedAsset {
    ServedAsset {
        origin,
        content_type: entry.metadata.content_type,
        body: entry.body,
    }
}
