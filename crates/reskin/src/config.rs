use std::time::Duration;

use crate::chain::CaptureFilter;

const DEFAULT_USER_AGENT: &str = concat!("reskin/", env!("CARGO_PKG_VERSION"));

/// Configurable options for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base endpoint serving generated interception scripts. Concatenated
    /// with a cache identifier to form the script URL; any required query
    /// or path separator must already be part of this string.
    pub endpoint: String,

    /// Allow-list deciding which fetched URLs the resolution chain
    /// captures back into cache
    pub capture_filter: CaptureFilter,

    /// Cache receiving network write-backs. `None` targets the default
    /// cache.
    pub capture_cache_id: Option<String>,

    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            capture_filter: CaptureFilter::default(),
            capture_cache_id: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> crate::builder::EngineConfigBuilder {
        crate::builder::EngineConfigBuilder::new()
    }
}
