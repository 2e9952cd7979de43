//! # Builder for EngineConfig
//!
//! Fluent API for creating and customizing [`EngineConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use reskin_engine::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .with_endpoint("http://localhost:8080/worker?cache=")
//!     .with_timeout(Duration::from_secs(60))
//!     .with_capture_suffix(".svg")
//!     .build();
//! ```

use std::time::Duration;

use crate::EngineConfig;

/// Builder for creating EngineConfig instances with a fluent API
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    /// Internal config being built
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interception-script endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Replace the capture allow-list
    pub fn with_capture_filter(mut self, filter: crate::chain::CaptureFilter) -> Self {
        self.config.capture_filter = filter;
        self
    }

    /// Add one suffix to the capture allow-list
    pub fn with_capture_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.capture_filter.add(suffix);
        self
    }

    /// Target a specific cache for network write-backs
    pub fn with_capture_cache_id(mut self, id: impl Into<String>) -> Self {
        self.config.capture_cache_id = Some(id.into());
        self
    }

    /// Set the overall request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether redirects are followed
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the final configuration
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
