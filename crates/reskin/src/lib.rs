//! # Reskin Engine
//!
//! A library for maintaining named, isolated sets of overridable static
//! assets ("profiles"), each backed by a persistent named cache.
//! Requests resolve through the active profile's override cache, the
//! default cache, then the network, with fetched media/JSON captured
//! back into cache automatically.
//!
//! ## Features
//!
//! - Layered request resolution with best-effort network capture
//! - Profile overlay merging with content-type-driven typing
//! - Deterministic profile-name to cache-identifier mapping
//! - Pluggable storage backends (file, memory)
//! - Directory-structured zip export of any profile's cache

pub mod builder;
pub mod chain;
pub mod config;
pub mod error;
pub mod export;
pub mod identity;
pub mod installer;
pub mod overlay;
pub mod registry;
pub mod session;
pub mod state;
pub mod store;

pub use builder::EngineConfigBuilder;
pub use config::EngineConfig;
pub use error::EngineError;

// Re-export the resolution chain
pub use chain::{CaptureFilter, ResolutionChain, ServeOrigin, ServedAsset, create_client};

// Re-export identity helpers
pub use identity::{
    DEFAULT_PROFILE_NAME, cache_id_to_profile, default_cache_id, is_profile_cache_id,
    profile_to_cache_id, resolution_script_url,
};

// Re-export overlay types
pub use overlay::{AssetKind, AssetValue, CacheAsset, resolve_overlay};

// Re-export registry types
pub use registry::{Profile, ProfileRegistry};

// Re-export the session orchestrator
pub use session::{AssetPayload, AssetSession};

// Re-export export utilities
pub use export::{archive_file_name, export};

// Re-export installer seam
pub use installer::{NullInstaller, ROOT_SCOPE, ScriptInstaller, install_script};

// Re-export state persistence
pub use state::{LAST_ACTIVE_PROFILE_KEY, StateStore};

// Re-export storage types
pub use store::{CacheStore, EntryMetadata, FileStore, MemoryStore, StorageBackend, StoredEntry};
