//! # Asset Session
//!
//! Top-level orchestrator owning the registry, the store accessor, the
//! script-installer collaborator, and the durable session state. UI and
//! CLI layers talk to this type with plain profile names, keys, and
//! payloads; nothing else crosses the boundary.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::chain::{ResolutionChain, create_client};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::export::{archive_file_name, export};
use crate::identity::{DEFAULT_PROFILE_NAME, is_profile_cache_id, resolution_script_url};
use crate::installer::{ScriptInstaller, install_script};
use crate::overlay::{CacheAsset, resolve_overlay};
use crate::registry::{Profile, ProfileRegistry};
use crate::state::{LAST_ACTIVE_PROFILE_KEY, StateStore};
use crate::store::{CacheStore, StoredEntry};

/// Payload of an asset edit
#[derive(Debug, Clone)]
pub enum AssetPayload {
    /// Raw bytes, e.g. from a file upload
    Bytes {
        body: Bytes,
        content_type: Option<String>,
    },
    /// A remote link fetched once over HTTP
    Remote(String),
}

/// One configurator session over a storage backend
pub struct AssetSession {
    config: EngineConfig,
    store: CacheStore,
    registry: ProfileRegistry,
    installer: Arc<dyn ScriptInstaller>,
    state: StateStore,
    client: reqwest::Client,
}

impl AssetSession {
    /// Reconstruct a session from durable state.
    ///
    /// Existing cache identifiers are listed (soft), filtered down to
    /// profile-shaped ones, and reverse-mapped into the registry. The
    /// last-active profile is restored when it still exists, the default
    /// profile otherwise, and the matching interception script is
    /// installed.
    pub async fn bootstrap(
        config: EngineConfig,
        store: CacheStore,
        installer: Arc<dyn ScriptInstaller>,
        state: StateStore,
    ) -> Result<Self, EngineError> {
        let existing = store.list_cache_ids().await;
        let profile_ids: Vec<String> = existing
            .into_iter()
            .filter(|id| is_profile_cache_id(id))
            .collect();

        let registry = ProfileRegistry::bootstrap(store.clone(), &profile_ids).await?;
        let client = create_client(&config)?;

        let mut session = Self {
            config,
            store,
            registry,
            installer,
            state,
            client,
        };

        let last_active = session.state.get(LAST_ACTIVE_PROFILE_KEY).await;
        let target = match last_active {
            Some(name) if session.registry.contains(&name) => name,
            _ => DEFAULT_PROFILE_NAME.to_string(),
        };
        session.switch_profile(&target).await?;

        info!(profile = %target, "Session bootstrapped");
        Ok(session)
    }

    /// All known profiles, sorted by name
    pub fn profiles(&self) -> Vec<Profile> {
        self.registry.list().into_iter().cloned().collect()
    }

    /// The currently active profile
    pub fn active_profile(&self) -> Option<Profile> {
        self.registry.active_profile().cloned()
    }

    /// Create a profile and switch to it
    pub async fn create_profile(&mut self, name: &str) -> Result<Profile, EngineError> {
        let profile = self.registry.create(name).await?;
        self.switch_profile(name).await?;
        Ok(profile)
    }

    /// Delete a profile. Deleting the active profile re-activates the
    /// default profile as the follow-up step.
    pub async fn delete_profile(&mut self, name: &str) -> Result<(), EngineError> {
        let was_active = self
            .registry
            .active_profile()
            .is_some_and(|p| p.name == name);

        self.registry.delete(name).await?;

        if was_active {
            self.switch_profile(DEFAULT_PROFILE_NAME).await?;
        }
        Ok(())
    }

    /// Activate a profile, swap the interception script to its cache,
    /// and persist the choice.
    ///
    /// The script swap is sequential awaited steps and not atomic with
    /// the activation; a request arriving mid-switch is served by
    /// whichever script is installed at that instant.
    pub async fn switch_profile(&mut self, name: &str) -> Result<(), EngineError> {
        self.registry.activate(name)?;

        let cache_id = self
            .registry
            .get(name)
            .map(|p| p.cache_id.clone())
            .unwrap_or_default();
        let script_url = resolution_script_url(&self.config.endpoint, &cache_id);
        install_script(self.installer.as_ref(), &script_url).await;

        // The activation already succeeded; failing to remember it must
        // not undo it.
        if let Err(e) = self.state.set(LAST_ACTIVE_PROFILE_KEY, name).await {
            warn!(profile = name, error = %e, "Failed to persist last-active profile");
        }

        Ok(())
    }

    /// The merged, typed asset view of the active profile
    pub async fn assets(&self) -> Vec<CacheAsset> {
        let Some(active) = self.registry.active_profile() else {
            return Vec::new();
        };

        resolve_overlay(&self.store, self.store.default_id(), &active.cache_id).await
    }

    /// Write one asset into the active profile's override cache.
    ///
    /// The default profile's cache is not writable through this path;
    /// the edit is rejected when the default profile is active.
    pub async fn update_asset(
        &self,
        key: &str,
        payload: AssetPayload,
    ) -> Result<(), EngineError> {
        let active = self
            .registry
            .active_profile()
            .ok_or_else(|| EngineError::NotFound("active profile".to_string()))?;
        let cache_id = active.cache_id.clone();

        let entry = match payload {
            AssetPayload::Bytes { body, content_type } => StoredEntry::new(body, content_type),
            AssetPayload::Remote(link) => self.fetch_payload(&link).await?,
        };

        self.store.put(&cache_id, key, entry).await
    }

    /// Export one profile's cache as a zip blob, returning the
    /// deterministic archive name alongside the bytes
    pub async fn export_profile(&self, name: &str) -> Result<(String, Bytes), EngineError> {
        let profile = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::NotFound(format!("profile {name}")))?;

        let blob = export(&self.store, &profile.cache_id).await?;
        Ok((archive_file_name(&profile.cache_id), blob))
    }

    /// Bulk-seed the default asset layer. Bootstrap-only path.
    pub async fn seed_default(
        &self,
        entries: Vec<(String, StoredEntry)>,
    ) -> Result<(), EngineError> {
        let default_id = self.store.default_id().to_string();
        self.store.bulk_seed(&default_id, entries).await
    }

    /// A resolution chain for the active profile, sharing this session's
    /// HTTP client
    pub fn resolution_chain(&self) -> Result<ResolutionChain, EngineError> {
        let active = self
            .registry
            .active_profile()
            .ok_or_else(|| EngineError::NotFound("active profile".to_string()))?;

        Ok(ResolutionChain::with_client(
            self.store.clone(),
            self.client.clone(),
            active.cache_id.clone(),
            &self.config,
        ))
    }

    async fn fetch_payload(&self, link: &str) -> Result<StoredEntry, EngineError> {
        let response = self.client.get(link).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::StatusCode(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?;

        Ok(StoredEntry::new(body, content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::NullInstaller;
    use crate::overlay::{AssetKind, AssetValue};
    use crate::store::MemoryStore;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct Fixture {
        _dir: TempDir,
        store: CacheStore,
        state_path: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        Fixture {
            _dir: dir,
            store: CacheStore::new(Arc::new(MemoryStore::new())),
            state_path,
        }
    }

    async fn session_with(fixture: &Fixture) -> AssetSession {
        AssetSession::bootstrap(
            EngineConfig::default(),
            fixture.store.clone(),
            Arc::new(NullInstaller),
            StateStore::new(fixture.state_path.clone()),
        )
        .await
        .unwrap()
    }

    fn png(body: &str) -> AssetPayload {
        AssetPayload::Bytes {
            body: Bytes::from(body.to_string()),
            content_type: Some("image/png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_activates_default() {
        let fixture = fixture();
        let session = session_with(&fixture).await;

        let active = session.active_profile().unwrap();
        assert!(active.is_default);
        assert!(fixture.store.exists(&active.cache_id).await);
    }

    #[tokio::test]
    async fn test_bootstrap_restores_last_active() {
        let fixture = fixture();
        {
            let mut session = session_with(&fixture).await;
            session.create_profile("winter").await.unwrap();
        }

        let session = session_with(&fixture).await;
        assert_eq!(session.active_profile().unwrap().name, "winter");
    }

    #[tokio::test]
    async fn test_bootstrap_ignores_foreign_cache_ids() {
        let fixture = fixture();
        fixture.store.open_or_create("media-capture").await.unwrap();
        fixture
            .store
            .open_or_create("reskin-winter-cache")
            .await
            .unwrap();

        let session = session_with(&fixture).await;
        let names: Vec<String> = session.profiles().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["default", "winter"]);
    }

    #[tokio::test]
    async fn test_stale_last_active_falls_back_to_default() {
        let fixture = fixture();
        StateStore::new(fixture.state_path.clone())
            .set(LAST_ACTIVE_PROFILE_KEY, "gone")
            .await
            .unwrap();

        let session = session_with(&fixture).await;
        assert_eq!(session.active_profile().unwrap().name, DEFAULT_PROFILE_NAME);
    }

    #[tokio::test]
    async fn test_create_profile_switches_to_it() {
        let fixture = fixture();
        let mut session = session_with(&fixture).await;

        session.create_profile("winter").await.unwrap();
        assert_eq!(session.active_profile().unwrap().name, "winter");
    }

    #[tokio::test]
    async fn test_delete_active_reactivates_default() {
        let fixture = fixture();
        let mut session = session_with(&fixture).await;
        session.create_profile("winter").await.unwrap();

        session.delete_profile("winter").await.unwrap();
        assert_eq!(session.active_profile().unwrap().name, DEFAULT_PROFILE_NAME);

        let names: Vec<String> = session.profiles().iter().map(|p| p.name.clone()).collect();
        assert!(!names.contains(&"winter".to_string()));
    }

    #[tokio::test]
    async fn test_update_asset_rejected_for_default_profile() {
        let fixture = fixture();
        let session = session_with(&fixture).await;

        let err = session
            .update_asset("https://x/a.png", png("skin"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::WriteRejected(_)));
    }

    #[tokio::test]
    async fn test_update_asset_lands_in_override_only() {
        let fixture = fixture();
        let mut session = session_with(&fixture).await;
        session.create_profile("winter").await.unwrap();

        session
            .update_asset("https://x/a.png", png("skin"))
            .await
            .unwrap();

        // Visible in the overlay...
        let assets = session.assets().await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].kind, AssetKind::Image);
        assert_eq!(
            assets[0].value,
            AssetValue::Blob(Bytes::from_static(b"skin"))
        );

        // ...and stored in the override cache, not the default one.
        let default_id = fixture.store.default_id().to_string();
        assert!(
            fixture
                .store
                .get(&default_id, "https://x/a.png")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_asset_from_remote_link() {
        let fixture = fixture();
        let mut session = session_with(&fixture).await;
        session.create_profile("winter").await.unwrap();

        // One-shot local HTTP source for the linked payload.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 6\r\nConnection: close\r\n\r\npixels",
                    )
                    .await;
                let _ = socket.shutdown().await;
            }
        });

        session
            .update_asset(
                "https://x/a.png",
                AssetPayload::Remote(format!("http://{addr}/source.png")),
            )
            .await
            .unwrap();

        let assets = session.assets().await;
        assert_eq!(assets.len(), 1);
        assert_eq!(
            assets[0].value,
            AssetValue::Blob(Bytes::from_static(b"pixels"))
        );
    }

    #[tokio::test]
    async fn test_seeded_defaults_show_through_overlay() {
        let fixture = fixture();
        let mut session = session_with(&fixture).await;
        session
            .seed_default(vec![(
                "https://x/base.png".to_string(),
                StoredEntry::new(Bytes::from_static(b"base"), Some("image/png".to_string())),
            )])
            .await
            .unwrap();

        session.create_profile("winter").await.unwrap();
        session
            .update_asset("https://x/base.png", png("skin"))
            .await
            .unwrap();

        // Override wins while the profile is active.
        let assets = session.assets().await;
        assert_eq!(
            assets[0].value,
            AssetValue::Blob(Bytes::from_static(b"skin"))
        );

        // The base asset reappears once the default profile is active.
        session.switch_profile(DEFAULT_PROFILE_NAME).await.unwrap();
        let assets = session.assets().await;
        assert_eq!(
            assets[0].value,
            AssetValue::Blob(Bytes::from_static(b"base"))
        );
    }

    #[tokio::test]
    async fn test_export_profile_names_archive_after_cache() {
        let fixture = fixture();
        let mut session = session_with(&fixture).await;
        session.create_profile("winter").await.unwrap();
        session
            .update_asset("/a/b.png", png("skin"))
            .await
            .unwrap();

        let (name, blob) = session.export_profile("winter").await.unwrap();
        assert_eq!(name, "reskin-winter-cache.zip");
        assert!(!blob.is_empty());
    }

    #[tokio::test]
    async fn test_export_unknown_profile_is_not_found() {
        let fixture = fixture();
        let session = session_with(&fixture).await;
        assert!(matches!(
            session.export_profile("ghost").await,
            Err(EngineError::NotFound(_))
        ));
    }
}
