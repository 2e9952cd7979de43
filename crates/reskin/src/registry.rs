//! # Profile Registry
//!
//! In-memory table of known profiles and the active-profile marker. The
//! registry owns backing-cache lifecycle through the store accessor and
//! is explicitly constructed and passed by reference - there is no
//! ambient global instance.

use std::collections::HashMap;

use tracing::debug;

use crate::error::EngineError;
use crate::identity::{DEFAULT_PROFILE_NAME, cache_id_to_profile, profile_to_cache_id};
use crate::store::CacheStore;

/// A named, isolated asset override set with its own backing cache
#[derive(Debug, Clone)]
pub struct Profile {
    /// Human profile name
    pub name: String,
    /// Durable identifier of the backing cache
    pub cache_id: String,
    /// Whether this is the fixed default profile
    pub is_default: bool,
}

/// Registry of known profiles keyed by name
pub struct ProfileRegistry {
    store: CacheStore,
    profiles: HashMap<String, Profile>,
    active: String,
}

impl ProfileRegistry {
    /// Reconstruct the registry from existing durable cache identifiers.
    ///
    /// Each identifier is reverse-mapped to a profile name and seeds one
    /// profile backed by that exact cache. A default profile is
    /// guaranteed: when no identifier reverse-maps to the default name,
    /// its backing cache is created. The default profile starts active.
    pub async fn bootstrap(
        store: CacheStore,
        existing_cache_ids: &[String],
    ) -> Result<Self, EngineError> {
        let mut profiles = HashMap::new();

        for id in existing_cache_ids {
            let name = cache_id_to_profile(id);
            profiles.insert(
                name.clone(),
                Profile {
                    is_default: name == DEFAULT_PROFILE_NAME,
                    cache_id: id.clone(),
                    name,
                },
            );
        }

        if !profiles.contains_key(DEFAULT_PROFILE_NAME) {
            let cache_id = profile_to_cache_id(DEFAULT_PROFILE_NAME);
            store.open_or_create(&cache_id).await?;
            profiles.insert(
                DEFAULT_PROFILE_NAME.to_string(),
                Profile {
                    name: DEFAULT_PROFILE_NAME.to_string(),
                    cache_id,
                    is_default: true,
                },
            );
            debug!("Default profile cache created at bootstrap");
        }

        Ok(Self {
            store,
            profiles,
            active: DEFAULT_PROFILE_NAME.to_string(),
        })
    }

    /// Register a new profile and create its backing cache
    pub async fn create(&mut self, name: &str) -> Result<Profile, EngineError> {
        if name.is_empty() {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        if self.profiles.contains_key(name) {
            return Err(EngineError::DuplicateProfile(name.to_string()));
        }

        let cache_id = profile_to_cache_id(name);
        self.store.open_or_create(&cache_id).await?;

        let profile = Profile {
            name: name.to_string(),
            cache_id,
            is_default: false,
        };
        self.profiles.insert(name.to_string(), profile.clone());
        debug!(profile = name, "Profile created");

        Ok(profile)
    }

    /// Remove a profile and evict its backing cache.
    ///
    /// Deleting the active profile leaves the active marker dangling;
    /// re-activating the default profile is the caller's follow-up step,
    /// which keeps this operation composable.
    pub async fn delete(&mut self, name: &str) -> Result<(), EngineError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| EngineError::NotFound(format!("profile {name}")))?;

        if profile.is_default {
            return Err(EngineError::Undeletable);
        }

        let cache_id = profile.cache_id.clone();
        self.store.delete(&cache_id).await?;
        self.profiles.remove(name);
        debug!(profile = name, "Profile deleted");

        Ok(())
    }

    /// Mark a profile active. Overlay recomputation and script
    /// installation stay with the caller.
    pub fn activate(&mut self, name: &str) -> Result<(), EngineError> {
        if !self.profiles.contains_key(name) {
            return Err(EngineError::NotFound(format!("profile {name}")));
        }

        self.active = name.to_string();
        debug!(profile = name, "Profile activated");
        Ok(())
    }

    /// Look a profile up by name
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Whether a profile with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// The currently active profile. `None` only transiently, between
    /// deleting the active profile and the caller's re-activation.
    pub fn active_profile(&self) -> Option<&Profile> {
        self.profiles.get(&self.active)
    }

    /// All known profiles, sorted by name
    pub fn list(&self) -> Vec<&Profile> {
        let mut profiles: Vec<&Profile> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }
}
