//! # Interception Script Installer
//!
//! Seam for the collaborator that registers and unregisters the active
//! interception script. The engine owns only the sequencing: any
//! existing registration for the root scope is unregistered, awaited,
//! before the new script is registered, awaited. Installer trouble is
//! captured as a typed result and downgraded to a logged warning - a
//! profile switch must not break on it.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Root scope every registration in this system targets
pub const ROOT_SCOPE: &str = "/";

/// Collaborator managing interception-script registrations
#[async_trait]
pub trait ScriptInstaller: Send + Sync {
    /// The script URL currently registered for a scope, if any
    async fn current(&self, scope: &str) -> Result<Option<String>, EngineError>;

    /// Register a script for a scope
    async fn register(&self, script_url: &str, scope: &str) -> Result<(), EngineError>;

    /// Unregister whatever is registered for a scope
    async fn unregister(&self, scope: &str) -> Result<(), EngineError>;
}

/// Swap the root-scope registration to a new script URL.
///
/// Failures never propagate; the sequencing contract is the point.
pub async fn install_script(installer: &dyn ScriptInstaller, script_url: &str) {
    match installer.current(ROOT_SCOPE).await {
        Ok(Some(existing)) => {
            if let Err(e) = installer.unregister(ROOT_SCOPE).await {
                warn!(existing = %existing, error = %e, "Failed to unregister existing script");
            }
        }
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "Failed to query existing registration");
        }
    }

    match installer.register(script_url, ROOT_SCOPE).await {
        Ok(()) => debug!(script_url, "Interception script registered"),
        Err(e) => warn!(script_url, error = %e, "Failed to register interception script"),
    }
}

/// Installer for headless callers with no interception layer
#[derive(Debug, Default, Clone)]
pub struct NullInstaller;

#[async_trait]
impl ScriptInstaller for NullInstaller {
    async fn current(&self, _scope: &str) -> Result<Option<String>, EngineError> {
        Ok(None)
    }

    async fn register(&self, _script_url: &str, _scope: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn unregister(&self, _scope: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every call and can be primed with an existing
    /// registration or a failing register.
    #[derive(Default)]
    struct RecordingInstaller {
        registered: Mutex<Option<String>>,
        calls: Mutex<Vec<String>>,
        fail_register: bool,
    }

    #[async_trait]
    impl ScriptInstaller for RecordingInstaller {
        async fn current(&self, _scope: &str) -> Result<Option<String>, EngineError> {
            self.calls.lock().push("current".to_string());
            Ok(self.registered.lock().clone())
        }

        async fn register(&self, script_url: &str, scope: &str) -> Result<(), EngineError> {
            self.calls.lock().push(format!("register {script_url} {scope}"));
            if self.fail_register {
                return Err(EngineError::CacheUnavailable("no worker host".into()));
            }
            *self.registered.lock() = Some(script_url.to_string());
            Ok(())
        }

        async fn unregister(&self, _scope: &str) -> Result<(), EngineError> {
            self.calls.lock().push("unregister".to_string());
            *self.registered.lock() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fresh_install_skips_unregister() {
        let installer = Arc::new(RecordingInstaller::default());
        install_script(installer.as_ref(), "http://host/worker?cache=a").await;

        let calls = installer.calls.lock().clone();
        assert_eq!(
            calls,
            vec!["current", "register http://host/worker?cache=a /"]
        );
    }

    #[tokio::test]
    async fn test_existing_registration_is_unregistered_first() {
        let installer = Arc::new(RecordingInstaller::default());
        *installer.registered.lock() = Some("http://host/worker?cache=old".to_string());

        install_script(installer.as_ref(), "http://host/worker?cache=new").await;

        let calls = installer.calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                "current",
                "unregister",
                "register http://host/worker?cache=new /"
            ]
        );
        assert_eq!(
            installer.registered.lock().as_deref(),
            Some("http://host/worker?cache=new")
        );
    }

    #[tokio::test]
    async fn test_register_failure_is_swallowed() {
        let installer = RecordingInstaller {
            fail_register: true,
            ..Default::default()
        };

        // Must not panic or propagate.
        install_script(&installer, "http://host/worker?cache=a").await;
        assert!(installer.registered.lock().is_none());
    }
}
