use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::{Config, CredentialStoreKind};
use crate::models::Credential;

use super::{FileBackend, KeyringBackend};

/// Durable home for the session credential.
///
/// Implementations may fail; `SessionStore` absorbs those failures.
pub trait CredentialBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Read the stored token, `None` when nothing is stored
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored token
    fn store(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Removing an absent token succeeds.
    fn remove(&self) -> Result<()>;
}

/// Process-local credential slot.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential slot lock poisoned"))?;
        Ok(slot.clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential slot lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential slot lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

/// Owner of the single session credential.
///
/// Cheap to clone; clones share the same backend. Pass it explicitly to the
/// views that need it.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn CredentialBackend>,
}

impl SessionStore {
    pub fn new<B: CredentialBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Store with no durable storage behind it
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Build the store selected by configuration.
    /// Falls back to memory when the file store has no config directory.
    pub fn from_config(config: &Config) -> Self {
        Self::for_kind(config.credential_store, Config::config_dir())
    }

    fn for_kind(kind: CredentialStoreKind, config_dir: Result<PathBuf>) -> Self {
        match kind {
            CredentialStoreKind::Keyring => Self::new(KeyringBackend::new()),
            CredentialStoreKind::File => match config_dir {
                Ok(dir) => Self::new(FileBackend::in_dir(&dir)),
                Err(e) => {
                    warn!(error = %e, "No durable storage for session, keeping it in memory");
                    Self::in_memory()
                }
            },
            CredentialStoreKind::Memory => Self::in_memory(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Persist `token`, replacing any previous credential
    pub fn set_credential(&self, token: &Credential) {
        match self.backend.store(token.as_str()) {
            Ok(()) => debug!(backend = self.backend.name(), "Credential stored"),
            Err(e) => warn!(backend = self.backend.name(), error = %e, "Failed to store credential"),
        }
    }

    /// The stored credential, or `None` when absent, empty or unreadable
    pub fn get_credential(&self) -> Option<Credential> {
        match self.backend.load() {
            Ok(token) => token.filter(|t| !t.is_empty()).map(Credential::new),
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Failed to read credential");
                None
            }
        }
    }

    pub fn clear_credential(&self) {
        match self.backend.remove() {
            Ok(()) => debug!(backend = self.backend.name(), "Credential cleared"),
            Err(e) => warn!(backend = self.backend.name(), error = %e, "Failed to clear credential"),
        }
    }

    /// True iff a credential is present. Says nothing about whether it is expired.
    pub fn is_authenticated(&self) -> bool {
        self.get_credential().is_some()
    }
}
