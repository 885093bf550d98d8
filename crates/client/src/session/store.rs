//! Durable session storage.
//!
//! The session is persisted as two string entries, `token` (the bearer
//! credential) and `user` (the JSON-serialized tenant profile), so a restart
//! rehydrates it without re-authenticating. Both entries always change
//! together: storage backends write them as one unit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use store_insights_core::TenantProfile;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::Session;

/// Key of the bearer token entry.
pub const TOKEN_KEY: &str = "token";
/// Key of the serialized tenant profile entry.
pub const USER_KEY: &str = "user";

/// Errors that can occur when reading or writing the session.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The entries could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Raw contents of durable storage: the two session entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Client-local durable storage for the session entries.
///
/// `save` and `clear` must replace both entries as a unit so no later `load`
/// observes one entry updated and the other stale.
pub trait SessionStorage: Send + Sync {
    /// Read both entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage cannot be read.
    fn load(&self) -> Result<StoredEntries, StoreError>;

    /// Replace both entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage cannot be written.
    fn save(&self, entries: &StoredEntries) -> Result<(), StoreError>;

    /// Remove both entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage cannot be written.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// File Storage
// =============================================================================

/// Session entries in a single JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, so both
/// entries are replaced in one step.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<StoredEntries, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredEntries::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, entries: &StoredEntries) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&tmp, bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-memory storage for tests and ephemeral runs.
///
/// Clones share the same entries, so opening a second [`SessionStore`] over a
/// clone simulates a process reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl MemoryStorage {
    /// Raw value of one entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Overwrite one entry directly, bypassing the store.
    pub fn insert_raw(&self, key: &'static str, value: impl Into<String>) {
        self.lock().insert(key, value.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<StoredEntries, StoreError> {
        let entries = self.lock();
        Ok(StoredEntries {
            token: entries.get(TOKEN_KEY).cloned(),
            user: entries.get(USER_KEY).cloned(),
        })
    }

    fn save(&self, stored: &StoredEntries) -> Result<(), StoreError> {
        let mut entries = self.lock();
        for (key, value) in [(TOKEN_KEY, &stored.token), (USER_KEY, &stored.user)] {
            match value {
                Some(value) => entries.insert(key, value.clone()),
                None => entries.remove(key),
            };
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.lock();
        entries.remove(TOKEN_KEY);
        entries.remove(USER_KEY);
        Ok(())
    }
}

// =============================================================================
// Session Store
// =============================================================================

/// Source of truth for the active session.
///
/// Cloning is cheap; clones share the same session. Reads never touch
/// durable storage, so `is_active` is synchronous and side-effect-free.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Box<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store, rehydrating any persisted session.
    ///
    /// A half-present pair (token without a readable profile, or the
    /// reverse) counts as no session and is wiped, as does storage whose
    /// contents cannot be decoded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage cannot be read or wiped.
    pub fn open(storage: impl SessionStorage + 'static) -> Result<Self, StoreError> {
        let entries = match storage.load() {
            Ok(entries) => entries,
            Err(StoreError::Serialize(e)) => {
                warn!(error = %e, "Stored session is unreadable, discarding it");
                storage.clear()?;
                StoredEntries::default()
            }
            Err(e) => return Err(e),
        };

        let current = match (entries.token, entries.user) {
            (None, None) => None,
            (Some(token), Some(user)) => match serde_json::from_str::<TenantProfile>(&user) {
                Ok(tenant) => Some(Session {
                    token: SecretString::from(token),
                    tenant,
                }),
                Err(e) => {
                    warn!(error = %e, "Stored tenant profile is unreadable, discarding session");
                    storage.clear()?;
                    None
                }
            },
            (token, _) => {
                warn!(
                    has_token = token.is_some(),
                    "Stored session is incomplete, discarding it"
                );
                storage.clear()?;
                None
            }
        };

        if let Some(session) = &current {
            info!(email = %session.tenant.email, "Rehydrated session");
        } else {
            debug!("No stored session");
        }

        Ok(Self {
            inner: Arc::new(SessionStoreInner {
                storage: Box::new(storage),
                current: RwLock::new(current),
            }),
        })
    }

    /// Persist a new session and make it current.
    ///
    /// Storage is written first; on failure the current session is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the session cannot be persisted.
    pub fn set(&self, session: Session) -> Result<(), StoreError> {
        let entries = StoredEntries {
            token: Some(session.token.expose_secret().to_string()),
            user: Some(serde_json::to_string(&session.tenant)?),
        };
        self.inner.storage.save(&entries)?;

        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// Drop the current session and remove both persisted entries.
    ///
    /// The in-memory session is cleared before storage is touched, so readers
    /// see "inactive" even if removing the entries fails.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the persisted entries cannot be removed.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.inner.storage.clear()
    }

    /// The active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bearer token of the active session, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.token.clone())
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
