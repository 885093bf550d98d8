//! Tenant sessions: durable storage and the authentication gate.
//!
//! # State machine
//!
//! ```text
//! Anonymous --(login | register success)--> Authenticated --(logout)--> Anonymous
//! ```
//!
//! Failed logins and registrations leave the gate `Anonymous` and the store
//! untouched. There are no observable intermediate states.

pub mod forms;
pub mod gate;
pub mod store;

pub use forms::{Credentials, Registration};
pub use gate::SessionGate;
pub use store::{FileStorage, MemoryStorage, SessionStorage, SessionStore, StoreError, StoredEntries};

use core::fmt;

use secrecy::SecretString;
use store_insights_core::TenantProfile;
use thiserror::Error;

/// An authenticated tenant session.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct Session {
    /// Opaque bearer credential issued by the backend.
    pub token: SecretString,
    /// Who the session belongs to.
    pub tenant: TenantProfile,
}

impl Session {
    /// Create a new session.
    #[must_use]
    pub fn new(token: impl Into<String>, tenant: TenantProfile) -> Self {
        Self {
            token: SecretString::from(token.into()),
            tenant,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Authentication state broadcast to the navigation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No session; protected routes redirect to the login entry point.
    Anonymous,
    /// A session is active.
    Authenticated,
}

/// Errors surfaced by the session gate.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend (or the local required-field check) rejected the input.
    ///
    /// Messages are kept verbatim and shown joined with `", "`.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// Email/password pair rejected.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The backend could not be reached or failed (connectivity, 5xx).
    #[error("Unable to reach the insights service: {0}")]
    Transport(String),

    /// The session could not be persisted or removed.
    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}
