//! Session gate: login, registration, logout and the route guard question.

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use store_insights_core::TenantProfile;

use super::{AuthError, AuthState, Credentials, Registration, Session, SessionStore};
use crate::gateway::{AuthPayload, GatewayError, InsightsBackend};

const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Authenticates tenants and owns the transitions of the session state
/// machine.
///
/// Confirmation prompts (e.g. "Are you sure you want to logout?") belong to
/// the caller; every operation here is unconditional.
pub struct SessionGate<B> {
    backend: B,
    store: SessionStore,
    state: watch::Sender<AuthState>,
}

impl<B: InsightsBackend> SessionGate<B> {
    /// Create a gate over an opened store.
    #[must_use]
    pub fn new(backend: B, store: SessionStore) -> Self {
        let initial = if store.is_active() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };
        let (state, _) = watch::channel(initial);
        Self {
            backend,
            store,
            state,
        }
    }

    /// Create a tenant account and sign in to it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when required fields are missing (no
    /// request is sent) or the backend rejects the input, and
    /// `AuthError::Transport` when the backend cannot be reached.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        let missing = registration.missing_fields();
        if !missing.is_empty() {
            return Err(AuthError::Validation(required_messages(&missing)));
        }

        let payload = self.backend.register(registration).await.map_err(|e| {
            warn!(error = %e, "Registration failed");
            if e.is_client_error() {
                let messages = e.remote_messages();
                if messages.is_empty() {
                    AuthError::Validation(vec![REGISTRATION_FAILED.to_string()])
                } else {
                    AuthError::Validation(messages)
                }
            } else {
                transport_error(&e)
            }
        })?;

        self.establish(payload)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when a field is blank (no request is
    /// sent), `AuthError::InvalidCredentials` when the backend rejects the
    /// pair and `AuthError::Transport` when the backend cannot be reached.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(AuthError::Validation(required_messages(&missing)));
        }

        let payload = self.backend.login(credentials).await.map_err(|e| {
            warn!(error = %e, "Login failed");
            if e.is_client_error() {
                let message = e.remote_messages().join(", ");
                if message.is_empty() {
                    AuthError::InvalidCredentials(INVALID_CREDENTIALS.to_string())
                } else {
                    AuthError::InvalidCredentials(message)
                }
            } else {
                transport_error(&e)
            }
        })?;

        self.establish(payload)
    }

    /// End the session and send the navigation layer back to the login
    /// entry point.
    ///
    /// No-op without an active session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the persisted entries cannot be
    /// removed. The session is inactive regardless.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), AuthError> {
        if !self.store.is_active() {
            return Ok(());
        }

        let result = self.store.clear();
        self.state.send_replace(AuthState::Anonymous);
        info!("Logged out");
        result.map_err(AuthError::from)
    }

    /// Route guard question: may protected pages render?
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.is_active()
    }

    /// Profile of the signed-in tenant, for the navigation bar.
    #[must_use]
    pub fn current_tenant(&self) -> Option<TenantProfile> {
        self.store.current().map(|session| session.tenant)
    }

    /// Observe authentication state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The underlying session store.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Store a successful login/registration response.
    fn establish(&self, payload: AuthPayload) -> Result<Session, AuthError> {
        let (Some(token), Some(tenant)) = (payload.token, payload.tenant) else {
            warn!("Authentication response is missing token or tenant");
            return Err(AuthError::Transport(
                "authentication response is missing token or tenant".to_string(),
            ));
        };

        let session = Session::new(token, tenant);
        self.store.set(session.clone())?;
        self.state.send_replace(AuthState::Authenticated);
        info!(shop = %session.tenant.shop_domain, "Session established");
        Ok(session)
    }
}

fn required_messages(missing: &[&str]) -> Vec<String> {
    missing.iter().map(|field| format!("{field} is required")).collect()
}

fn transport_error(err: &GatewayError) -> AuthError {
    AuthError::Transport(err.to_string())
}
