//! Upstream session lifecycle.
//!
//! # States
//! ```text
//! Uninitialized ──initialize() ok──▶ Ready
//!       │                              ▲
//!       └──initialize() err──▶ Failed ─┘ (a later initialize() may still succeed)
//! ```
//! Ready is terminal for the life of the process.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::Credentials;
use crate::observability::metrics;
use crate::session::store::SessionStore;
use crate::upstream::{CurrentUser, LoginOutcome, Totp, TotpError, UpstreamError, VrchatApi};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("VRChat session is not authenticated")]
    NotAuthenticated,

    #[error("missing credential: {0} is not set")]
    MissingCredentials(&'static str),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("two-factor authentication required ({}) but no usable TOTP secret is configured", methods.join(", "))]
    TwoFactorUnavailable { methods: Vec<String> },

    #[error("TOTP code was rejected by VRChat")]
    TwoFactorRejected,

    #[error("VRChat still requires two-factor authentication after verification")]
    TwoFactorIncomplete,

    #[error("invalid TOTP secret: {0}")]
    Totp(#[from] TotpError),
}

#[derive(Debug, Clone)]
enum SessionState {
    Uninitialized,
    Ready { display_name: String },
    Failed { reason: String },
}

/// Owns the single authenticated VRChat identity of this process.
pub struct SessionManager {
    api: Arc<dyn VrchatApi>,
    credentials: Result<Credentials, &'static str>,
    store: Option<SessionStore>,
    state: RwLock<SessionState>,
    /// Serializes handshakes; readers never touch it.
    init_lock: Mutex<()>,
}

impl SessionManager {
    /// `credentials` carries the missing variable name when the environment was incomplete;
    /// that only becomes an error once `initialize()` actually needs a password login.
    pub fn new(
        api: Arc<dyn VrchatApi>,
        credentials: Result<Credentials, &'static str>,
        store: Option<SessionStore>,
    ) -> Self {
        Self {
            api,
            credentials,
            store,
            state: RwLock::new(SessionState::Uninitialized),
            init_lock: Mutex::new(()),
        }
    }

    /// Perform the login handshake once. Calling again after success is a no-op.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let _guard = self.init_lock.lock().await;

        if self.is_ready() {
            return Ok(());
        }

        match self.authenticate().await {
            Ok(user) => {
                tracing::info!(user = %user.display_name, "VRChat session ready");
                self.persist();
                metrics::record_session_ready(true);
                *self.state.write().expect("session lock poisoned") = SessionState::Ready {
                    display_name: user.display_name,
                };
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "VRChat login failed");
                metrics::record_session_ready(false);
                *self.state.write().expect("session lock poisoned") = SessionState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.read().expect("session lock poisoned"),
            SessionState::Ready { .. }
        )
    }

    /// Authenticated client handle, or `NotAuthenticated` before readiness.
    pub fn handle(&self) -> Result<Arc<dyn VrchatApi>, SessionError> {
        if self.is_ready() {
            Ok(self.api.clone())
        } else {
            Err(SessionError::NotAuthenticated)
        }
    }

    /// Display name of the logged-in account, once ready.
    pub fn current_identity(&self) -> Option<String> {
        match &*self.state.read().expect("session lock poisoned") {
            SessionState::Ready { display_name } => Some(display_name.clone()),
            _ => None,
        }
    }

    /// Why the last handshake failed, if it did.
    pub fn failure_reason(&self) -> Option<String> {
        match &*self.state.read().expect("session lock poisoned") {
            SessionState::Failed { reason } => Some(reason.clone()),
            _ => None,
        }
    }

    async fn authenticate(&self) -> Result<CurrentUser, SessionError> {
        if let Some(user) = self.try_saved_session().await {
            return Ok(user);
        }
        self.fresh_login().await
    }

    /// Resume a persisted session. Any failure falls through to a fresh login.
    async fn try_saved_session(&self) -> Option<CurrentUser> {
        let store = self.store.as_ref()?;

        let cookies = match store.load() {
            Ok(Some(cookies)) => cookies,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(path = %store.path().display(), error = %e, "Ignoring unreadable saved session");
                return None;
            }
        };

        self.api.restore_auth_cookies(cookies);
        match self.api.current_user().await {
            Ok(LoginOutcome::Authenticated(user)) => {
                tracing::info!("Resumed saved VRChat session");
                Some(user)
            }
            Ok(LoginOutcome::TwoFactorRequired(_)) => {
                tracing::info!("Saved VRChat session needs two-factor again, logging in fresh");
                self.discard_saved_session(store);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Saved VRChat session rejected, logging in fresh");
                self.discard_saved_session(store);
                None
            }
        }
    }

    /// Forget a rejected session both in the client and on disk.
    fn discard_saved_session(&self, store: &SessionStore) {
        self.api.restore_auth_cookies(Default::default());
        if let Err(e) = store.clear() {
            tracing::warn!(path = %store.path().display(), error = %e, "Failed to remove rejected VRChat session");
        }
    }

    async fn fresh_login(&self) -> Result<CurrentUser, SessionError> {
        let credentials = self
            .credentials
            .as_ref()
            .map_err(|missing| SessionError::MissingCredentials(*missing))?;

        tracing::info!(username = %credentials.username, "Logging in to VRChat");

        match self.api.login(&credentials.username, &credentials.password).await? {
            LoginOutcome::Authenticated(user) => Ok(user),
            LoginOutcome::TwoFactorRequired(methods) => {
                self.complete_two_factor(credentials, methods).await
            }
        }
    }

    async fn complete_two_factor(
        &self,
        credentials: &Credentials,
        methods: Vec<String>,
    ) -> Result<CurrentUser, SessionError> {
        let secret = match &credentials.totp_secret {
            Some(secret) if methods.iter().any(|m| m == "totp") => secret,
            _ => return Err(SessionError::TwoFactorUnavailable { methods }),
        };

        let code = Totp::from_base32(secret)?.current_code()?;
        if !self.api.verify_totp(&code).await? {
            return Err(SessionError::TwoFactorRejected);
        }
        tracing::debug!("TOTP accepted");

        match self.api.current_user().await? {
            LoginOutcome::Authenticated(user) => Ok(user),
            LoginOutcome::TwoFactorRequired(_) => Err(SessionError::TwoFactorIncomplete),
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.save(&self.api.auth_cookies()) {
            tracing::warn!(path = %store.path().display(), error = %e, "Failed to save VRChat session");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.read().expect("session lock poisoned"))
            .field("persisted", &self.store.is_some())
            .finish()
    }
}
