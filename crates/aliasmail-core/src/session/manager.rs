//! Session lifecycle manager.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Credentials, Session, validate_credentials};
use crate::clock::{Clock, SystemClock};
use crate::config::{DEFAULT_ACCOUNT_DOMAIN, Preferences};
use crate::error::{Error, Result};
use crate::port::{LocalStore, MailBackend};

type SessionState = Arc<watch::Sender<Option<Session>>>;

/// Drops the in-memory session from outside the manager.
///
/// Handed to components that detect auth failures (the retry coordinator)
/// so they can end the session without owning the manager.
#[derive(Clone)]
pub struct SessionInvalidator {
    state: SessionState,
}

impl SessionInvalidator {
    /// End the current session. No-op when already unauthenticated.
    pub fn invalidate(&self) {
        let cleared = self.state.send_if_modified(|session| session.take().is_some());
        if cleared {
            info!("session invalidated");
        }
    }
}

impl std::fmt::Debug for SessionInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInvalidator").finish_non_exhaustive()
    }
}

/// Owns the authentication state.
///
/// The current session is published on a watch channel; see
/// [`subscribe`](Self::subscribe).
pub struct SessionManager<P> {
    port: Arc<P>,
    state: SessionState,
    clock: Arc<dyn Clock>,
    domain: String,
}

impl<P> SessionManager<P>
where
    P: MailBackend + LocalStore,
{
    /// Create an unauthenticated manager using the system clock.
    pub fn new(port: Arc<P>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            port,
            state: Arc::new(state),
            clock: Arc::new(SystemClock),
            domain: DEFAULT_ACCOUNT_DOMAIN.to_string(),
        }
    }

    /// Use `clock` for expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Require login addresses under `domain`.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Restore a session at startup.
    ///
    /// An unexpired cached session is adopted without contacting the
    /// backend. Otherwise, when auto-login is on and both a cached session
    /// and secret exist, re-authenticates silently with them. Returns
    /// whether the manager ended up authenticated; failures are logged, not
    /// returned.
    pub async fn initialize(&self) -> bool {
        let cached = match self.port.load_session().await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Failed to load cached session: {e}");
                None
            }
        };

        let Some(cached) = cached else {
            debug!("no cached session");
            return false;
        };

        if cached.is_valid_at(self.clock.now_millis()) {
            info!(account = %cached.email, "restored cached session");
            self.state.send_replace(Some(cached));
            return true;
        }

        if !self.auto_login_enabled().await {
            debug!(account = %cached.email, "cached session expired, auto-login off");
            return false;
        }

        let secret = match self.port.load_secret(&cached.email).await {
            Ok(Some(secret)) => secret,
            Ok(None) => {
                debug!(account = %cached.email, "no cached secret for auto-login");
                return false;
            }
            Err(e) => {
                warn!("Failed to load cached secret: {e}");
                return false;
            }
        };

        match self.port.authenticate(&cached.email, &secret).await {
            Ok(session) => {
                info!(account = %session.email, "silently re-authenticated");
                if let Err(e) = self.port.persist_session(&session).await {
                    warn!("Failed to persist session: {e}");
                }
                self.state.send_replace(Some(session));
                true
            }
            Err(e) => {
                warn!(account = %cached.email, "auto-login failed: {e}");
                false
            }
        }
    }

    /// Authenticate and cache the session.
    ///
    /// After a successful authentication the session, the secret and the
    /// `auto_login = remember` preference are persisted. Persistence
    /// failures are logged and do not undo the login.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is rejected or authentication fails.
    pub async fn login(&self, credentials: &Credentials, remember: bool) -> Result<Session> {
        validate_credentials(&credentials.email, &credentials.secret, &self.domain)
            .map_err(Error::InvalidCredentials)?;

        let session = self
            .port
            .authenticate(credentials.email.trim(), &credentials.secret)
            .await?;
        info!(account = %session.email, "logged in");
        self.state.send_replace(Some(session.clone()));

        if let Err(e) = self.port.persist_session(&session).await {
            warn!("Failed to persist session: {e}");
        }
        if let Err(e) = self
            .port
            .persist_secret(&session.email, &credentials.secret)
            .await
        {
            warn!("Failed to persist secret: {e}");
        }
        let mut preferences = self.load_preferences().await;
        preferences.auto_login = remember;
        if let Err(e) = self.port.persist_preferences(&preferences).await {
            warn!("Failed to persist preferences: {e}");
        }

        Ok(session)
    }

    /// End the session remotely and forget it locally.
    ///
    /// Never fails: remote and local errors are logged and the in-memory
    /// state is cleared regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.port.deauthenticate().await {
            warn!("Remote logout failed: {e}");
        }
        if let Err(e) = self.port.clear_session().await {
            warn!("Failed to clear cached session: {e}");
        }
        self.state.send_if_modified(|session| session.take().is_some());
        info!("logged out");
    }

    /// Check the session against the clock. An expired session is dropped.
    pub fn validate_session(&self) -> bool {
        let now = self.clock.now_millis();
        let mut valid = false;
        self.state.send_if_modified(|session| match session {
            Some(current) if current.is_valid_at(now) => {
                valid = true;
                false
            }
            Some(current) => {
                info!(account = %current.email, "session expired");
                *session = None;
                true
            }
            None => false,
        });
        valid
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Whether a session is held. Does not check expiry.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Watch session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// Handle that can end the session.
    #[must_use]
    pub fn invalidator(&self) -> SessionInvalidator {
        SessionInvalidator {
            state: Arc::clone(&self.state),
        }
    }

    async fn auto_login_enabled(&self) -> bool {
        self.load_preferences().await.auto_login
    }

    async fn load_preferences(&self) -> Preferences {
        match self.port.load_preferences().await {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load preferences: {e}");
                Preferences::default()
            }
        }
    }
}
