//! Client facade.
//!
//! Wires the managers together: the scheduler drives inbox refreshes, fetch
//! failures go to the retry coordinator, and the session gates polling.

use std::sync::{Arc, OnceLock};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::alias::{Alias, AliasCreator, AliasRegistry, AliasUpdate};
use crate::config::{AliasMode, ClientConfig};
use crate::error::{Error, Result};
use crate::port::RemoteCommands;
use crate::recovery::RetryCoordinator;
use crate::scheduler::{PollingScheduler, RefreshOutcome, SchedulerConfig, SchedulerHandle};
use crate::session::{Credentials, Session, SessionManager};
use crate::sync::{AliasMatcher, InboxSync, RemoteItem};

/// Retry context label of inbox refreshes.
pub const FETCH_CONTEXT: &str = "fetchEmails";

struct Shared<P> {
    config: ClientConfig,
    session: SessionManager<P>,
    aliases: Arc<AliasRegistry<P>>,
    creator: AliasCreator<P>,
    inbox: InboxSync<P>,
    retry: RetryCoordinator<P>,
    scheduler: OnceLock<SchedulerHandle>,
}

impl<P: RemoteCommands> Shared<P> {
    fn matcher(&self, session: &Session) -> AliasMatcher {
        match self.config.alias_mode {
            AliasMode::Registry => AliasMatcher::Registry(self.aliases.list()),
            AliasMode::Inferred => AliasMatcher::Inferred {
                account: session.email.clone(),
            },
        }
    }

    /// One scheduled or manual inbox refresh.
    async fn refresh(self: Arc<Self>) -> Result<()> {
        let result = self.fetch_inbox().await;
        match &result {
            Ok(()) => self.retry.reset_retry_count(FETCH_CONTEXT),
            Err(e) => {
                let handle = self.scheduler.get().cloned();
                self.retry.handle(FETCH_CONTEXT, e, move || async move {
                    if let Some(handle) = handle {
                        handle.refresh().await;
                    }
                });
            }
        }
        result
    }

    async fn fetch_inbox(&self) -> Result<()> {
        if !self.session.validate_session() {
            return Err(Error::NotAuthenticated);
        }
        let session = self.session.session().ok_or(Error::NotAuthenticated)?;
        self.inbox.fetch(&self.matcher(&session)).await?;
        Ok(())
    }

    fn stop_polling(&self) {
        if let Some(handle) = self.scheduler.get() {
            handle.disable();
        }
        self.retry.cancel_pending();
    }
}

/// The client core.
///
/// Owns the session, alias registry, inbox and the polling machinery on
/// top of one [`RemoteCommands`] port. Must be created inside a tokio
/// runtime.
pub struct AliasMailClient<P: RemoteCommands> {
    shared: Arc<Shared<P>>,
    scheduler: PollingScheduler,
    gate: JoinHandle<()>,
}

impl<P: RemoteCommands> AliasMailClient<P> {
    /// Build a client. Polling stays off until [`start`](Self::start) or
    /// [`login`](Self::login) succeeds.
    pub fn new(port: Arc<P>, config: ClientConfig) -> Self {
        let session =
            SessionManager::new(Arc::clone(&port)).with_domain(config.account_domain.clone());
        let retry = RetryCoordinator::new(Arc::clone(&port))
            .with_session_invalidator(session.invalidator());
        let aliases = Arc::new(AliasRegistry::new(Arc::clone(&port)));
        let creator = AliasCreator::new(Arc::clone(&port), Arc::clone(&aliases));
        let scheduler_config = SchedulerConfig {
            interval: config.poll_interval,
            enabled: false,
            immediate: config.poll_immediately,
        };

        let shared = Arc::new(Shared {
            config,
            session,
            aliases,
            creator,
            inbox: InboxSync::new(port),
            retry,
            scheduler: OnceLock::new(),
        });

        let weak = Arc::downgrade(&shared);
        let scheduler = PollingScheduler::new(
            move || {
                let shared = weak.upgrade();
                async move {
                    match shared {
                        Some(shared) => shared.refresh().await,
                        None => Ok(()),
                    }
                }
            },
            scheduler_config,
        );
        let installed = shared.scheduler.set(scheduler.handle());
        debug_assert!(installed.is_ok(), "scheduler handle installed twice");

        let gate = tokio::spawn(session_gate(
            Arc::downgrade(&shared),
            shared.session.subscribe(),
        ));

        Self {
            shared,
            scheduler,
            gate,
        }
    }

    /// Restore the session, load aliases and start polling when
    /// authenticated. Returns whether a session was restored.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias list cannot be loaded.
    pub async fn start(&self) -> Result<bool> {
        let authenticated = self.shared.session.initialize().await;
        self.shared.aliases.refresh().await?;
        if authenticated {
            self.scheduler.enable();
        }
        info!(authenticated, "client started");
        Ok(authenticated)
    }

    /// Log in and start polling.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is rejected or authentication fails.
    pub async fn login(&self, credentials: &Credentials, remember: bool) -> Result<Session> {
        let session = self.shared.session.login(credentials, remember).await?;
        self.scheduler.enable();
        Ok(session)
    }

    /// Stop polling, cancel retries, clear the inbox and log out.
    pub async fn logout(&self) {
        self.shared.stop_polling();
        self.shared.session.logout().await;
        self.shared.inbox.clear();
    }

    /// Refresh the inbox now. Skipped while another refresh is running.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.scheduler.refresh().await
    }

    /// Mark an item read. Returns `false` for an unknown id.
    pub fn mark_as_read(&self, id: &str) -> bool {
        self.shared.inbox.mark_as_read(id)
    }

    /// Create an alias of the current account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] without a session, otherwise see
    /// [`AliasCreator::create`].
    pub async fn create_alias(&self, suffix: Option<&str>) -> Result<Alias> {
        let session = self.shared.session.session().ok_or(Error::NotAuthenticated)?;
        match suffix {
            Some(suffix) => self.shared.creator.create(&session.email, suffix).await,
            None => self.shared.creator.create_random(&session.email).await,
        }
    }

    /// Register an existing alias.
    ///
    /// # Errors
    ///
    /// See [`AliasRegistry::add`].
    pub async fn add_alias(&self, alias: Alias) -> Result<()> {
        self.shared.aliases.add(alias).await
    }

    /// Update an alias.
    ///
    /// # Errors
    ///
    /// See [`AliasRegistry::update`].
    pub async fn update_alias(&self, address: &str, update: AliasUpdate) -> Result<Alias> {
        self.shared.aliases.update(address, update).await
    }

    /// Remove an alias.
    ///
    /// # Errors
    ///
    /// See [`AliasRegistry::delete`].
    pub async fn delete_alias(&self, address: &str) -> Result<Alias> {
        self.shared.aliases.delete(address).await
    }

    /// Enable polling.
    pub fn enable_polling(&self) {
        self.scheduler.enable();
    }

    /// Disable polling and cancel scheduled fetch retries.
    pub fn disable_polling(&self) {
        self.shared.stop_polling();
    }

    /// Toggle polling. Turning it off cancels scheduled fetch retries.
    pub fn toggle_polling(&self) {
        if self.scheduler.is_active() {
            self.shared.stop_polling();
        } else {
            self.scheduler.enable();
        }
    }

    /// Snapshot of the inbox.
    #[must_use]
    pub fn items(&self) -> Vec<RemoteItem> {
        self.shared.inbox.items()
    }

    /// Number of unread items.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.shared.inbox.unread_count()
    }

    /// Items forwarded from `address`.
    #[must_use]
    pub fn items_for_alias(&self, address: &str) -> Vec<RemoteItem> {
        self.shared.inbox.items_for_alias(address)
    }

    /// Snapshot of the alias list.
    #[must_use]
    pub fn aliases(&self) -> Vec<Alias> {
        self.shared.aliases.list()
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.shared.session.session()
    }

    /// Whether a session is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.shared.session.is_authenticated()
    }

    /// Whether polling is enabled.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Whether a refresh is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_refreshing()
    }

    /// Error of the latest refresh, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.scheduler.last_error()
    }

    /// Message of the latest failed fetch, kept until a fetch succeeds.
    #[must_use]
    pub fn last_fetch_error(&self) -> Option<String> {
        self.shared.inbox.last_error()
    }

    /// Retries used so far by inbox refreshes.
    #[must_use]
    pub fn fetch_retry_count(&self) -> u32 {
        self.shared.retry.retry_count(FETCH_CONTEXT)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }
}

impl<P: RemoteCommands> Drop for AliasMailClient<P> {
    fn drop(&mut self) {
        self.gate.abort();
        self.shared.retry.cancel_pending();
    }
}

/// Stops polling whenever the session goes away, for any reason.
async fn session_gate<P: RemoteCommands>(
    shared: std::sync::Weak<Shared<P>>,
    mut sessions: tokio::sync::watch::Receiver<Option<Session>>,
) {
    while sessions.changed().await.is_ok() {
        if sessions.borrow_and_update().is_some() {
            continue;
        }
        let Some(shared) = shared.upgrade() else {
            break;
        };
        debug!("session ended, stopping polling");
        shared.stop_polling();
    }
}
