//! The remote command port.
//!
//! Everything the core does across an await point goes through these
//! traits. The backend behind them (IMAP, a Tauri command bridge, an
//! in-memory fake) is opaque: every call can fail with a [`RemoteError`]
//! carrying a human-readable message, and that message is all the recovery
//! machinery gets to look at.
//!
//! The port is split by concern so that each manager only asks for what it
//! uses. [`RemoteCommands`] is the full port and is implemented for any
//! type that provides all three parts.

use std::future::Future;

use crate::alias::Alias;
use crate::config::Preferences;
use crate::error::RemoteError;
use crate::recovery::ErrorRecord;
use crate::session::Session;
use crate::sync::RemoteItem;

/// Result of a port call.
pub type PortResult<T> = std::result::Result<T, RemoteError>;

/// Mail-server side of the port.
pub trait MailBackend: Send + Sync + 'static {
    /// Verify credentials and open a session.
    fn authenticate(
        &self,
        account: &str,
        secret: &str,
    ) -> impl Future<Output = PortResult<Session>> + Send;

    /// Close the remote session.
    fn deauthenticate(&self) -> impl Future<Output = PortResult<()>> + Send;

    /// Fetch the current inbox contents.
    fn fetch_remote_items(&self) -> impl Future<Output = PortResult<Vec<RemoteItem>>> + Send;

    /// Send a message.
    fn send_remote_item(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = PortResult<()>> + Send;
}

/// Durable local state.
pub trait LocalStore: Send + Sync + 'static {
    /// Save the current session.
    fn persist_session(&self, session: &Session) -> impl Future<Output = PortResult<()>> + Send;

    /// Load the cached session, if any.
    fn load_session(&self) -> impl Future<Output = PortResult<Option<Session>>> + Send;

    /// Forget the cached session and the secret stored with it.
    fn clear_session(&self) -> impl Future<Output = PortResult<()>> + Send;

    /// Save the secret of `account` for silent re-authentication.
    fn persist_secret(
        &self,
        account: &str,
        secret: &str,
    ) -> impl Future<Output = PortResult<()>> + Send;

    /// Load the secret saved for `account`, if any.
    fn load_secret(
        &self,
        account: &str,
    ) -> impl Future<Output = PortResult<Option<String>>> + Send;

    /// Replace the stored alias list.
    fn persist_alias_list(&self, aliases: &[Alias]) -> impl Future<Output = PortResult<()>> + Send;

    /// Load the stored alias list (empty when nothing was saved).
    fn load_alias_list(&self) -> impl Future<Output = PortResult<Vec<Alias>>> + Send;

    /// Save user preferences.
    fn persist_preferences(
        &self,
        preferences: &Preferences,
    ) -> impl Future<Output = PortResult<()>> + Send;

    /// Load user preferences, if saved.
    fn load_preferences(&self) -> impl Future<Output = PortResult<Option<Preferences>>> + Send;
}

/// Append-only error log.
pub trait ErrorSink: Send + Sync + 'static {
    /// Record a handled failure.
    fn log_error(&self, record: &ErrorRecord) -> impl Future<Output = PortResult<()>> + Send;
}

/// The complete remote command port.
pub trait RemoteCommands: MailBackend + LocalStore + ErrorSink {}

impl<T> RemoteCommands for T where T: MailBackend + LocalStore + ErrorSink {}
