//! In-memory port and clock for unit tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::alias::Alias;
use crate::clock::{Clock, now_millis};
use crate::config::Preferences;
use crate::error::RemoteError;
use crate::lock;
use crate::port::{ErrorSink, LocalStore, MailBackend, PortResult};
use crate::recovery::ErrorRecord;
use crate::session::Session;
use crate::sync::RemoteItem;

/// Clock that only moves when told to.
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// A message handed to `send_remote_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub destination: String,
    pub subject: String,
    pub body: String,
}

/// Port double. Every operation can be made to fail by name.
#[derive(Default)]
pub struct MockPort {
    session: Mutex<Option<Session>>,
    secrets: Mutex<HashMap<String, String>>,
    aliases: Mutex<Vec<Alias>>,
    preferences: Mutex<Option<Preferences>>,
    remote_items: Mutex<Vec<RemoteItem>>,
    fetch_delay: Mutex<Duration>,
    fetch_calls: AtomicUsize,
    auth_calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<Sent>>,
    logged: Mutex<Vec<ErrorRecord>>,
    failures: Mutex<HashMap<&'static str, String>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail with a message naming it.
    pub fn fail(&self, op: &'static str) {
        self.fail_with(op, &format!("{op} failed"));
    }

    pub fn fail_with(&self, op: &'static str, message: &str) {
        lock(&self.failures).insert(op, message.to_string());
    }

    pub fn succeed(&self, op: &'static str) {
        lock(&self.failures).remove(op);
    }

    fn check(&self, op: &'static str) -> PortResult<()> {
        match lock(&self.failures).get(op) {
            Some(message) => Err(RemoteError::new(message.clone())),
            None => Ok(()),
        }
    }

    pub fn seed_session(&self, session: Session) {
        *lock(&self.session) = Some(session);
    }

    pub fn seed_secret(&self, account: &str, secret: &str) {
        lock(&self.secrets).insert(account.to_string(), secret.to_string());
    }

    pub fn seed_preferences(&self, preferences: Preferences) {
        *lock(&self.preferences) = Some(preferences);
    }

    pub fn seed_aliases(&self, aliases: Vec<Alias>) {
        *lock(&self.aliases) = aliases;
    }

    pub fn set_remote_items(&self, items: Vec<RemoteItem>) {
        *lock(&self.remote_items) = items;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *lock(&self.fetch_delay) = delay;
    }

    pub fn stored_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    pub fn stored_secret(&self, account: &str) -> Option<String> {
        lock(&self.secrets).get(account).cloned()
    }

    pub fn stored_preferences(&self) -> Option<Preferences> {
        lock(&self.preferences).clone()
    }

    pub fn stored_aliases(&self) -> Vec<Alias> {
        lock(&self.aliases).clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn auth_calls(&self) -> Vec<String> {
        lock(&self.auth_calls).clone()
    }

    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.sent).clone()
    }

    pub fn logged(&self) -> Vec<ErrorRecord> {
        lock(&self.logged).clone()
    }
}

impl MailBackend for MockPort {
    async fn authenticate(&self, account: &str, _secret: &str) -> PortResult<Session> {
        lock(&self.auth_calls).push(account.to_string());
        self.check("authenticate")?;
        Ok(Session::new(
            account,
            format!("token_{}", uuid::Uuid::new_v4()),
            now_millis() + 3_600_000,
        ))
    }

    async fn deauthenticate(&self) -> PortResult<()> {
        self.check("deauthenticate")
    }

    async fn fetch_remote_items(&self) -> PortResult<Vec<RemoteItem>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.fetch_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check("fetch_remote_items")?;
        Ok(lock(&self.remote_items).clone())
    }

    async fn send_remote_item(&self, destination: &str, subject: &str, body: &str) -> PortResult<()> {
        self.check("send_remote_item")?;
        lock(&self.sent).push(Sent {
            destination: destination.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

impl LocalStore for MockPort {
    async fn persist_session(&self, session: &Session) -> PortResult<()> {
        self.check("persist_session")?;
        *lock(&self.session) = Some(session.clone());
        Ok(())
    }

    async fn load_session(&self) -> PortResult<Option<Session>> {
        self.check("load_session")?;
        Ok(lock(&self.session).clone())
    }

    async fn clear_session(&self) -> PortResult<()> {
        self.check("clear_session")?;
        if let Some(session) = lock(&self.session).take() {
            lock(&self.secrets).remove(&session.email);
        }
        Ok(())
    }

    async fn persist_secret(&self, account: &str, secret: &str) -> PortResult<()> {
        self.check("persist_secret")?;
        lock(&self.secrets).insert(account.to_string(), secret.to_string());
        Ok(())
    }

    async fn load_secret(&self, account: &str) -> PortResult<Option<String>> {
        self.check("load_secret")?;
        Ok(lock(&self.secrets).get(account).cloned())
    }

    async fn persist_alias_list(&self, aliases: &[Alias]) -> PortResult<()> {
        self.check("persist_alias_list")?;
        *lock(&self.aliases) = aliases.to_vec();
        Ok(())
    }

    async fn load_alias_list(&self) -> PortResult<Vec<Alias>> {
        self.check("load_alias_list")?;
        Ok(lock(&self.aliases).clone())
    }

    async fn persist_preferences(&self, preferences: &Preferences) -> PortResult<()> {
        self.check("persist_preferences")?;
        *lock(&self.preferences) = Some(preferences.clone());
        Ok(())
    }

    async fn load_preferences(&self) -> PortResult<Option<Preferences>> {
        self.check("load_preferences")?;
        Ok(lock(&self.preferences).clone())
    }
}

impl ErrorSink for MockPort {
    async fn log_error(&self, record: &ErrorRecord) -> PortResult<()> {
        self.check("log_error")?;
        lock(&self.logged).push(record.clone());
        Ok(())
    }
}
