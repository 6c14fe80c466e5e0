//! Shared in-memory backend for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use aliasmail_core::clock::now_millis;
use aliasmail_core::{
    Alias, ErrorRecord, ErrorSink, LocalStore, MailBackend, Preferences, PortResult, RemoteError,
    RemoteItem, Session,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

/// Backend whose storage is a handful of mutexes and whose failures are
/// scripted per operation.
#[derive(Default)]
pub struct FakeBackend {
    session: Mutex<Option<Session>>,
    secrets: Mutex<HashMap<String, String>>,
    aliases: Mutex<Vec<Alias>>,
    preferences: Mutex<Option<Preferences>>,
    inbox: Mutex<Vec<RemoteItem>>,
    failures: Mutex<HashMap<&'static str, String>>,
    fetches: AtomicUsize,
    logins: AtomicUsize,
    log: Mutex<Vec<ErrorRecord>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: &'static str, message: &str) {
        lock(&self.failures).insert(op, message.to_string());
    }

    pub fn recover(&self, op: &'static str) {
        lock(&self.failures).remove(op);
    }

    fn check(&self, op: &'static str) -> PortResult<()> {
        lock(&self.failures)
            .get(op)
            .map_or(Ok(()), |m| Err(RemoteError::new(m.clone())))
    }

    pub fn deliver(&self, item: RemoteItem) {
        lock(&self.inbox).push(item);
    }

    pub fn cache_session(&self, session: Session, secret: &str) {
        lock(&self.secrets).insert(session.email.clone(), secret.to_string());
        *lock(&self.session) = Some(session);
    }

    pub fn save_preferences(&self, preferences: Preferences) {
        *lock(&self.preferences) = Some(preferences);
    }

    pub fn save_aliases(&self, aliases: Vec<Alias>) {
        *lock(&self.aliases) = aliases;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn cached_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    pub fn error_log(&self) -> Vec<ErrorRecord> {
        lock(&self.log).clone()
    }
}

impl MailBackend for FakeBackend {
    async fn authenticate(&self, account: &str, _secret: &str) -> PortResult<Session> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.check("authenticate")?;
        Ok(Session::new(account, "fresh-token", now_millis() + 3_600_000))
    }

    async fn deauthenticate(&self) -> PortResult<()> {
        self.check("deauthenticate")
    }

    async fn fetch_remote_items(&self) -> PortResult<Vec<RemoteItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check("fetch")?;
        Ok(lock(&self.inbox).clone())
    }

    async fn send_remote_item(&self, _to: &str, _subject: &str, _body: &str) -> PortResult<()> {
        self.check("send")
    }
}

impl LocalStore for FakeBackend {
    async fn persist_session(&self, session: &Session) -> PortResult<()> {
        self.check("persist_session")?;
        *lock(&self.session) = Some(session.clone());
        Ok(())
    }

    async fn load_session(&self) -> PortResult<Option<Session>> {
        Ok(lock(&self.session).clone())
    }

    async fn clear_session(&self) -> PortResult<()> {
        if let Some(session) = lock(&self.session).take() {
            lock(&self.secrets).remove(&session.email);
        }
        Ok(())
    }

    async fn persist_secret(&self, account: &str, secret: &str) -> PortResult<()> {
        lock(&self.secrets).insert(account.to_string(), secret.to_string());
        Ok(())
    }

    async fn load_secret(&self, account: &str) -> PortResult<Option<String>> {
        Ok(lock(&self.secrets).get(account).cloned())
    }

    async fn persist_alias_list(&self, aliases: &[Alias]) -> PortResult<()> {
        self.check("persist_aliases")?;
        *lock(&self.aliases) = aliases.to_vec();
        Ok(())
    }

    async fn load_alias_list(&self) -> PortResult<Vec<Alias>> {
        Ok(lock(&self.aliases).clone())
    }

    async fn persist_preferences(&self, preferences: &Preferences) -> PortResult<()> {
        self.check("persist_preferences")?;
        *lock(&self.preferences) = Some(preferences.clone());
        Ok(())
    }

    async fn load_preferences(&self) -> PortResult<Option<Preferences>> {
        Ok(lock(&self.preferences).clone())
    }
}

impl ErrorSink for FakeBackend {
    async fn log_error(&self, record: &ErrorRecord) -> PortResult<()> {
        lock(&self.log).push(record.clone());
        Ok(())
    }
}
