//! # aliasmail-store
//!
//! Local persistence for the `AliasMail` client core.
//!
//! [`LocalStorage`] implements the core's [`LocalStore`] and [`ErrorSink`]
//! ports:
//! - Session, alias list and preferences as JSON rows in `SQLite`
//! - The account secret in the system keyring
//! - Handled failures appended to daily log files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credentials;
mod error;
pub mod error_log;
pub mod kv;

use std::path::{Path, PathBuf};

use aliasmail_core::{
    Alias, ErrorRecord, ErrorSink, LocalStore, PortResult, Preferences, RemoteError, Session,
};
use tracing::{debug, info};

pub use credentials::SecretVault;
pub use error::{Result, StoreError};
pub use error_log::{ErrorLog, format_entry};
pub use kv::KvStore;

use kv::{ALIASES_KEY, PREFERENCES_KEY, SESSION_KEY};

/// Application directory name under the platform data directory.
const APP_DIR: &str = "aliasmail";
/// Database file name.
const DATABASE_FILE: &str = "aliasmail.db";
/// Log directory name.
const LOG_DIR: &str = "logs";

/// Default data directory: `<data dir>/aliasmail`.
///
/// # Errors
///
/// Returns an error if the platform has no data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(StoreError::NoDataDir)
}

/// Local persistence for the client core.
pub struct LocalStorage {
    kv: KvStore,
    secrets: SecretVault,
    log: ErrorLog,
}

impl LocalStorage {
    /// Open storage under the default data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub async fn open_default() -> Result<Self> {
        Self::open(&default_data_dir()?).await
    }

    /// Open storage under `dir`: `aliasmail.db` and `logs/` inside it, the
    /// secret in the system keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub async fn open(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let database = dir.join(DATABASE_FILE);
        let kv = KvStore::new(&database.to_string_lossy()).await?;
        info!(path = %dir.display(), "opened local storage");
        Ok(Self {
            kv,
            secrets: SecretVault::Keyring,
            log: ErrorLog::new(dir.join(LOG_DIR)),
        })
    }

    /// In-memory database and secrets, logging into `log_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub async fn in_memory(log_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            kv: KvStore::in_memory().await?,
            secrets: SecretVault::memory(),
            log: ErrorLog::new(log_dir),
        })
    }

    /// Use `secrets` instead of the default vault.
    #[must_use]
    pub fn with_secrets(mut self, secrets: SecretVault) -> Self {
        self.secrets = secrets;
        self
    }

    /// The error log.
    #[must_use]
    pub const fn error_log(&self) -> &ErrorLog {
        &self.log
    }

    /// Drop the cached session and the secret filed under its account.
    async fn forget_session(&self) -> Result<()> {
        let session: Option<Session> = self.kv.get(SESSION_KEY).await?;
        if let Some(session) = session {
            self.secrets.delete(&session.email)?;
        }
        self.kv.delete(SESSION_KEY).await?;
        debug!("cleared cached session");
        Ok(())
    }
}

impl LocalStore for LocalStorage {
    async fn persist_session(&self, session: &Session) -> PortResult<()> {
        self.kv.put(SESSION_KEY, session).await.map_err(RemoteError::from)
    }

    async fn load_session(&self) -> PortResult<Option<Session>> {
        self.kv.get(SESSION_KEY).await.map_err(RemoteError::from)
    }

    async fn clear_session(&self) -> PortResult<()> {
        self.forget_session().await.map_err(RemoteError::from)
    }

    async fn persist_secret(&self, account: &str, secret: &str) -> PortResult<()> {
        self.secrets.store(account, secret).map_err(RemoteError::from)
    }

    async fn load_secret(&self, account: &str) -> PortResult<Option<String>> {
        self.secrets.get(account).map_err(RemoteError::from)
    }

    async fn persist_alias_list(&self, aliases: &[Alias]) -> PortResult<()> {
        self.kv.put(ALIASES_KEY, aliases).await.map_err(RemoteError::from)
    }

    async fn load_alias_list(&self) -> PortResult<Vec<Alias>> {
        self.kv
            .get(ALIASES_KEY)
            .await
            .map(Option::unwrap_or_default)
            .map_err(RemoteError::from)
    }

    async fn persist_preferences(&self, preferences: &Preferences) -> PortResult<()> {
        self.kv.put(PREFERENCES_KEY, preferences).await.map_err(RemoteError::from)
    }

    async fn load_preferences(&self) -> PortResult<Option<Preferences>> {
        self.kv.get(PREFERENCES_KEY).await.map_err(RemoteError::from)
    }
}

impl ErrorSink for LocalStorage {
    async fn log_error(&self, record: &ErrorRecord) -> PortResult<()> {
        self.log.append(record).await.map_err(RemoteError::from)
    }
}
