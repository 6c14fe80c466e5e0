//! Account secret storage.
//!
//! The secret used for silent re-authentication lives in the platform's
//! credential store:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager
//!
//! [`SecretVault::Memory`] keeps secrets in process instead, for tests and
//! for hosts without a credential store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use tracing::debug;

use crate::{Result, StoreError};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "aliasmail";

/// Generates the keyring entry key for an account.
fn secret_key(account: &str) -> String {
    format!("{SERVICE_NAME}_secret_{}", account.to_lowercase())
}

fn check_account(account: &str) -> Result<()> {
    if account.trim().is_empty() {
        return Err(StoreError::MissingAccount);
    }
    Ok(())
}

/// Where account secrets are kept.
pub enum SecretVault {
    /// The system keyring.
    Keyring,
    /// A process-local map.
    Memory(Mutex<HashMap<String, String>>),
}

impl SecretVault {
    /// An empty in-process vault.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Mutex::new(HashMap::new()))
    }

    /// Store the secret for `account`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if `account` is empty or the keyring operation fails.
    pub fn store(&self, account: &str, secret: &str) -> Result<()> {
        check_account(account)?;
        let key = secret_key(account);
        match self {
            Self::Keyring => Entry::new(SERVICE_NAME, &key)?.set_password(secret)?,
            Self::Memory(map) => {
                map.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, secret.to_string());
            }
        }
        debug!(account, "stored account secret");
        Ok(())
    }

    /// Fetch the secret for `account`.
    ///
    /// # Errors
    ///
    /// Returns an error if `account` is empty or the keyring operation fails.
    pub fn get(&self, account: &str) -> Result<Option<String>> {
        check_account(account)?;
        let key = secret_key(account);
        match self {
            Self::Keyring => match Entry::new(SERVICE_NAME, &key)?.get_password() {
                Ok(secret) => Ok(Some(secret)),
                Err(keyring::Error::NoEntry) => {
                    debug!(account, "no account secret found");
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            },
            Self::Memory(map) => Ok(map
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
                .cloned()),
        }
    }

    /// Delete the secret for `account`. A missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `account` is empty or the keyring operation fails.
    pub fn delete(&self, account: &str) -> Result<()> {
        check_account(account)?;
        let key = secret_key(account);
        match self {
            Self::Keyring => match Entry::new(SERVICE_NAME, &key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e.into()),
            },
            Self::Memory(map) => {
                map.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&key);
            }
        }
        debug!(account, "deleted account secret");
        Ok(())
    }
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyring => f.write_str("SecretVault::Keyring"),
            Self::Memory(_) => f.write_str("SecretVault::Memory"),
        }
    }
}
