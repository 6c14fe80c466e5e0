//! Error types for the storage adapter.

use aliasmail_core::RemoteError;
use thiserror::Error;

/// Errors that can occur in storage operations.
///
/// Messages lead with "Storage" or "Keyring" so the core's classifier
/// sees them as storage failures unless the wrapped cause says otherwise.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("Storage database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Keyring access failed.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// A secret was saved or read with no account to file it under.
    #[error("Keyring entry needs an account address")]
    MissingAccount,

    /// No data directory could be determined for this platform.
    #[error("Storage directory not available")]
    NoDataDir,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for RemoteError {
    fn from(e: StoreError) -> Self {
        Self::new(e.to_string())
    }
}
