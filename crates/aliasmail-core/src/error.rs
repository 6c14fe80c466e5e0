//! Error types for the core library.

use thiserror::Error;

use crate::alias::{AliasStatus, SuffixError};
use crate::recovery::ErrorKind;
use crate::session::CredentialError;

/// Failure reported by the remote command port.
///
/// The port is opaque: all the core learns about a failure is a
/// human-readable message and, sometimes, a stack trace. The message is
/// what [`ErrorKind::classify`] looks at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
    stack: Option<String>,
}

impl RemoteError {
    /// Create an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Attach a stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The stack trace, if the port supplied one.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

/// Errors that can occur in core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A remote command failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// An alias with the same address is already registered.
    #[error("Alias already exists: {0}")]
    DuplicateAlias(String),

    /// No alias with this address is registered.
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// The requested status change is not allowed.
    #[error("Invalid alias status change: {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: AliasStatus,
        /// Requested status.
        to: AliasStatus,
    },

    /// An address is not of the form `local@domain`.
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    /// The alias suffix was rejected.
    #[error("Invalid alias suffix: {0}")]
    InvalidSuffix(#[from] SuffixError),

    /// Login input was rejected before reaching the backend.
    #[error("Invalid input: {}", join_messages(.0))]
    InvalidCredentials(Vec<CredentialError>),

    /// The operation needs a valid session.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl Error {
    /// Classify this error for the recovery policy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::classify(&self.to_string())
    }

    /// Stack trace carried by a remote failure.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Remote(e) => e.stack(),
            _ => None,
        }
    }
}

fn join_messages(errors: &[CredentialError]) -> String {
    errors
        .iter()
        .map(CredentialError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
