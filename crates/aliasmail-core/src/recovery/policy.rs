//! Failure classification and the static recovery-policy table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Category of a failure, derived from its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Transport-level failure (timeouts, DNS, dropped connections).
    Network,
    /// Credentials or session were rejected.
    Auth,
    /// The remote side failed while handling a well-formed request.
    Server,
    /// Input was rejected as malformed.
    Validation,
    /// Local persistence failed.
    Storage,
    /// Anything else.
    Unknown,
}

/// Keyword groups, evaluated top to bottom. The first group with a keyword
/// contained in the lowercased message decides the kind.
pub const CLASSIFICATION_RULES: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::Network,
        &["timeout", "network", "connection", "dns", "fetch"],
    ),
    (
        ErrorKind::Auth,
        &[
            "auth",
            "login",
            "credential",
            "token",
            "session",
            "unauthorized",
            "401",
        ],
    ),
    (
        ErrorKind::Server,
        &["server", "500", "502", "503", "internal"],
    ),
    (
        ErrorKind::Validation,
        &["invalid", "validation", "required", "malformed"],
    ),
    (
        ErrorKind::Storage,
        &["storage", "store", "persist", "keyring", "quota", "disk"],
    ),
];

impl ErrorKind {
    /// Classify a failure message.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        CLASSIFICATION_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map_or(Self::Unknown, |(kind, _)| *kind)
    }

    /// The recovery policy for this kind.
    #[must_use]
    pub const fn policy(self) -> RecoveryPolicy {
        match self {
            Self::Network => RecoveryPolicy::retry(3, 1000),
            Self::Server => RecoveryPolicy::retry(3, 2000),
            Self::Storage => RecoveryPolicy::retry(2, 500),
            Self::Auth | Self::Validation | Self::Unknown => RecoveryPolicy::NONE,
        }
    }

    /// Lowercase name, as written to error logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Server => "server",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether and how a failure of one kind is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Whether the failure is retried at all.
    pub should_retry: bool,
    /// Upper bound on retries per context.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
}

impl RecoveryPolicy {
    /// Policy for failures that are never retried.
    pub const NONE: Self = Self {
        should_retry: false,
        max_retries: 0,
        base_delay_ms: 0,
    };

    const fn retry(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            should_retry: true,
            max_retries,
            base_delay_ms,
        }
    }

    /// Backoff delay before retry number `attempt` (starting at 0):
    /// `base_delay * 2^attempt`, saturating.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}
