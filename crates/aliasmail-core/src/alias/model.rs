//! Alias model types.

use serde::{Deserialize, Serialize};

/// Lifecycle of an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasStatus {
    /// Registered, activation not yet confirmed.
    Creating,
    /// Activation message delivered.
    Active,
    /// Activation failed.
    Failed,
}

impl AliasStatus {
    /// Whether an alias may move from `self` to `next`.
    ///
    /// Only `creating` ever changes: to `active` or to `failed`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Creating, Self::Active | Self::Failed)
        )
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Active => "active",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AliasStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived address registered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    /// Full address, unique within the registry.
    pub address: String,
    /// Suffix appended to the account local-part.
    pub suffix: String,
    /// Creation time (epoch millis).
    pub created_at: i64,
    /// Lifecycle status.
    pub status: AliasStatus,
}

impl Alias {
    /// Create an alias in the `creating` state.
    #[must_use]
    pub fn new(address: impl Into<String>, suffix: impl Into<String>, created_at: i64) -> Self {
        Self {
            address: address.into(),
            suffix: suffix.into(),
            created_at,
            status: AliasStatus::Creating,
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: AliasStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this alias owns `address`, ignoring case.
    #[must_use]
    pub fn matches_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address.trim())
    }
}

/// Partial update applied by [`AliasRegistry::update`](super::AliasRegistry::update).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasUpdate {
    /// New suffix.
    pub suffix: Option<String>,
    /// New status; must be a legal transition.
    pub status: Option<AliasStatus>,
}

impl AliasUpdate {
    /// Update that only changes the status.
    #[must_use]
    pub const fn status(status: AliasStatus) -> Self {
        Self {
            suffix: None,
            status: Some(status),
        }
    }
}
