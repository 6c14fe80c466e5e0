//! Session model types.

use serde::{Deserialize, Serialize};

/// An authenticated session with the mail backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Account address.
    pub email: String,
    /// Opaque session token.
    pub token: String,
    /// Expiry (epoch millis).
    pub expires_at: i64,
}

impl Session {
    /// Create a session.
    #[must_use]
    pub fn new(email: impl Into<String>, token: impl Into<String>, expires_at: i64) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
            expires_at,
        }
    }

    /// Whether the session is still valid at `now` (epoch millis).
    #[must_use]
    pub const fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Login input.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account address.
    pub email: String,
    /// Account secret.
    pub secret: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .finish()
    }
}
