//! Remote item model.

use serde::{Deserialize, Serialize};

/// A message fetched from the account inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    /// Server-assigned id, unique within the inbox.
    pub id: String,
    /// Raw `From` header.
    pub from: String,
    /// Raw `To` header; may hold several addresses.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Send time (epoch millis).
    pub timestamp: i64,
    /// Read flag.
    #[serde(default)]
    pub is_read: bool,
    /// Whether the item was addressed to one of the account's aliases.
    #[serde(default, rename = "isSubEmailForwarded")]
    pub is_forwarded: bool,
    /// The alias the item was addressed to, when forwarded.
    #[serde(default, rename = "originalSubEmail", skip_serializing_if = "Option::is_none")]
    pub original_sub_email: Option<String>,
}

impl RemoteItem {
    /// Create an unread, unclassified item.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: String::new(),
            timestamp,
            is_read: false,
            is_forwarded: false,
            original_sub_email: None,
        }
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Mark as read.
    #[must_use]
    pub fn read(mut self) -> Self {
        self.is_read = true;
        self
    }
}
