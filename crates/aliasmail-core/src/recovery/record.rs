//! Error log entries.

use serde::{Deserialize, Serialize};

use super::ErrorKind;

/// One handled failure, as handed to the error sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// When the failure was handled (epoch millis).
    pub timestamp: i64,
    /// Label of the failing operation, e.g. `fetchEmails`.
    pub context: String,
    /// Human-readable failure message.
    pub message: String,
    /// Stack trace, when the failure carried one.
    pub stack: Option<String>,
    /// Classified kind.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl ErrorRecord {
    /// Build a record, classifying `message`.
    #[must_use]
    pub fn new(timestamp: i64, context: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            timestamp,
            context: context.into(),
            kind: ErrorKind::classify(&message),
            message,
            stack: None,
        }
    }

    /// Attach a stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}
