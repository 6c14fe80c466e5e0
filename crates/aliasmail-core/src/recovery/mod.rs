//! Failure classification, recovery policy and retry scheduling.
//!
//! Every failure that reaches the [`RetryCoordinator`] is classified into an
//! [`ErrorKind`], logged as an [`ErrorRecord`], and then either retried with
//! exponential backoff or dropped. The coordinator is the end of the line:
//! nothing it handles is propagated further.

mod policy;
mod record;
mod retry;

pub use policy::{CLASSIFICATION_RULES, ErrorKind, RecoveryPolicy};
pub use record::ErrorRecord;
pub use retry::{RetryCoordinator, RetryDecision};
