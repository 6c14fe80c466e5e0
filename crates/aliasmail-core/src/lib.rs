//! # aliasmail-core
//!
//! Core logic for the `AliasMail` client.
//!
//! This crate keeps a locally displayed inbox and alias list in sync with a
//! remote mail account that is only reachable through an opaque, failure-prone
//! command port. It provides:
//! - Polling scheduler with overlap prevention
//! - Inbox synchronizer with alias classification and read-state merging
//! - Failure classification, recovery policy and retry scheduling
//! - Session lifecycle with silent re-authentication
//! - Alias registry and creation workflow
//!
//! The port traits live in [`port`]; `aliasmail-store` provides a local
//! persistence adapter for them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod alias;
mod client;
pub mod clock;
pub mod config;
mod error;
pub mod port;
pub mod recovery;
pub mod scheduler;
pub mod session;
pub mod sync;

#[cfg(test)]
mod testing;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use alias::{
    Alias, AliasCreator, AliasRegistry, AliasStatus, AliasUpdate, SuffixError, random_suffix,
    validate_suffix,
};
pub use client::AliasMailClient;
pub use config::{AliasMode, ClientConfig, Preferences, WindowSize};
pub use error::{Error, RemoteError, Result};
pub use port::{ErrorSink, LocalStore, MailBackend, PortResult, RemoteCommands};
pub use recovery::{ErrorKind, ErrorRecord, RecoveryPolicy, RetryCoordinator, RetryDecision};
pub use scheduler::{PollingScheduler, RefreshOutcome, SchedulerConfig, SchedulerHandle};
pub use session::{
    CredentialError, Credentials, Session, SessionInvalidator, SessionManager,
    validate_credentials,
};
pub use sync::{AliasMatcher, InboxSync, RemoteItem, extract_addresses, is_alias_of};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Critical sections in this crate never leave state half-updated, so a
/// poisoned lock is still safe to use.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
