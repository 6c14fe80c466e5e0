//! Session lifecycle.
//!
//! Tracks whether the user is authenticated, evaluates expiry, and restores
//! a session at startup from the local store, silently re-authenticating
//! with the cached secret when the user asked for it.

mod manager;
mod model;
mod validation;

pub use manager::{SessionInvalidator, SessionManager};
pub use model::{Credentials, Session};
pub use validation::{CredentialError, CredentialResult, validate_credentials};
