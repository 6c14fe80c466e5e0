//! Aliases: derived addresses that forward into the account inbox.
//!
//! An alias is the account's local-part with a suffix appended
//! (`user` + `xyz` = `userxyz@2925.com`). The registry keeps the locally
//! known aliases in sync with the store; the creator derives and activates
//! new ones.

mod model;
mod registry;
mod validation;
mod workflow;

pub use model::{Alias, AliasStatus, AliasUpdate};
pub use registry::AliasRegistry;
pub use validation::{MAX_SUFFIX_LEN, SuffixError, validate_suffix};
pub use workflow::{AliasCreator, derive_address, random_suffix};
