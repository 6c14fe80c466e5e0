//! Inbox synchronization.
//!
//! Fetched items replace the visible list on every refresh, but local
//! read flags survive: an item read locally stays read even if the server
//! still reports it unseen. Each item is also classified as forwarded
//! (addressed to one of the account's aliases) or not.

mod inbox;
mod matcher;
mod model;

pub use inbox::InboxSync;
pub use matcher::{AliasMatcher, extract_addresses, is_alias_of};
pub use model::RemoteItem;
