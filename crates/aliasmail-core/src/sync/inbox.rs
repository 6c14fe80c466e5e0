//! Inbox synchronizer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::{AliasMatcher, RemoteItem};
use crate::error::Result;
use crate::lock;
use crate::port::MailBackend;

#[derive(Default)]
struct InboxState {
    items: Vec<RemoteItem>,
    last_error: Option<String>,
    /// Bumped by `clear`; a fetch started under an older epoch is dropped.
    epoch: u64,
}

/// The visible inbox, merged from remote fetches and local read flags.
pub struct InboxSync<B> {
    backend: Arc<B>,
    state: Mutex<InboxState>,
}

impl<B: MailBackend> InboxSync<B> {
    /// Create an empty inbox.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Mutex::new(InboxState::default()),
        }
    }

    /// Fetch the inbox and replace the visible list.
    ///
    /// Items are classified with `matcher` and sorted newest first. An item
    /// already read locally stays read. Returns a snapshot of the new list.
    ///
    /// If [`clear`](Self::clear) runs while the fetch is in flight, its
    /// outcome is discarded, errors included, and the current (cleared)
    /// list is returned.
    ///
    /// # Errors
    ///
    /// Returns the port error; the visible list is kept and the failure is
    /// recorded as [`last_error`](Self::last_error).
    pub async fn fetch(&self, matcher: &AliasMatcher) -> Result<Vec<RemoteItem>> {
        let epoch = lock(&self.state).epoch;
        let result = self.backend.fetch_remote_items().await;

        let mut state = lock(&self.state);
        if state.epoch != epoch {
            debug!("inbox cleared during fetch, dropping result");
            return Ok(state.items.clone());
        }
        let mut fetched = match result {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to fetch inbox: {e}");
                state.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        for item in &mut fetched {
            matcher.classify(item);
        }
        fetched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let read: HashSet<&str> = state
            .items
            .iter()
            .filter(|item| item.is_read)
            .map(|item| item.id.as_str())
            .collect();
        for item in &mut fetched {
            if read.contains(item.id.as_str()) {
                item.is_read = true;
            }
        }
        drop(read);

        debug!(
            count = fetched.len(),
            forwarded = fetched.iter().filter(|i| i.is_forwarded).count(),
            "inbox refreshed"
        );
        state.items = fetched;
        state.last_error = None;
        Ok(state.items.clone())
    }

    /// Mark an item read. Returns `false` for an unknown id.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let mut state = lock(&self.state);
        match state.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the visible list.
    #[must_use]
    pub fn items(&self) -> Vec<RemoteItem> {
        lock(&self.state).items.clone()
    }

    /// Number of unread items.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        lock(&self.state)
            .items
            .iter()
            .filter(|item| !item.is_read)
            .count()
    }

    /// Items forwarded from `address`, ignoring case.
    #[must_use]
    pub fn items_for_alias(&self, address: &str) -> Vec<RemoteItem> {
        lock(&self.state)
            .items
            .iter()
            .filter(|item| {
                item.original_sub_email
                    .as_deref()
                    .is_some_and(|alias| alias.eq_ignore_ascii_case(address))
            })
            .cloned()
            .collect()
    }

    /// Drop every item and the last error. Fetches already in flight are
    /// discarded when they complete.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        let epoch = state.epoch.wrapping_add(1);
        *state = InboxState {
            epoch,
            ..InboxState::default()
        };
    }

    /// Message of the last failed fetch, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }
}
