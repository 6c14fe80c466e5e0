//! Alias registry.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::{Alias, AliasUpdate};
use crate::error::{Error, Result};
use crate::lock;
use crate::port::LocalStore;

/// Locally known aliases, backed by the store.
///
/// Every mutation persists the complete updated list first and only then
/// commits it in memory, so a failed write leaves the registry untouched.
/// Mutations are serialized; readers get snapshots and never wait on a
/// write in progress.
pub struct AliasRegistry<S> {
    store: Arc<S>,
    aliases: Mutex<Vec<Alias>>,
    writer: tokio::sync::Mutex<()>,
}

impl<S: LocalStore> AliasRegistry<S> {
    /// Create an empty registry. Call [`refresh`](Self::refresh) to load.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            aliases: Mutex::new(Vec::new()),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the in-memory list with the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read; memory is unchanged.
    pub async fn refresh(&self) -> Result<Vec<Alias>> {
        let _writer = self.writer.lock().await;
        let loaded = self.store.load_alias_list().await?;
        debug!(count = loaded.len(), "loaded aliases");
        lock(&self.aliases).clone_from(&loaded);
        Ok(loaded)
    }

    /// Register a new alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAlias`] if the address is already
    /// registered, or the store error if persisting fails.
    pub async fn add(&self, alias: Alias) -> Result<()> {
        let _writer = self.writer.lock().await;
        let mut next = self.list();
        if next.iter().any(|a| a.address == alias.address) {
            return Err(Error::DuplicateAlias(alias.address));
        }
        let address = alias.address.clone();
        next.push(alias);
        self.commit(next).await?;
        info!(%address, "alias added");
        Ok(())
    }

    /// Apply `update` to the alias at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AliasNotFound`] for an unknown address,
    /// [`Error::InvalidStatusTransition`] for an illegal status change, or
    /// the store error if persisting fails.
    pub async fn update(&self, address: &str, update: AliasUpdate) -> Result<Alias> {
        let _writer = self.writer.lock().await;
        let mut next = self.list();
        let alias = next
            .iter_mut()
            .find(|a| a.address == address)
            .ok_or_else(|| Error::AliasNotFound(address.to_string()))?;

        if let Some(status) = update.status
            && status != alias.status
        {
            if !alias.status.can_transition_to(status) {
                return Err(Error::InvalidStatusTransition {
                    from: alias.status,
                    to: status,
                });
            }
            alias.status = status;
        }
        if let Some(suffix) = update.suffix {
            alias.suffix = suffix;
        }
        let updated = alias.clone();

        self.commit(next).await?;
        debug!(%address, status = %updated.status, "alias updated");
        Ok(updated)
    }

    /// Remove the alias at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AliasNotFound`] for an unknown address, or the
    /// store error if persisting fails.
    pub async fn delete(&self, address: &str) -> Result<Alias> {
        let _writer = self.writer.lock().await;
        let mut next = self.list();
        let index = next
            .iter()
            .position(|a| a.address == address)
            .ok_or_else(|| Error::AliasNotFound(address.to_string()))?;
        let removed = next.remove(index);

        self.commit(next).await?;
        info!(%address, "alias deleted");
        Ok(removed)
    }

    /// Snapshot of every alias.
    #[must_use]
    pub fn list(&self) -> Vec<Alias> {
        lock(&self.aliases).clone()
    }

    /// Snapshot of the alias at `address`.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<Alias> {
        lock(&self.aliases)
            .iter()
            .find(|a| a.address == address)
            .cloned()
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.aliases).len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.aliases).is_empty()
    }

    async fn commit(&self, next: Vec<Alias>) -> Result<()> {
        self.store.persist_alias_list(&next).await?;
        *lock(&self.aliases) = next;
        Ok(())
    }
}
