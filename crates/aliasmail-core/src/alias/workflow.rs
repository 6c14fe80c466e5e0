//! Alias creation.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{Alias, AliasRegistry, AliasStatus, AliasUpdate, validate_suffix};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::port::{LocalStore, MailBackend};

const ACTIVATION_SUBJECT: &str = "AliasMail alias activated";
const ACTIVATION_BODY: &str =
    "This address was created by AliasMail. Mail sent here arrives in your main inbox.";

/// Random 8-character lowercase hex suffix.
#[must_use]
pub fn random_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    suffix
}

/// Build the alias address for `account` and `suffix`: the suffix is
/// appended to the local-part. Returns `None` when `account` has no
/// local-part or domain.
#[must_use]
pub fn derive_address(account: &str, suffix: &str) -> Option<String> {
    let (local, domain) = account.trim().rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(format!("{local}{suffix}@{domain}"))
}

/// Creates aliases and activates them with a first message.
pub struct AliasCreator<P> {
    port: Arc<P>,
    registry: Arc<AliasRegistry<P>>,
    clock: Arc<dyn Clock>,
}

impl<P> AliasCreator<P>
where
    P: MailBackend + LocalStore,
{
    /// Create a workflow over `registry`, sending through `port`.
    pub fn new(port: Arc<P>, registry: Arc<AliasRegistry<P>>) -> Self {
        Self {
            port,
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for creation timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create the alias `account` + `suffix`.
    ///
    /// The alias is registered as `creating`, an activation message is sent
    /// to it, and it moves to `active`. If sending fails it moves to
    /// `failed` and the send error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the suffix or account is invalid, the address is
    /// already registered, the registry cannot persist, or activation fails.
    pub async fn create(&self, account: &str, suffix: &str) -> Result<Alias> {
        validate_suffix(suffix)?;
        let address = derive_address(account, suffix)
            .ok_or_else(|| Error::InvalidAddress(account.to_string()))?;

        self.registry
            .add(Alias::new(&address, suffix, self.clock.now_millis()))
            .await?;

        match self
            .port
            .send_remote_item(&address, ACTIVATION_SUBJECT, ACTIVATION_BODY)
            .await
        {
            Ok(()) => {
                let alias = self
                    .registry
                    .update(&address, AliasUpdate::status(AliasStatus::Active))
                    .await?;
                info!(%address, "alias activated");
                Ok(alias)
            }
            Err(e) => {
                warn!(%address, "alias activation failed: {e}");
                if let Err(update_err) = self
                    .registry
                    .update(&address, AliasUpdate::status(AliasStatus::Failed))
                    .await
                {
                    warn!(%address, "could not mark alias failed: {update_err}");
                }
                Err(e.into())
            }
        }
    }

    /// Create an alias with a [`random_suffix`].
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub async fn create_random(&self, account: &str) -> Result<Alias> {
        self.create(account, &random_suffix()).await
    }
}
