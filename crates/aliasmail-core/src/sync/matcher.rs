//! Alias matching for fetched items.

use super::RemoteItem;
use crate::alias::Alias;

/// Whether `address` looks like an alias of `base`: same domain, and a
/// local-part that extends the base local-part. Case-insensitive.
///
/// Total: malformed input yields `false`.
#[must_use]
pub fn is_alias_of(address: &str, base: &str) -> bool {
    let (Some((local, domain)), Some((base_local, base_domain))) =
        (split_address(address), split_address(base))
    else {
        return false;
    };

    domain.eq_ignore_ascii_case(base_domain)
        && local.len() > base_local.len()
        && local
            .get(..base_local.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(base_local))
}

fn split_address(address: &str) -> Option<(&str, &str)> {
    let (local, domain) = address.trim().rsplit_once('@')?;
    (!local.is_empty() && !domain.is_empty()).then_some((local, domain))
}

/// Pull bare addresses out of a raw address header.
///
/// Handles comma-separated lists and `"Display Name" <addr>` entries;
/// commas inside quotes or angle brackets do not split.
#[must_use]
pub fn extract_addresses(raw: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;
    for (i, c) in raw.char_indices() {
        match c {
            '"' if !in_angle => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                entries.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&raw[start..]);

    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.trim();
            let address = match (entry.rfind('<'), entry.rfind('>')) {
                (Some(open), Some(close)) if open < close => &entry[open + 1..close],
                _ => entry,
            };
            let address = address.trim();
            (!address.is_empty()).then(|| address.to_string())
        })
        .collect()
}

/// Decides which fetched items were addressed to an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasMatcher {
    /// Only registered aliases count.
    Registry(Vec<Alias>),
    /// Any address that extends the account's local-part counts.
    Inferred {
        /// The authenticated account.
        account: String,
    },
}

impl AliasMatcher {
    /// The alias a raw destination header was addressed to, if any.
    ///
    /// Registry mode reports the registered spelling of the address.
    #[must_use]
    pub fn match_destination(&self, to: &str) -> Option<String> {
        let addresses = extract_addresses(to);
        match self {
            Self::Registry(aliases) => addresses.iter().find_map(|address| {
                aliases
                    .iter()
                    .find(|alias| alias.matches_address(address))
                    .map(|alias| alias.address.clone())
            }),
            Self::Inferred { account } => addresses
                .into_iter()
                .find(|address| is_alias_of(address, account)),
        }
    }

    /// Set the forwarded flag and alias of `item`.
    pub fn classify(&self, item: &mut RemoteItem) {
        let alias = self.match_destination(&item.to);
        item.is_forwarded = alias.is_some();
        item.original_sub_email = alias;
    }
}
