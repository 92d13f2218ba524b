//! Discovery records and rehydration-time validation.
//!
//! The persisted discovery list is untrusted: it may be missing, not an array,
//! contain duplicates, or be out of order after manual edits. Validation keeps
//! only the longest prefix that matches the catalog's discovery order. Entries
//! after the first gap are dropped even when they would be valid on their own.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Catalog;

/// A recorded, timestamped claim that a player found a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub planet_name: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub tokens_earned: f64,
    #[serde(default)]
    pub nft_minted: bool,
    #[serde(default)]
    pub nft_transaction_hash: Option<String>,
}

impl Discovery {
    pub fn new(planet_name: impl Into<String>, timestamp: u64, tokens_earned: f64) -> Self {
        Self {
            planet_name: planet_name.into(),
            timestamp,
            tokens_earned,
            nft_minted: false,
            nft_transaction_hash: None,
        }
    }
}

/// Validate a raw persisted discovery list.
///
/// 1. Non-array input is treated as empty.
/// 2. Entries that do not parse as a [`Discovery`] are skipped.
/// 3. Duplicates by `planet_name` are removed, keeping the first.
/// 4. Entries are kept while the n-th entry is the body with order n.
pub fn validate_discoveries(catalog: &Catalog, raw: &Value) -> Vec<Discovery> {
    let Some(items) = raw.as_array() else {
        if !raw.is_null() {
            log::warn!("Invalid discoveries data, resetting to empty list");
        }
        return Vec::new();
    };

    let parsed: Vec<Discovery> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();

    let valid = ordered_prefix(catalog, parsed);
    if valid.len() != items.len() {
        log::warn!(
            "Validated {} of {} discoveries in correct order",
            valid.len(),
            items.len()
        );
    }
    valid
}

/// Typed core of [`validate_discoveries`]: dedup, then keep the unbroken
/// order-respecting prefix. `tokens_earned` is reset to the catalog reward.
pub fn ordered_prefix(catalog: &Catalog, discoveries: Vec<Discovery>) -> Vec<Discovery> {
    let mut seen = HashSet::new();
    let deduped = discoveries
        .into_iter()
        .filter(|d| !d.planet_name.is_empty() && seen.insert(d.planet_name.clone()));

    let mut valid = Vec::new();
    for (i, mut discovery) in deduped.enumerate() {
        let Some(expected) = catalog.by_order(i as u32 + 1) else {
            break;
        };
        if expected.name != discovery.planet_name {
            break;
        }
        discovery.tokens_earned = expected.token_reward;
        valid.push(discovery);
    }
    valid
}
