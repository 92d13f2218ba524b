//! Passive income arithmetic.
//!
//! The ledger's hourly step only credits whole elapsed hours at a flat rate.
//! Holdings-scaled rates and collection set bonuses are exposed as pure
//! helpers for display and for callers that want the NFT-weighted figure.

use crate::catalog::Catalog;
use crate::constants::{passive, timing};

/// Result of one accrual step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accrual {
    pub whole_hours: u64,
    pub tokens: f64,
}

/// Whole hours between two epoch-ms timestamps. A clock that went backwards
/// yields zero.
pub fn elapsed_whole_hours(last_update: u64, now: u64) -> u64 {
    now.saturating_sub(last_update) / timing::MS_PER_HOUR
}

/// Tokens owed for the whole hours since `last_update` at `rate_per_hour`.
/// The fractional remainder is not returned; callers that advance their
/// timestamp to `now` discard it.
pub fn passive_accrual(last_update: u64, now: u64, rate_per_hour: f64) -> Accrual {
    let whole_hours = elapsed_whole_hours(last_update, now);
    Accrual {
        whole_hours,
        tokens: whole_hours as f64 * rate_per_hour,
    }
}

/// When the next whole hour will have elapsed.
pub fn next_update_time(last_update: u64) -> u64 {
    last_update + timing::MS_PER_HOUR
}

/// Sum of the passive rates of all owned bodies. Unknown names contribute 0.
pub fn holdings_rate(catalog: &Catalog, owned: &[String]) -> f64 {
    owned
        .iter()
        .filter_map(|name| catalog.get(name))
        .map(|b| b.passive_income_rate)
        .sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetBonuses {
    pub inner_planets: f64,
    pub outer_planets: f64,
    pub all_planets: f64,
}

impl SetBonuses {
    pub fn total(&self) -> f64 {
        self.inner_planets + self.outer_planets + self.all_planets
    }
}

/// Collection bonuses for holding complete planet sets as NFTs.
pub fn set_bonuses(owned: &[String]) -> SetBonuses {
    let holds = |name: &&str| owned.iter().any(|o| o == name);
    let inner = passive::INNER_PLANETS.iter().all(holds);
    let outer = passive::OUTER_PLANETS.iter().all(holds);

    SetBonuses {
        inner_planets: if inner { passive::INNER_SET_BONUS } else { 0.0 },
        outer_planets: if outer { passive::OUTER_SET_BONUS } else { 0.0 },
        all_planets: if inner && outer {
            passive::ALL_PLANETS_BONUS
        } else {
            0.0
        },
    }
}
