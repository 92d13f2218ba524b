//! Immortality score and prestige tiers.
//!
//! The score is derived, never accumulated: recompute it from the discovery
//! count and login streak whenever either changes.

use serde::{Deserialize, Serialize};

use crate::constants::immortality::*;

pub fn score(discovered_count: usize, daily_login_streak: u32) -> u64 {
    (discovered_count as u64)
        .saturating_mul(DISCOVERY_WEIGHT)
        .saturating_add(u64::from(daily_login_streak).saturating_mul(STREAK_WEIGHT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImmortalityTier {
    Unranked,
    BurningSoul,
    StellarCollector,
    ImmortalCollector,
    CosmicDeity,
}

impl ImmortalityTier {
    pub fn from_score(score: u64) -> Self {
        match score {
            s if s >= COSMIC_DEITY => Self::CosmicDeity,
            s if s >= IMMORTAL_COLLECTOR => Self::ImmortalCollector,
            s if s >= STELLAR_COLLECTOR => Self::StellarCollector,
            s if s >= BURNING_SOUL => Self::BurningSoul,
            _ => Self::Unranked,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unranked => "Unranked",
            Self::BurningSoul => "Burning Soul",
            Self::StellarCollector => "Stellar Collector",
            Self::ImmortalCollector => "Immortal Collector",
            Self::CosmicDeity => "Cosmic Deity",
        }
    }
}
