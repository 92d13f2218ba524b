//! Achievement table and milestone queries.

use crate::catalog::SOLAR_SYSTEM_SIZE;
use crate::immortality::ImmortalityTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementCategory {
    Discovery,
    Earning,
    Burning,
    Prestige,
    Collection,
}

/// Aggregate player figures the achievement conditions read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    pub total_discovered: usize,
    pub total_nfts_minted: u32,
    pub total_star_earned: f64,
    pub total_star_burned: f64,
    pub max_login_streak: u32,
    pub immortality_score: u64,
    pub referral_count: u32,
}

pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub condition: fn(&PlayerStats) -> bool,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement").field("id", &self.id).finish()
    }
}

fn tier(stats: &PlayerStats) -> ImmortalityTier {
    ImmortalityTier::from_score(stats.immortality_score)
}

pub static ACHIEVEMENTS: &[Achievement] = &[
    // Discovery
    Achievement {
        id: "first_planet",
        name: "Cosmic Explorer",
        description: "Discover your first planet",
        category: AchievementCategory::Discovery,
        condition: |s| s.total_discovered >= 1,
    },
    Achievement {
        id: "inner_planets",
        name: "Inner System Master",
        description: "Discover all 4 inner planets",
        category: AchievementCategory::Discovery,
        condition: |s| s.total_discovered >= 4,
    },
    Achievement {
        id: "all_main_planets",
        name: "Solar System Navigator",
        description: "Discover all 8 main planets",
        category: AchievementCategory::Discovery,
        condition: |s| s.total_discovered >= 8,
    },
    Achievement {
        id: "dwarf_planet_hunter",
        name: "Dwarf Planet Hunter",
        description: "Discover all 7 dwarf planets",
        category: AchievementCategory::Discovery,
        condition: |s| s.total_discovered >= 15,
    },
    Achievement {
        id: "complete_celestial",
        name: "Complete Celestial Master",
        description: "Discover every celestial object",
        category: AchievementCategory::Discovery,
        condition: |s| s.total_discovered >= SOLAR_SYSTEM_SIZE,
    },
    // Collection
    Achievement {
        id: "first_nft",
        name: "NFT Collector",
        description: "Mint your first planet NFT",
        category: AchievementCategory::Collection,
        condition: |s| s.total_nfts_minted >= 1,
    },
    Achievement {
        id: "planet_collection",
        name: "Planetary Collector",
        description: "Own 8 planet NFTs",
        category: AchievementCategory::Collection,
        condition: |s| s.total_nfts_minted >= 8,
    },
    Achievement {
        id: "elite_collection",
        name: "Elite Collector",
        description: "Own 20 NFTs across planets and dwarfs",
        category: AchievementCategory::Collection,
        condition: |s| s.total_nfts_minted >= 20,
    },
    // Earning
    Achievement {
        id: "first_passive",
        name: "Passive Income Earner",
        description: "Earn your first STAR",
        category: AchievementCategory::Earning,
        condition: |s| s.total_star_earned >= 1.0,
    },
    Achievement {
        id: "thousand_star",
        name: "Thousand STAR Club",
        description: "Earn 1,000 STAR tokens",
        category: AchievementCategory::Earning,
        condition: |s| s.total_star_earned >= 1_000.0,
    },
    Achievement {
        id: "hundred_thousand_star",
        name: "Hundred Thousand Star Club",
        description: "Earn 100,000 STAR tokens",
        category: AchievementCategory::Earning,
        condition: |s| s.total_star_earned >= 100_000.0,
    },
    Achievement {
        id: "daily_login_week",
        name: "Dedicated Player",
        description: "Maintain a 7-day daily login streak",
        category: AchievementCategory::Earning,
        condition: |s| s.max_login_streak >= 7,
    },
    // Burning
    Achievement {
        id: "first_burn",
        name: "Token Burner",
        description: "Burn your first STAR token",
        category: AchievementCategory::Burning,
        condition: |s| s.total_star_burned >= 1.0,
    },
    Achievement {
        id: "refinement_collector",
        name: "Refinement Master",
        description: "Burn 500 STAR",
        category: AchievementCategory::Burning,
        condition: |s| s.total_star_burned >= 500.0,
    },
    Achievement {
        id: "utility_power",
        name: "Cosmic Utility Master",
        description: "Burn 2,000 STAR on cosmic utilities",
        category: AchievementCategory::Burning,
        condition: |s| s.total_star_burned >= 2_000.0,
    },
    // Prestige: exactly one tier matches at a time
    Achievement {
        id: "burning_soul",
        name: "Burning Soul",
        description: "Reach the Burning Soul immortality tier",
        category: AchievementCategory::Prestige,
        condition: |s| tier(s) == ImmortalityTier::BurningSoul,
    },
    Achievement {
        id: "stellar_collector",
        name: "Stellar Collector",
        description: "Reach the Stellar Collector immortality tier",
        category: AchievementCategory::Prestige,
        condition: |s| tier(s) == ImmortalityTier::StellarCollector,
    },
    Achievement {
        id: "immortal_collector",
        name: "Immortal Collector",
        description: "Reach Immortal Collector status",
        category: AchievementCategory::Prestige,
        condition: |s| tier(s) == ImmortalityTier::ImmortalCollector,
    },
    Achievement {
        id: "cosmic_deity",
        name: "Cosmic Deity",
        description: "Reach the Cosmic Deity tier",
        category: AchievementCategory::Prestige,
        condition: |s| tier(s) == ImmortalityTier::CosmicDeity,
    },
];

pub fn unlocked(stats: &PlayerStats) -> Vec<&'static Achievement> {
    ACHIEVEMENTS.iter().filter(|a| (a.condition)(stats)).collect()
}

/// Achievements not yet unlocked, optionally limited to one category.
pub fn next(stats: &PlayerStats, category: Option<AchievementCategory>) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !(a.condition)(stats))
        .filter(|a| category.map_or(true, |c| a.category == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&Achievement]) -> Vec<&'static str> {
        list.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_fresh_player_unlocks_nothing() {
        assert!(unlocked(&PlayerStats::default()).is_empty());
    }

    #[test]
    fn test_discovery_milestones() {
        let stats = PlayerStats {
            total_discovered: 4,
            ..Default::default()
        };
        assert_eq!(ids(&unlocked(&stats)), vec!["first_planet", "inner_planets"]);
        let pending = next(&stats, Some(AchievementCategory::Discovery));
        assert_eq!(pending[0].id, "all_main_planets");
        assert_eq!(pending.len(), 3);
    }

    #[test]
    fn test_prestige_is_exclusive() {
        let stats = PlayerStats {
            immortality_score: 3_000,
            ..Default::default()
        };
        let prestige: Vec<_> = unlocked(&stats)
            .into_iter()
            .filter(|a| a.category == AchievementCategory::Prestige)
            .collect();
        assert_eq!(ids(&prestige), vec!["stellar_collector"]);
    }

    #[test]
    fn test_completion_needs_every_body() {
        let mut stats = PlayerStats {
            total_discovered: SOLAR_SYSTEM_SIZE - 1,
            ..Default::default()
        };
        assert!(!ids(&unlocked(&stats)).contains(&"complete_celestial"));
        stats.total_discovered = SOLAR_SYSTEM_SIZE;
        assert!(ids(&unlocked(&stats)).contains(&"complete_celestial"));
    }
}
