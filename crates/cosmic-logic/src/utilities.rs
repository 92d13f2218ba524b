//! Cosmic utilities purchasable by burning STAR.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Utility {
    CosmicBoost,
    VoidJump,
    CelestialShield,
    AsteroidMining,
    DwarfPlanetUnlock,
    SupernovaMode,
    WormholeMode,
    CosmicForgeMode,
}

impl Utility {
    pub const ALL: [Utility; 8] = [
        Utility::CosmicBoost,
        Utility::VoidJump,
        Utility::CelestialShield,
        Utility::AsteroidMining,
        Utility::DwarfPlanetUnlock,
        Utility::SupernovaMode,
        Utility::WormholeMode,
        Utility::CosmicForgeMode,
    ];

    /// Burn cost in STAR.
    pub fn cost(self) -> f64 {
        match self {
            Utility::CosmicBoost => 25.0,
            Utility::VoidJump => 50.0,
            Utility::CelestialShield => 30.0,
            Utility::AsteroidMining => 40.0,
            Utility::DwarfPlanetUnlock => 200.0,
            Utility::SupernovaMode => 75.0,
            Utility::WormholeMode => 100.0,
            Utility::CosmicForgeMode => 150.0,
        }
    }

    /// Effect duration in hours.
    pub fn duration_hours(self) -> u32 {
        match self {
            Utility::CosmicBoost | Utility::CelestialShield => 24,
            _ => 1,
        }
    }

    /// Identifier sent to the balance authority.
    pub fn wire_id(self) -> &'static str {
        match self {
            Utility::CosmicBoost => "cosmicBoost",
            Utility::VoidJump => "voidJump",
            Utility::CelestialShield => "celestialShield",
            Utility::AsteroidMining => "asteroidMining",
            Utility::DwarfPlanetUnlock => "dwarfPlanetUnlock",
            Utility::SupernovaMode => "supernovaMode",
            Utility::WormholeMode => "wormholeMode",
            Utility::CosmicForgeMode => "cosmicForgeMode",
        }
    }

    pub fn from_wire_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.wire_id() == id)
    }

    pub fn effect(self) -> &'static str {
        match self {
            Utility::CosmicBoost => "2x token rewards for 24 hours",
            Utility::VoidJump => "Instantly jump to next planet",
            Utility::CelestialShield => "Protect your tokens from loss",
            Utility::AsteroidMining => "Mine bonus tokens from asteroids",
            Utility::DwarfPlanetUnlock => "Unlock Pluto as a dwarf planet NFT",
            Utility::SupernovaMode => "3x token multiplier for 1 hour",
            Utility::WormholeMode => "Skip to any discovered planet",
            Utility::CosmicForgeMode => "Create custom planet NFTs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_ids_match_serde() {
        for u in Utility::ALL {
            let json = serde_json::to_string(&u).unwrap();
            assert_eq!(json, format!("\"{}\"", u.wire_id()));
            assert_eq!(Utility::from_wire_id(u.wire_id()), Some(u));
        }
    }

    #[test]
    fn test_costs() {
        assert_eq!(Utility::DwarfPlanetUnlock.cost(), 200.0);
        assert_eq!(Utility::CosmicBoost.duration_hours(), 24);
        assert!(Utility::from_wire_id("timeTravel").is_none());
    }
}
