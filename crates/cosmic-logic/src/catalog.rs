//! Static reference data: the celestial bodies and their fixed discovery order.
//!
//! A [`Catalog`] is immutable for a session. The ledger only needs two things
//! from it: lookup by name and iteration in discovery order. Orders are
//! contiguous and start at 1, so `by_order(n)` is an index lookup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyKind {
    Planet,
    DwarfPlanet,
    Asteroid,
}

/// One discoverable body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelestialBody {
    pub name: String,
    /// 1-based position in the global discovery chain.
    pub discovery_order: u32,
    pub token_reward: f64,
    pub kind: BodyKind,
    /// STAR per hour while the body is held as an NFT.
    pub passive_income_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("duplicate body name: {0}")]
    DuplicateName(String),
    #[error("discovery order gap at {name}: expected {expected}, found {found}")]
    OrderGap {
        name: String,
        expected: u32,
        found: u32,
    },
    #[error("negative token reward for {0}")]
    NegativeReward(String),
}

/// Ordered, validated list of celestial bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    bodies: Vec<CelestialBody>,
}

// (name, kind, token reward, passive income rate)
const SOLAR_SYSTEM: &[(&str, BodyKind, f64, f64)] = &[
    ("Mercury", BodyKind::Planet, 10.0, 0.5),
    ("Venus", BodyKind::Planet, 15.0, 0.5),
    ("Earth", BodyKind::Planet, 20.0, 0.5),
    ("Mars", BodyKind::Planet, 25.0, 0.5),
    ("Jupiter", BodyKind::Planet, 50.0, 0.5),
    ("Saturn", BodyKind::Planet, 75.0, 0.5),
    ("Uranus", BodyKind::Planet, 100.0, 0.5),
    ("Neptune", BodyKind::Planet, 150.0, 0.5),
    ("Pluto", BodyKind::DwarfPlanet, 200.0, 0.75),
    ("Ceres", BodyKind::DwarfPlanet, 180.0, 0.75),
    ("Eris", BodyKind::DwarfPlanet, 220.0, 0.75),
    ("Haumea", BodyKind::DwarfPlanet, 210.0, 0.75),
    ("Makemake", BodyKind::DwarfPlanet, 215.0, 0.75),
    ("Gonggong", BodyKind::DwarfPlanet, 190.0, 0.7),
    ("Orcus", BodyKind::DwarfPlanet, 185.0, 0.7),
    ("Vesta", BodyKind::Asteroid, 5.0, 0.1),
    ("Pallas", BodyKind::Asteroid, 5.0, 0.1),
    ("Juno", BodyKind::Asteroid, 8.0, 0.15),
    ("Hygiea", BodyKind::Asteroid, 8.0, 0.15),
    ("Astraea", BodyKind::Asteroid, 8.0, 0.15),
    ("Apophis", BodyKind::Asteroid, 12.0, 0.2),
    ("Bennu", BodyKind::Asteroid, 12.0, 0.2),
    ("Itokawa", BodyKind::Asteroid, 12.0, 0.2),
    ("Eros", BodyKind::Asteroid, 18.0, 0.3),
    ("Psyche", BodyKind::Asteroid, 18.0, 0.3),
    ("Varda", BodyKind::Asteroid, 18.0, 0.3),
    ("Oumuamua", BodyKind::Asteroid, 35.0, 0.5),
    ("Comet Halley (Core)", BodyKind::Asteroid, 35.0, 0.5),
    ("Chiron", BodyKind::Asteroid, 35.0, 0.5),
];

/// Number of bodies in [`Catalog::solar_system`].
pub const SOLAR_SYSTEM_SIZE: usize = SOLAR_SYSTEM.len();

impl Catalog {
    /// Build a catalog, sorting by `discovery_order` and checking that orders
    /// run 1..=n without gaps and that names are unique.
    pub fn new(mut bodies: Vec<CelestialBody>) -> Result<Self, CatalogError> {
        if bodies.is_empty() {
            return Err(CatalogError::Empty);
        }
        bodies.sort_by_key(|b| b.discovery_order);

        let mut seen = std::collections::HashSet::new();
        for (i, body) in bodies.iter().enumerate() {
            let expected = i as u32 + 1;
            if body.discovery_order != expected {
                return Err(CatalogError::OrderGap {
                    name: body.name.clone(),
                    expected,
                    found: body.discovery_order,
                });
            }
            if !seen.insert(body.name.as_str()) {
                return Err(CatalogError::DuplicateName(body.name.clone()));
            }
            if body.token_reward < 0.0 {
                return Err(CatalogError::NegativeReward(body.name.clone()));
            }
        }
        Ok(Self { bodies })
    }

    /// The solar system shipped with the game: eight planets, seven dwarf
    /// planets, then the minor bodies.
    pub fn solar_system() -> Self {
        Self {
            bodies: solar_system_bodies(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Body at a 1-based discovery position.
    pub fn by_order(&self, order: u32) -> Option<&CelestialBody> {
        order
            .checked_sub(1)
            .and_then(|idx| self.bodies.get(idx as usize))
    }

    /// The body that follows `discovered_count` discoveries, if any remain.
    pub fn next_undiscovered(&self, discovered_count: usize) -> Option<&CelestialBody> {
        self.bodies.get(discovered_count)
    }

    /// Bodies in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &CelestialBody> {
        self.bodies.iter()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn count_of(&self, kind: BodyKind) -> usize {
        self.bodies.iter().filter(|b| b.kind == kind).count()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::solar_system()
    }
}

fn solar_system_bodies() -> Vec<CelestialBody> {
    SOLAR_SYSTEM
        .iter()
        .enumerate()
        .map(|(i, &(name, kind, reward, rate))| CelestialBody {
            name: name.to_string(),
            discovery_order: i as u32 + 1,
            token_reward: reward,
            kind,
            passive_income_rate: rate,
        })
        .collect()
}
