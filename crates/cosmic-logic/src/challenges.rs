//! Discovery-count challenges.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Challenge {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub required_discoveries: usize,
    /// Paid into bonus tokens on completion.
    pub reward: f64,
}

pub static CHALLENGES: [Challenge; 3] = [
    Challenge {
        id: "discover-mercury",
        title: "First Light",
        description: "Discover Mercury",
        required_discoveries: 1,
        reward: 10.0,
    },
    Challenge {
        id: "discover-three-planets",
        title: "Space Explorer",
        description: "Discover 3 planets",
        required_discoveries: 3,
        reward: 25.0,
    },
    Challenge {
        id: "discover-all-planets",
        title: "Solar Master",
        description: "Discover all 8 planets",
        required_discoveries: 8,
        reward: 100.0,
    },
];

pub fn find(id: &str) -> Option<&'static Challenge> {
    CHALLENGES.iter().find(|c| c.id == id)
}

impl Challenge {
    pub fn is_eligible(&self, discovered_count: usize) -> bool {
        discovered_count >= self.required_discoveries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find("discover-mercury").unwrap().reward, 10.0);
        assert!(find("discover-pluto").is_none());
    }

    #[test]
    fn test_eligibility() {
        let c = find("discover-three-planets").unwrap();
        assert!(!c.is_eligible(2));
        assert!(c.is_eligible(3));
    }
}
