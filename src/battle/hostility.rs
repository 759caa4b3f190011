//! Who may shoot whom
//!
//! Diplomacy lives outside the combat core. The loop only asks whether two
//! factions are at war.

use std::collections::BTreeSet;

pub trait Hostility {
    fn at_war(&self, a: &str, b: &str) -> bool;
}

/// Every pair of distinct factions is hostile
#[derive(Debug, Clone, Copy, Default)]
pub struct AllAtWar;

impl Hostility for AllAtWar {
    fn at_war(&self, a: &str, b: &str) -> bool {
        a != b
    }
}

/// Distinct factions are hostile unless listed as allied
#[derive(Debug, Clone, Default)]
pub struct Alliances {
    pairs: BTreeSet<(String, String)>,
}

impl Alliances {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn ally(mut self, a: &str, b: &str) -> Self {
        self.pairs.insert(Self::key(a, b));
        self
    }

    pub fn are_allied(&self, a: &str, b: &str) -> bool {
        a == b || self.pairs.contains(&Self::key(a, b))
    }
}

impl Hostility for Alliances {
    fn at_war(&self, a: &str, b: &str) -> bool {
        !self.are_allied(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_at_war() {
        assert!(AllAtWar.at_war("Imperium", "Orks"));
        assert!(!AllAtWar.at_war("Orks", "Orks"));
    }

    #[test]
    fn test_alliance_is_symmetric() {
        let alliances = Alliances::new().ally("Imperium", "Eldar");
        assert!(!alliances.at_war("Eldar", "Imperium"));
        assert!(alliances.at_war("Eldar", "Orks"));
    }
}
