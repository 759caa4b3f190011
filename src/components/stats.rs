use serde::{Deserialize, Serialize};

/// Raw close-combat profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsComponent {
    /// Melee attack, also drives ranged accuracy
    pub ma: f32,
    /// Melee defense
    pub md: f32,
    pub damage: f32,
    #[serde(default)]
    pub armor: f32,
    #[serde(default)]
    pub hp: f32,
    #[serde(default)]
    pub leadership: f32,
}

impl StatsComponent {
    pub fn new(ma: f32, md: f32, damage: f32) -> Self {
        Self {
            ma,
            md,
            damage,
            armor: 0.0,
            hp: 0.0,
            leadership: 0.0,
        }
    }

    /// Chance that a ranged volley connects, from melee attack
    pub fn accuracy(&self) -> f64 {
        (0.5 + f64::from(self.ma) / 200.0).clamp(0.05, 0.95)
    }

    /// Share of `damage` that lands against a defender
    pub fn melee_damage_against(&self, defender_md: f32) -> f32 {
        let total = self.ma + defender_md;
        if total <= 0.0 {
            return 0.0;
        }
        self.damage * self.ma / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melee_even_match_halves_damage() {
        let stats = StatsComponent::new(40.0, 30.0, 20.0);
        assert_eq!(stats.melee_damage_against(40.0), 10.0);
    }

    #[test]
    fn test_accuracy_bounds() {
        assert_eq!(StatsComponent::new(500.0, 0.0, 1.0).accuracy(), 0.95);
        assert_eq!(StatsComponent::new(0.0, 0.0, 1.0).accuracy(), 0.5);
    }
}
