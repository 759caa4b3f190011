//! Duration-bounded stat multipliers and flags

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::AbilityId;

pub const DAMAGE_MULT: &str = "damage_mult";
pub const DEFENSE_MULT: &str = "defense_mult";
pub const ARMOR_MULT: &str = "armor_mult";
pub const SPEED_MULT: &str = "speed_mult";
pub const MOVEMENT_SPEED_MULT: &str = "movement_speed_mult";
pub const ABILITY_POWER_MULT: &str = "ability_power_mult";
pub const IMPACT_DAMAGE_MULT: &str = "impact_damage_mult";
pub const FLANK_IMMUNITY: &str = "flank_immunity";
pub const STUNNED: &str = "stunned";

/// Named effect values; multipliers multiply, flags are set when non-zero
pub type EffectSet = BTreeMap<String, f32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempModifier {
    pub source: AbilityId,
    pub effects: EffectSet,
    /// Seconds left
    pub remaining: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempModifiers {
    pub active: Vec<TempModifier>,
}

impl TempModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or refresh the modifier granted by `source`
    pub fn apply(&mut self, source: &str, effects: EffectSet, duration: f32) {
        self.active.retain(|m| m.source != source);
        self.active.push(TempModifier {
            source: source.to_string(),
            effects,
            remaining: duration,
        });
    }

    /// Product of every active value for `key`, 1.0 when none
    pub fn mult(&self, key: &str) -> f32 {
        self.active
            .iter()
            .filter_map(|m| m.effects.get(key))
            .product()
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.active
            .iter()
            .any(|m| m.effects.get(key).is_some_and(|v| *v != 0.0))
    }

    /// Count down and drop what expired, returning the expired sources
    pub fn tick(&mut self, dt: f32) -> Vec<AbilityId> {
        let mut expired = Vec::new();
        for m in &mut self.active {
            m.remaining -= dt;
            if m.remaining <= 0.0 {
                expired.push(m.source.clone());
            }
        }
        self.active.retain(|m| m.remaining > 0.0);
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effects(pairs: &[(&str, f32)]) -> EffectSet {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_multipliers_stack() {
        let mut mods = TempModifiers::new();
        mods.apply("war_cry", effects(&[(DAMAGE_MULT, 1.5)]), 3.0);
        mods.apply("overcharge", effects(&[(DAMAGE_MULT, 2.0)]), 3.0);
        assert_eq!(mods.mult(DAMAGE_MULT), 3.0);
        assert_eq!(mods.mult(SPEED_MULT), 1.0);
    }

    #[test]
    fn test_reapply_refreshes() {
        let mut mods = TempModifiers::new();
        mods.apply("war_cry", effects(&[(DAMAGE_MULT, 1.5)]), 1.0);
        mods.apply("war_cry", effects(&[(DAMAGE_MULT, 1.5)]), 5.0);
        assert_eq!(mods.active.len(), 1);
        assert_eq!(mods.active[0].remaining, 5.0);
    }

    #[test]
    fn test_expiry() {
        let mut mods = TempModifiers::new();
        mods.apply("guard", effects(&[(FLANK_IMMUNITY, 1.0)]), 2.0);
        assert!(mods.has_flag(FLANK_IMMUNITY));
        assert!(mods.tick(1.0).is_empty());
        assert_eq!(mods.tick(1.0), vec!["guard".to_string()]);
        assert!(!mods.has_flag(FLANK_IMMUNITY));
    }
}
