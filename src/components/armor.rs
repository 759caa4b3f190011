use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::Facing;

/// Base armor plus per-facing adjustments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmorComponent {
    pub base_armor: i32,
    #[serde(default)]
    pub facing_modifiers: BTreeMap<Facing, i32>,
}

impl ArmorComponent {
    pub fn new(base_armor: i32) -> Self {
        Self {
            base_armor,
            facing_modifiers: BTreeMap::new(),
        }
    }

    pub fn with_facing(mut self, facing: Facing, modifier: i32) -> Self {
        self.facing_modifiers.insert(facing, modifier);
        self
    }

    /// `max(0, base + modifier[facing])`
    pub fn effective_armor(&self, facing: Facing) -> i32 {
        let modifier = self.facing_modifiers.get(&facing).copied().unwrap_or(0);
        (self.base_armor + modifier).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rear_armor_thinner() {
        let armor = ArmorComponent::new(20)
            .with_facing(Facing::Front, 10)
            .with_facing(Facing::Rear, -15);
        assert_eq!(armor.effective_armor(Facing::Front), 30);
        assert_eq!(armor.effective_armor(Facing::Side), 20);
        assert_eq!(armor.effective_armor(Facing::Rear), 5);
    }

    #[test]
    fn test_effective_armor_never_negative() {
        let armor = ArmorComponent::new(5).with_facing(Facing::Ventral, -40);
        assert_eq!(armor.effective_armor(Facing::Ventral), 0);
    }
}
