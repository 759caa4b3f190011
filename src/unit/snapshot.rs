//! Persisted unit records
//!
//! One flat record per component type. Ids, positions and transient battle
//! state are not persisted; a restored unit gets a fresh id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{
    ArmorComponent, CrewComponent, HealthComponent, MoraleComponent, MovementComponent,
    StatsComponent, TraitSet, WeaponComponent,
};
use crate::core::error::Result;
use crate::core::types::Domain;
use crate::unit::entity::Unit;
use crate::unit::progression::Progression;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub name: String,
    pub faction: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub health: Option<HealthComponent>,
    #[serde(default)]
    pub armor: Option<ArmorComponent>,
    #[serde(default)]
    pub weapons: Vec<WeaponComponent>,
    #[serde(default)]
    pub morale: Option<MoraleComponent>,
    #[serde(default)]
    pub crew: Option<CrewComponent>,
    #[serde(default)]
    pub movement: Option<MovementComponent>,
    #[serde(default)]
    pub stats: Option<StatsComponent>,
    #[serde(default)]
    pub traits: TraitSet,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub experience: f32,
    #[serde(default)]
    pub resources: BTreeMap<String, f32>,
    #[serde(default)]
    pub power_rating: Option<f32>,
    #[serde(default)]
    pub cost: f32,
}

fn first_level() -> u32 {
    1
}

impl Unit {
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            name: self.name.clone(),
            faction: self.faction.clone(),
            domain: self.domain,
            class: self.class.clone(),
            health: self.health.clone(),
            armor: self.armor.clone(),
            weapons: self.weapons.clone(),
            morale: self.morale.clone(),
            crew: self.crew.clone(),
            movement: self.movement.clone(),
            stats: self.stats.clone(),
            traits: self.traits.clone(),
            level: self.progression.level,
            experience: self.progression.experience,
            resources: self.resources.clone(),
            power_rating: self.power_rating,
            cost: self.cost,
        }
    }

    pub fn from_snapshot(snapshot: UnitSnapshot) -> Self {
        let mut unit = Unit::new(snapshot.name, snapshot.faction, snapshot.domain)
            .with_class(snapshot.class)
            .with_traits(snapshot.traits)
            .with_cost(snapshot.cost);
        unit.health = snapshot.health;
        unit.armor = snapshot.armor;
        unit.weapons = snapshot.weapons;
        unit.morale = snapshot.morale;
        unit.crew = snapshot.crew;
        unit.movement = snapshot.movement;
        unit.stats = snapshot.stats;
        unit.resources = snapshot.resources;
        unit.power_rating = snapshot.power_rating;
        unit.progression = Progression {
            level: snapshot.level.max(1),
            experience: snapshot.experience,
            leveling: false,
        };
        unit
    }
}

impl UnitSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::WeaponStats;
    use crate::core::types::Facing;

    #[test]
    fn test_snapshot_json_keeps_components() {
        let unit = Unit::new("Hammer of Dawn", "Imperium", Domain::Space)
            .with_health(HealthComponent::new(800.0).with_shield(200.0))
            .with_armor(ArmorComponent::new(30).with_facing(Facing::Rear, -10))
            .with_weapon(WeaponComponent::new(
                "Macro Battery",
                WeaponStats {
                    range: 10.0,
                    strength: 3.0,
                    ap: 1,
                    damage: 2.0,
                    weapon_type: "kinetic".into(),
                },
                60.0,
            ))
            .with_crew(CrewComponent::new(500, 8));

        let json = unit.snapshot().to_json().unwrap();
        assert!(json.contains("\"health\""));
        assert!(json.contains("\"crew\""));

        let restored = Unit::from_snapshot(UnitSnapshot::from_json(&json).unwrap());
        assert_eq!(restored.name, unit.name);
        assert_eq!(restored.armor, unit.armor);
        assert_eq!(restored.weapons.len(), 1);
        assert_ne!(restored.id, unit.id);
    }

    #[test]
    fn test_minimal_record() {
        let snapshot = UnitSnapshot::from_json(r#"{"name": "Scout", "faction": "Eldar"}"#).unwrap();
        let unit = Unit::from_snapshot(snapshot);
        assert_eq!(unit.domain, Domain::Ground);
        assert_eq!(unit.progression.level, 1);
        assert!(unit.health.is_none());
    }
}
