//! Battle scenarios loaded from TOML
//!
//! A scenario names the map size, the factions' deployments (unit snapshots
//! plus a tile), who defends, who is allied, faction stockpiles and
//! optionally its own ability table.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::abilities::{AbilityRegistry, RawAbility, Treasury};
use crate::battle::constants::{DEFAULT_BATTLE_HEIGHT, DEFAULT_BATTLE_WIDTH};
use crate::battle::execution::{BattleState, TimeModel};
use crate::battle::hostility::Alliances;
use crate::core::config::CombatConfig;
use crate::core::error::{ReckoningError, Result};
use crate::core::types::{AbilityId, GridPos};
use crate::spatial::TacticalGrid;
use crate::unit::{Roster, Unit, UnitSnapshot};

fn default_width() -> i32 {
    DEFAULT_BATTLE_WIDTH
}

fn default_height() -> i32 {
    DEFAULT_BATTLE_HEIGHT
}

fn one() -> u32 {
    1
}

/// One or more identical units dropped at a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(flatten)]
    pub unit: UnitSnapshot,
    pub x: i32,
    pub y: i32,
    /// Copies stacked down the y axis from `(x, y)`
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub army: Option<String>,
    /// Initial heading in degrees
    #[serde(default)]
    pub heading: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default)]
    pub time: TimeModel,
    #[serde(default)]
    pub defenders: Vec<String>,
    /// Pairs of factions that will not fire on each other
    #[serde(default)]
    pub allies: Vec<(String, String)>,
    /// Faction -> resource -> amount
    #[serde(default)]
    pub treasuries: BTreeMap<String, BTreeMap<String, f32>>,
    #[serde(default)]
    pub abilities: BTreeMap<AbilityId, RawAbility>,
    #[serde(default)]
    pub units: Vec<Deployment>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn factions(&self) -> BTreeSet<&str> {
        self.units.iter().map(|d| d.unit.faction.as_str()).collect()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ReckoningError::InvalidScenario(msg));

        if self.width <= 0 || self.height <= 0 {
            return invalid(format!("map must have a positive size, got {}x{}", self.width, self.height));
        }
        if let TimeModel::RealTime { dt } = self.time {
            if dt <= 0.0 {
                return invalid(format!("real-time step must be positive, got {dt}"));
            }
        }
        let factions = self.factions();
        if factions.len() < 2 {
            return invalid(format!("needs at least two factions, found {}", factions.len()));
        }
        for deployment in &self.units {
            let pos = GridPos::new(deployment.x, deployment.y);
            if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
                return invalid(format!(
                    "{} deployed off the map at ({}, {})",
                    deployment.unit.name, pos.x, pos.y
                ));
            }
            if deployment.count == 0 {
                return invalid(format!("{} deployed with count 0", deployment.unit.name));
            }
        }
        for defender in &self.defenders {
            if !factions.contains(defender.as_str()) {
                return invalid(format!("defender {defender} has no units"));
            }
        }
        Ok(())
    }

    /// Registry built from the scenario's own ability table
    pub fn registry(&self) -> AbilityRegistry {
        AbilityRegistry::from_raw(self.abilities.clone())
    }

    /// Fresh battle from this scenario, seeded with `seed`
    pub fn build(
        &self,
        registry: Arc<AbilityRegistry>,
        config: Arc<CombatConfig>,
        seed: u64,
    ) -> Result<BattleState> {
        self.validate()?;

        let mut roster = Roster::new();
        let mut armies = BTreeMap::new();
        for deployment in &self.units {
            for i in 0..deployment.count {
                let mut unit = Unit::from_snapshot(deployment.unit.clone())
                    .at(GridPos::new(deployment.x, deployment.y + i as i32));
                if deployment.count > 1 {
                    unit.name = format!("{} #{}", unit.name, i + 1);
                }
                if let (Some(heading), Some(movement)) = (deployment.heading, unit.movement.as_mut()) {
                    movement.heading_deg = heading.rem_euclid(360.0);
                }
                let faction = unit.faction.clone();
                let id = roster.insert(unit);

                if let Some(army) = &deployment.army {
                    let army_id = *armies
                        .entry((army.clone(), faction.clone()))
                        .or_insert_with(|| roster.create_army(army.clone(), faction));
                    roster.assign(id, army_id);
                }
            }
        }

        let mut alliances = Alliances::new();
        for (a, b) in &self.allies {
            alliances = alliances.ally(a, b);
        }

        let mut battle = BattleState::new(
            roster,
            TacticalGrid::new(self.width, self.height),
            registry,
            config,
            seed,
        )
        .with_time_model(self.time)
        .with_defenders(self.defenders.clone())
        .with_hostility(alliances);
        for (faction, balances) in &self.treasuries {
            battle = battle.with_treasury(faction.clone(), Treasury { balances: balances.clone() });
        }

        info!(scenario = %self.name, units = battle.roster.len(), seed, "Battle built");
        Ok(battle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIRMISH: &str = r#"
        name = "Vigil Reach"
        seed = 9
        width = 20
        height = 10
        defenders = ["Imperium"]
        allies = [["Imperium", "Mechanicus"]]

        [time]
        mode = "real_time"
        dt = 0.5

        [treasuries.Imperium]
        requisition = 100.0

        [abilities.smite]
        damage = 30

        [[units]]
        name = "Guardsman"
        faction = "Imperium"
        x = 1
        y = 1
        count = 3
        army = "Cadian 8th"
        health = { max_hp = 40.0, current_hp = 40.0 }

        [[units]]
        name = "Servitor"
        faction = "Mechanicus"
        x = 1
        y = 8
        health = { max_hp = 30.0, current_hp = 30.0 }

        [[units]]
        name = "Boy"
        faction = "Orks"
        x = 18
        y = 5
        health = { max_hp = 50.0, current_hp = 50.0 }
    "#;

    #[test]
    fn test_parse_and_build() {
        let scenario = Scenario::from_toml_str(SKIRMISH).unwrap();
        assert_eq!(scenario.time, TimeModel::RealTime { dt: 0.5 });
        assert_eq!(scenario.factions().len(), 3);

        let registry = Arc::new(scenario.registry());
        assert!(registry.get("smite").is_ok());

        let battle = scenario
            .build(registry, Arc::new(CombatConfig::default()), scenario.seed)
            .unwrap();
        assert_eq!(battle.roster.len(), 5);
        assert!(battle.unit_named("Guardsman #3").is_some());
        assert_eq!(battle.roster.armies().count(), 1);
        assert_eq!(battle.roster.armies().next().map(|a| a.members.len()), Some(3));
        assert_eq!(battle.defenders, vec!["Imperium".to_string()]);
        assert!(battle.treasuries.contains_key("Imperium"));
    }

    #[test]
    fn test_real_time_step_defaults() {
        let content = SKIRMISH.replace("dt = 0.5", "");
        let scenario = Scenario::from_toml_str(&content).unwrap();
        assert_eq!(scenario.time.step_seconds(), 0.1);
    }

    #[test]
    fn test_rejects_single_faction() {
        let content = r#"
            name = "Parade"
            [[units]]
            name = "Guardsman"
            faction = "Imperium"
            x = 0
            y = 0
        "#;
        assert!(matches!(
            Scenario::from_toml_str(content),
            Err(ReckoningError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_rejects_off_map_deployment() {
        let content = r#"
            name = "Overreach"
            width = 5
            height = 5
            [[units]]
            name = "Guardsman"
            faction = "Imperium"
            x = 0
            y = 0
            [[units]]
            name = "Boy"
            faction = "Orks"
            x = 7
            y = 0
        "#;
        assert!(matches!(
            Scenario::from_toml_str(content),
            Err(ReckoningError::InvalidScenario(msg)) if msg.contains("off the map")
        ));
    }
}
