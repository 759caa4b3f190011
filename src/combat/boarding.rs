//! Boarding actions and prize seizure

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::BoardingConfig;
use crate::unit::Unit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardingResult {
    pub crew_killed: u32,
    /// The defender's crew is gone and the ship can be taken
    pub defender_hulked: bool,
}

/// Attack bonus from the boarding party's embarked troops
pub fn attacker_bonus(attacker: &Unit, config: &BoardingConfig) -> u32 {
    let power = attacker.crew.as_ref().map(|c| c.embarked_power).unwrap_or(0.0);
    (power * config.attacker_power_scaling).max(0.0) as u32
}

/// Defense bonus from troops embarked on the defending ship
pub fn defender_bonus(defender: &Unit, config: &BoardingConfig) -> u32 {
    let power = defender.crew.as_ref().map(|c| c.embarked_power).unwrap_or(0.0);
    (power * config.defender_power_scaling).max(0.0) as u32
}

/// One boarding assault of `assault` strength against the defender's crew
///
/// Units without crew cannot be boarded and report nothing.
pub fn resolve_boarding(
    assault: u32,
    bonus_attack: u32,
    defender: &mut Unit,
    config: &BoardingConfig,
) -> BoardingResult {
    let bonus_defense = defender_bonus(defender, config);
    let Some(crew) = defender.crew.as_mut() else {
        return BoardingResult::default();
    };

    let crew_killed = crew.take_crew_damage(assault, bonus_attack, None, bonus_defense);
    BoardingResult {
        crew_killed,
        defender_hulked: crew.is_hulk(),
    }
}

/// Hand a unit to a new owner
///
/// The unit leaves its army (callers clear the roster handle), gets a prize
/// crew and is flagged so cleanup does not remove it this step.
pub fn seize(unit: &mut Unit, new_faction: &str, initial_crew: Option<u32>) {
    let previous = std::mem::replace(&mut unit.faction, new_faction.to_string());
    unit.army = None;
    if let Some(crew) = unit.crew.as_mut() {
        let prize = initial_crew.unwrap_or_else(|| crew.max_crew());
        crew.capture(prize);
    }
    unit.captured_this_step = true;
    unit.invalidate_strength();
    info!(unit = %unit.name, from = %previous, to = %new_faction, "Unit captured");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CrewComponent, HealthComponent};
    use crate::core::types::Domain;

    fn transport(crew: u32, embarked: f32) -> Unit {
        Unit::new("Transport", "Chaos", Domain::Space)
            .with_health(HealthComponent::new(300.0))
            .with_crew(CrewComponent::new(crew, 10).with_embarked_power(embarked))
    }

    #[test]
    fn test_defenders_fight_harder() {
        let config = BoardingConfig::default();
        let attacker = transport(100, 40.0);
        let defender = transport(100, 40.0);
        assert_eq!(attacker_bonus(&attacker, &config), 20);
        assert_eq!(defender_bonus(&defender, &config), 40);
    }

    #[test]
    fn test_boarding_until_hulk() {
        let config = BoardingConfig::default();
        let mut defender = transport(20, 0.0);
        let first = resolve_boarding(30, 0, &mut defender, &config);
        assert_eq!(first.crew_killed, 15);
        assert!(!first.defender_hulked);

        let second = resolve_boarding(30, 0, &mut defender, &config);
        assert_eq!(second.crew_killed, 5);
        assert!(second.defender_hulked);
    }

    #[test]
    fn test_oversized_assault_hulks_without_overflow() {
        let config = BoardingConfig::default();
        let attacker = transport(100, 100.0);
        let mut defender = transport(50, 100.0);

        let bonus = attacker_bonus(&attacker, &config);
        let result = resolve_boarding(u32::MAX, bonus, &mut defender, &config);

        assert_eq!(result.crew_killed, 50);
        assert!(result.defender_hulked);
    }

    #[test]
    fn test_seize_transfers_ownership() {
        let mut prize = transport(20, 0.0);
        if let Some(c) = prize.crew.as_mut() {
            c.take_crew_damage(1000, 0, None, 0);
        }
        prize.army = Some(crate::core::types::ArmyId::new());

        seize(&mut prize, "Imperium", Some(5));
        assert_eq!(prize.faction, "Imperium");
        assert!(prize.army.is_none());
        assert!(prize.captured_this_step);
        assert_eq!(prize.crew.as_ref().map(|c| c.current_crew), Some(5));
    }
}
