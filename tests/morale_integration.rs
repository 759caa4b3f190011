//! Morale integration tests
//!
//! The state machine over many updates, and morale inside the battle loop.

use std::sync::Arc;

use void_reckoning::abilities::AbilityRegistry;
use void_reckoning::battle::{BattleState, CombatEvent};
use void_reckoning::combat::{update_morale, MoraleEnvironment};
use void_reckoning::components::{
    HealthComponent, MoraleComponent, MoraleState, WeaponComponent, WeaponStats,
};
use void_reckoning::core::types::{Domain, GridPos};
use void_reckoning::core::CombatConfig;
use void_reckoning::spatial::TacticalGrid;
use void_reckoning::unit::{Roster, Unit};

fn guardsmen(morale: f32, state: MoraleState) -> Unit {
    let mut comp = MoraleComponent::new(70.0, 100.0);
    comp.current_morale = morale;
    comp.state = state;
    Unit::new("Guardsmen", "Imperium", Domain::Ground)
        .with_health(HealthComponent::new(100.0))
        .with_morale(comp)
}

fn lasgun() -> WeaponComponent {
    WeaponComponent::new(
        "Lasgun",
        WeaponStats {
            range: 30.0,
            strength: 1.0,
            ap: 0,
            damage: 1.0,
            weapon_type: "energy".into(),
        },
        10.0,
    )
}

fn battle(units: Vec<Unit>) -> BattleState {
    let mut roster = Roster::new();
    for unit in units {
        roster.insert(unit);
    }
    BattleState::new(
        roster,
        TacticalGrid::new(20, 10),
        Arc::new(AbilityRegistry::default()),
        Arc::new(CombatConfig::default()),
        3,
    )
}

#[test]
fn test_sustained_fire_breaks_through_shaken() {
    let config = CombatConfig::default();
    let mut unit = guardsmen(100.0, MoraleState::Steady);
    let env = MoraleEnvironment::default();

    let mut transitions = Vec::new();
    for _ in 0..20 {
        if let Some(m) = unit.morale.as_mut() {
            m.record_damage(20.0);
        }
        if let Some(change) = update_morale(&mut unit, &env, &config, 1.0) {
            transitions.push(change);
        }
        if unit.morale.as_ref().is_some_and(|m| m.is_routing()) {
            break;
        }
    }

    assert_eq!(
        transitions,
        vec![
            (MoraleState::Steady, MoraleState::Shaken),
            (MoraleState::Shaken, MoraleState::Routing)
        ]
    );
}

#[test]
fn test_recovery_climbs_one_state_at_a_time() {
    let config = CombatConfig::default();
    let mut unit = guardsmen(0.0, MoraleState::Routing);
    let env = MoraleEnvironment {
        inspiring_allies: 2,
        nearby_allies: 10,
        ..Default::default()
    };

    let states: Vec<MoraleState> = (0..4)
        .map(|_| {
            update_morale(&mut unit, &env, &config, 1.0);
            unit.morale.as_ref().map(|m| m.state).unwrap_or_default()
        })
        .collect();

    // +21 per second: 21, 42 still routing; 63 past the rally bar; 84 steady
    assert_eq!(
        states,
        vec![
            MoraleState::Routing,
            MoraleState::Routing,
            MoraleState::Shaken,
            MoraleState::Steady
        ]
    );
}

#[test]
fn test_hysteresis_band_holds_state() {
    let config = CombatConfig::default();
    let env = MoraleEnvironment::default();

    // Between the shaken and steady bars each state keeps itself
    let mut steady = guardsmen(35.0, MoraleState::Steady);
    let mut shaken = guardsmen(35.0, MoraleState::Shaken);
    for _ in 0..5 {
        assert_eq!(update_morale(&mut steady, &env, &config, 1.0), None);
        assert_eq!(update_morale(&mut shaken, &env, &config, 1.0), None);
    }
}

#[test]
fn test_shot_unit_is_shaken_in_battle() {
    let mut state = battle(vec![
        guardsmen(31.0, MoraleState::Steady).at(GridPos::new(2, 5)),
        Unit::new("Shoota Boy", "Orks", Domain::Ground)
            .with_health(HealthComponent::new(100.0))
            .with_weapon(lasgun())
            .at(GridPos::new(10, 5)),
    ]);

    let events = state.run_round();

    assert!(events.events.iter().any(|e| matches!(
        e,
        CombatEvent::MoraleChanged {
            from: MoraleState::Steady,
            to: MoraleState::Shaken,
            ..
        }
    )));
    let morale = state.unit_named("Guardsmen").and_then(|u| u.morale.clone());
    assert_eq!(morale.map(|m| m.state), Some(MoraleState::Shaken));
}

#[test]
fn test_routing_unit_holds_fire() {
    let mut state = battle(vec![
        guardsmen(5.0, MoraleState::Routing)
            .with_weapon(lasgun())
            .at(GridPos::new(2, 5)),
        Unit::new("Nob", "Orks", Domain::Ground)
            .with_health(HealthComponent::new(1000.0))
            .at(GridPos::new(10, 5)),
    ]);

    let events = state.run_round();

    assert_eq!(events.damage_dealt(), 0.0);
    assert_eq!(state.unit_named("Nob").map(|u| u.hp_ratio()), Some(1.0));
}
