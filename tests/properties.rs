//! Property tests for the combat rules

use proptest::prelude::*;

use void_reckoning::combat::{mitigate, next_state, resolve_damage, update_morale, DamageRequest, MoraleEnvironment};
use void_reckoning::components::{
    ArmorComponent, CrewComponent, HealthComponent, MoraleComponent, MoraleState,
};
use void_reckoning::core::config::MoraleConfig;
use void_reckoning::core::types::{Domain, Facing};
use void_reckoning::core::CombatConfig;
use void_reckoning::unit::Unit;

fn facing() -> impl Strategy<Value = Facing> {
    prop_oneof![
        Just(Facing::Front),
        Just(Facing::Side),
        Just(Facing::Rear),
    ]
}

fn morale_state() -> impl Strategy<Value = MoraleState> {
    prop_oneof![
        Just(MoraleState::Steady),
        Just(MoraleState::Shaken),
        Just(MoraleState::Routing),
    ]
}

proptest! {
    #[test]
    fn test_damage_never_exceeds_request(
        amount in 0.0f32..500.0,
        armor in 0i32..100,
        shield in 0.0f32..200.0,
        hp in 1.0f32..1000.0,
        facing in facing(),
    ) {
        let config = CombatConfig::default();
        let mut unit = Unit::new("Target", "Orks", Domain::Space)
            .with_health(HealthComponent::new(hp).with_shield(shield))
            .with_armor(ArmorComponent::new(armor));

        let report = resolve_damage(&mut unit, &DamageRequest::new(amount, facing), &config);

        prop_assert!(report.shield_damage >= 0.0);
        prop_assert!(report.hull_damage >= 0.0);
        prop_assert!(report.total() <= amount + 1e-3);
        prop_assert!(report.hull_damage <= hp + 1e-3);
        let health = unit.health.as_ref().unwrap();
        prop_assert!(health.current_hp >= 0.0);
        prop_assert!(health.current_shield >= 0.0);
        prop_assert_eq!(report.destroyed, health.current_hp <= 0.0);
    }

    #[test]
    fn test_mitigation_monotonic(
        amount in 0.0f32..500.0,
        armor in 0.0f32..200.0,
        extra in 0.0f32..100.0,
    ) {
        let divisor = CombatConfig::default().damage.armor_divisor;
        let thin = mitigate(amount, armor, divisor);
        let thick = mitigate(amount, armor + extra, divisor);
        prop_assert!(thin >= 0.0);
        prop_assert!(thick <= thin);
        prop_assert!(thin <= amount);
    }

    #[test]
    fn test_split_rule_bounded(
        amount in 0.0f32..300.0,
        shield in 0.0f32..200.0,
        shield_mult in 0.0f32..3.0,
        hull_mult in 0.0f32..3.0,
    ) {
        let mut health = HealthComponent::new(10_000.0).with_shield(shield);
        let (absorbed, hull) = health.take_split_damage(amount, shield_mult, hull_mult);

        prop_assert!(absorbed <= shield + 1e-3);
        prop_assert!(absorbed <= amount * shield_mult + 1e-3);
        prop_assert!(hull <= amount * hull_mult + 1e-3);
    }

    #[test]
    fn test_routing_never_jumps_to_steady(
        morale in 0.0f32..100.0,
        inspiring in 0usize..5,
        allies in 0usize..12,
        dt in 0.01f32..2.0,
    ) {
        let config = CombatConfig::default();
        let mut comp = MoraleComponent::new(70.0, 100.0);
        comp.current_morale = morale;
        comp.state = MoraleState::Routing;
        let mut unit = Unit::new("Conscripts", "Imperium", Domain::Ground)
            .with_health(HealthComponent::new(100.0))
            .with_morale(comp);
        let env = MoraleEnvironment {
            inspiring_allies: inspiring,
            nearby_allies: allies,
            ..Default::default()
        };

        update_morale(&mut unit, &env, &config, dt);

        let state = unit.morale.as_ref().map(|m| m.state);
        prop_assert_ne!(state, Some(MoraleState::Steady));
    }

    #[test]
    fn test_state_step_is_adjacent(current in morale_state(), morale in 0.0f32..100.0) {
        let config = MoraleConfig::default();
        let next = next_state(current, morale, &config);
        // Only collapse to Routing may skip a state
        if next != MoraleState::Routing {
            let rank = |s: MoraleState| match s {
                MoraleState::Steady => 0i32,
                MoraleState::Shaken => 1,
                MoraleState::Routing => 2,
            };
            prop_assert!((rank(next) - rank(current)).abs() <= 1);
        }
    }

    #[test]
    fn test_crew_losses_bounded(
        crew in 1u32..200,
        troop in 0u32..40,
        assault in 0u32..300,
        bonus in 0u32..50,
    ) {
        let mut component = CrewComponent::new(crew, troop);
        let killed = component.take_crew_damage(assault, bonus, None, 0);

        prop_assert!(killed <= crew);
        prop_assert_eq!(component.current_crew, crew - killed);
        prop_assert_eq!(component.is_hulk(), component.current_crew == 0);
        if assault > 0 {
            prop_assert!(killed >= 1);
        }
    }
}

#[test]
fn test_crew_formula_example() {
    let mut crew = CrewComponent::new(100, 10);
    assert_eq!(crew.take_crew_damage(30, 0, None, 0), 15);
    assert_eq!(crew.current_crew, 85);
}
