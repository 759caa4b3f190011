//! Damage pipeline integration tests
//!
//! Armor, fortress reduction, shields, component hits and the morale side
//! effects of a hit, driven through the public API only.

use void_reckoning::combat::{resolve_damage, ComponentTarget, DamageRequest};
use void_reckoning::components::{
    ArmorComponent, HealthComponent, MoraleComponent, TraitSet, WeaponComponent, WeaponStats,
};
use void_reckoning::core::types::{Domain, Facing};
use void_reckoning::core::CombatConfig;
use void_reckoning::unit::Unit;

fn cruiser(hp: f32, armor: ArmorComponent) -> Unit {
    Unit::new("Lunar Cruiser", "Imperium", Domain::Space)
        .with_health(HealthComponent::new(hp))
        .with_armor(armor)
}

fn lance() -> WeaponComponent {
    WeaponComponent::new(
        "Lance Battery",
        WeaponStats {
            range: 30.0,
            strength: 4.0,
            ap: 2,
            damage: 1.0,
            weapon_type: "energy".into(),
        },
        25.0,
    )
}

/// 1000 hp, 20 armor, 100 frontal damage: 100 - 20/5 = 96
#[test]
fn test_frontal_hit_on_armored_hull() {
    let config = CombatConfig::default();
    let mut unit = cruiser(1000.0, ArmorComponent::new(20));

    let report = resolve_damage(&mut unit, &DamageRequest::new(100.0, Facing::Front), &config);

    assert_eq!(report.hull_damage, 96.0);
    assert_eq!(report.shield_damage, 0.0);
    assert!(!report.destroyed);
    assert_eq!(unit.health.as_ref().map(|h| h.current_hp), Some(904.0));
}

#[test]
fn test_rear_armor_takes_more() {
    let config = CombatConfig::default();
    let armor = ArmorComponent::new(20).with_facing(Facing::Rear, -20);
    let mut front = cruiser(1000.0, armor.clone());
    let mut rear = cruiser(1000.0, armor);

    let hit_front = resolve_damage(&mut front, &DamageRequest::new(50.0, Facing::Front), &config);
    let hit_rear = resolve_damage(&mut rear, &DamageRequest::new(50.0, Facing::Rear), &config);

    assert_eq!(hit_front.hull_damage, 46.0);
    assert_eq!(hit_rear.hull_damage, 50.0);
}

#[test]
fn test_armor_piercing_cuts_through() {
    let config = CombatConfig::default();
    let mut unit = cruiser(1000.0, ArmorComponent::new(20));

    let request = DamageRequest::new(10.0, Facing::Front).with_armor_piercing(10);
    let report = resolve_damage(&mut unit, &request, &config);

    // 10 - (20 - 10) / 5
    assert_eq!(report.hull_damage, 8.0);
}

#[test]
fn test_heavy_armor_shrugs_off_small_arms() {
    let config = CombatConfig::default();
    let mut unit = cruiser(500.0, ArmorComponent::new(100));

    let report = resolve_damage(&mut unit, &DamageRequest::new(15.0, Facing::Front), &config);

    assert_eq!(report.total(), 0.0);
    assert_eq!(unit.hp_ratio(), 1.0);
}

#[test]
fn test_unmitigated_ignores_armor() {
    let config = CombatConfig::default();
    let mut unit = cruiser(1000.0, ArmorComponent::new(50));

    let report = resolve_damage(
        &mut unit,
        &DamageRequest::new(30.0, Facing::Front).unmitigated(),
        &config,
    );

    assert_eq!(report.hull_damage, 30.0);
}

#[test]
fn test_shield_layers_before_hull() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Frigate", "Imperium", Domain::Space)
        .with_health(HealthComponent::new(100.0).with_shield(40.0));

    let first = resolve_damage(&mut unit, &DamageRequest::new(30.0, Facing::Front), &config);
    assert_eq!((first.shield_damage, first.hull_damage), (30.0, 0.0));

    let second = resolve_damage(&mut unit, &DamageRequest::new(30.0, Facing::Front), &config);
    assert_eq!((second.shield_damage, second.hull_damage), (10.0, 20.0));
    assert_eq!(unit.health.as_ref().map(|h| h.current_hp), Some(80.0));
}

#[test]
fn test_split_rule_for_shield_breakers() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Frigate", "Imperium", Domain::Space)
        .with_health(HealthComponent::new(100.0).with_shield(20.0));

    // Shield sees 2 * 20 = 40, absorbs 20; half the hit passes at 0.5
    let request = DamageRequest::new(20.0, Facing::Front).with_multipliers(2.0, 0.5);
    let report = resolve_damage(&mut unit, &request, &config);

    assert_eq!(report.shield_damage, 20.0);
    assert_eq!(report.hull_damage, 5.0);
}

#[test]
fn test_fortress_halves_damage() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Bastion", "Imperium", Domain::Ground)
        .with_health(HealthComponent::new(1000.0))
        .with_traits(TraitSet::new().with_tag("Fortress"));

    let report = resolve_damage(&mut unit, &DamageRequest::new(80.0, Facing::Front), &config);

    assert_eq!(report.hull_damage, 40.0);
}

#[test]
fn test_overkill_reports_hp_removed() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Escort", "Imperium", Domain::Space)
        .with_health(HealthComponent::new(25.0));

    let report = resolve_damage(&mut unit, &DamageRequest::new(100.0, Facing::Front), &config);

    assert_eq!(report.hull_damage, 25.0);
    assert!(report.destroyed);
    assert!(!unit.is_alive());

    let again = resolve_damage(&mut unit, &DamageRequest::new(100.0, Facing::Front), &config);
    assert!(!again.destroyed);
    assert_eq!(again.total(), 0.0);
}

#[test]
fn test_component_hit_destroys_weapon_then_blows_through() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Cruiser", "Imperium", Domain::Space)
        .with_health(HealthComponent::new(500.0))
        .with_weapon(lance());

    let request = DamageRequest::new(30.0, Facing::Front).at_component(ComponentTarget::Weapon(0));
    let first = resolve_damage(&mut unit, &request, &config);
    assert_eq!(first.destroyed_component, Some(ComponentTarget::Weapon(0)));
    assert!(unit.weapons[0].is_destroyed);
    assert_eq!(first.hull_damage, 30.0);

    // Already gone: the weapon is skipped, the hull still takes it
    let second = resolve_damage(&mut unit, &request, &config);
    assert_eq!(second.destroyed_component, None);
    assert_eq!(second.hull_damage, 30.0);
    assert_eq!(unit.health.as_ref().map(|h| h.current_hp), Some(440.0));
}

#[test]
fn test_hull_damage_feeds_suppression_and_morale() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Guardsmen", "Imperium", Domain::Ground)
        .with_health(HealthComponent::new(100.0))
        .with_morale(MoraleComponent::new(70.0, 100.0));

    resolve_damage(&mut unit, &DamageRequest::new(40.0, Facing::Front), &config);

    let morale = unit.morale.as_ref().map(|m| (m.suppression, m.recent_damage));
    // 40 hull * 0.5 suppression per point
    assert_eq!(morale, Some((20.0, 40.0)));
}

#[test]
fn test_shield_only_hit_does_not_suppress() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Guardsmen", "Imperium", Domain::Ground)
        .with_health(HealthComponent::new(100.0).with_shield(50.0))
        .with_morale(MoraleComponent::new(70.0, 100.0));

    resolve_damage(&mut unit, &DamageRequest::new(40.0, Facing::Front), &config);

    assert_eq!(unit.morale.as_ref().map(|m| m.suppression), Some(0.0));
}

#[test]
fn test_no_health_component_is_a_no_op() {
    let config = CombatConfig::default();
    let mut unit = Unit::new("Beacon", "Imperium", Domain::Ground);

    let report = resolve_damage(&mut unit, &DamageRequest::new(40.0, Facing::Front), &config);

    assert_eq!(report.total(), 0.0);
    assert!(!report.destroyed);
}
