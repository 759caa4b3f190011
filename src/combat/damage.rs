//! Damage resolution pipeline
//!
//! armor mitigation -> fortress reduction -> component hit -> shield/hull ->
//! suppression. Never fails: missing armor or shields count as zero.

use serde::{Deserialize, Serialize};

use crate::components::{Damageable, Suppressible};
use crate::combat::constants::TRAIT_FORTRESS;
use crate::core::config::CombatConfig;
use crate::core::types::{relative_bearing, Facing, GridPos};
use crate::unit::modifiers::ARMOR_MULT;
use crate::unit::Unit;

/// Sub-entity a hit can be aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentTarget {
    Weapon(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageRequest {
    pub amount: f32,
    pub facing: Facing,
    pub target_component: Option<ComponentTarget>,
    pub ignore_mitigation: bool,
    pub shield_mult: f32,
    pub hull_mult: f32,
    /// Subtracted from effective armor before mitigation
    pub armor_piercing: i32,
}

impl DamageRequest {
    pub fn new(amount: f32, facing: Facing) -> Self {
        Self {
            amount,
            facing,
            target_component: None,
            ignore_mitigation: false,
            shield_mult: 1.0,
            hull_mult: 1.0,
            armor_piercing: 0,
        }
    }

    pub fn at_component(mut self, target: ComponentTarget) -> Self {
        self.target_component = Some(target);
        self
    }

    pub fn unmitigated(mut self) -> Self {
        self.ignore_mitigation = true;
        self
    }

    pub fn with_multipliers(mut self, shield_mult: f32, hull_mult: f32) -> Self {
        self.shield_mult = shield_mult;
        self.hull_mult = hull_mult;
        self
    }

    pub fn with_armor_piercing(mut self, ap: i32) -> Self {
        self.armor_piercing = ap;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub shield_damage: f32,
    pub hull_damage: f32,
    /// Hull reached zero on this hit
    pub destroyed: bool,
    pub destroyed_component: Option<ComponentTarget>,
}

impl DamageReport {
    pub fn total(&self) -> f32 {
        self.shield_damage + self.hull_damage
    }
}

/// Sector of `victim` that a shot from `attacker_pos` strikes
pub fn attack_facing(attacker_pos: GridPos, victim: &Unit) -> Facing {
    if attacker_pos == victim.position {
        return Facing::Front;
    }
    Facing::from_bearing(relative_bearing(victim.position, victim.heading(), attacker_pos))
}

/// Flat armor mitigation: `max(0, amount - armor / divisor)`
pub fn mitigate(amount: f32, armor: f32, divisor: f32) -> f32 {
    (amount - armor.max(0.0) / divisor).max(0.0)
}

/// Run one hit through the pipeline against `unit`
///
/// A hit aimed at a component already destroyed is dropped for that
/// component; the hull still takes the normal mitigated amount.
pub fn resolve_damage(unit: &mut Unit, request: &DamageRequest, config: &CombatConfig) -> DamageReport {
    let mut report = DamageReport::default();
    let mut amount = request.amount.max(0.0);

    if !request.ignore_mitigation {
        if let Some(armor) = &unit.armor {
            let effective = (armor.effective_armor(request.facing) - request.armor_piercing).max(0);
            let effective = effective as f32 * unit.modifiers.mult(ARMOR_MULT);
            amount = mitigate(amount, effective, config.damage.armor_divisor);
        }
    }

    if unit.traits.has(TRAIT_FORTRESS) {
        amount *= config.damage.fortress_multiplier;
    }

    if let Some(target) = request.target_component {
        let component: Option<&mut dyn Damageable> = match target {
            ComponentTarget::Weapon(idx) => unit.weapons.get_mut(idx).map(|w| w as &mut dyn Damageable),
        };
        if let Some(component) = component {
            if !component.is_destroyed() {
                component.absorb_damage(amount);
                if component.is_destroyed() {
                    report.destroyed_component = Some(target);
                }
            }
        }
    }

    let Some(health) = unit.health.as_mut() else {
        return report;
    };
    let was_alive = health.is_alive();

    let (shield, hull) = if request.shield_mult == 1.0 && request.hull_mult == 1.0 {
        health.take_damage(amount)
    } else {
        health.take_split_damage(amount, request.shield_mult, request.hull_mult)
    };
    report.shield_damage = shield;
    report.hull_damage = hull;
    report.destroyed = was_alive && !health.is_alive();

    if hull > 0.0 {
        if let Some(morale) = unit.morale.as_mut() {
            morale.add_suppression(
                hull * config.suppression.per_hull_damage,
                config.suppression.max_suppression,
            );
            morale.record_damage(hull);
        }
    }

    if shield > 0.0 || hull > 0.0 {
        unit.invalidate_strength();
    }

    report
}
