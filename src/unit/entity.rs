//! The combat unit

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::constants::{STRENGTH_COST_FACTOR, STRENGTH_STAT_REFERENCE};
use crate::components::{
    ArmorComponent, CrewComponent, HealthComponent, MoraleComponent, MovementComponent,
    StatsComponent, TraitSet, WeaponComponent,
};
use crate::core::types::{AbilityId, ArmyId, Domain, GridPos, SimTime, UnitId};
use crate::unit::modifiers::TempModifiers;
use crate::unit::progression::Progression;

/// A unit with its component set
///
/// Every component is optional; rules that need one treat its absence as
/// zero (no armor, no shield) or as an invalid target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub faction: String,
    pub domain: Domain,
    pub class: String,

    pub health: Option<HealthComponent>,
    pub armor: Option<ArmorComponent>,
    pub weapons: Vec<WeaponComponent>,
    pub morale: Option<MoraleComponent>,
    pub crew: Option<CrewComponent>,
    pub movement: Option<MovementComponent>,
    pub stats: Option<StatsComponent>,
    pub traits: TraitSet,

    /// Ability id -> time it is next usable
    pub cooldowns: BTreeMap<AbilityId, SimTime>,
    /// Unit-local pools (energy, fuel, ammo, and stats read by ability scaling)
    pub resources: BTreeMap<String, f32>,
    pub progression: Progression,
    pub modifiers: TempModifiers,

    /// Army membership, resolved through the roster
    pub army: Option<ArmyId>,
    pub position: GridPos,

    pub power_rating: Option<f32>,
    pub cost: f32,

    /// Seized this step; exempt from wreck removal until cleanup resets it
    pub captured_this_step: bool,

    #[serde(skip)]
    cached_strength: Option<f32>,
    #[serde(skip)]
    container_dirty: bool,
}

impl Unit {
    pub fn new(name: impl Into<String>, faction: impl Into<String>, domain: Domain) -> Self {
        Self {
            id: UnitId::new(),
            name: name.into(),
            faction: faction.into(),
            domain,
            class: String::new(),
            health: None,
            armor: None,
            weapons: Vec::new(),
            morale: None,
            crew: None,
            movement: None,
            stats: None,
            traits: TraitSet::new(),
            cooldowns: BTreeMap::new(),
            resources: BTreeMap::new(),
            progression: Progression::default(),
            modifiers: TempModifiers::new(),
            army: None,
            position: GridPos::default(),
            power_rating: None,
            cost: 0.0,
            captured_this_step: false,
            cached_strength: None,
            container_dirty: false,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_health(mut self, health: HealthComponent) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_armor(mut self, armor: ArmorComponent) -> Self {
        self.armor = Some(armor);
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponComponent) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn with_morale(mut self, morale: MoraleComponent) -> Self {
        self.morale = Some(morale);
        self
    }

    pub fn with_crew(mut self, crew: CrewComponent) -> Self {
        self.crew = Some(crew);
        self
    }

    pub fn with_movement(mut self, movement: MovementComponent) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn with_stats(mut self, stats: StatsComponent) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_traits(mut self, traits: TraitSet) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>, amount: f32) -> Self {
        self.resources.insert(resource.into(), amount);
        self
    }

    pub fn with_power(mut self, power_rating: f32) -> Self {
        self.power_rating = Some(power_rating);
        self
    }

    pub fn with_cost(mut self, cost: f32) -> Self {
        self.cost = cost;
        self
    }

    pub fn at(mut self, position: GridPos) -> Self {
        self.position = position;
        self
    }

    /// Has hull left. A unit with no health component counts as alive
    /// only while it still has crew.
    pub fn is_alive(&self) -> bool {
        match &self.health {
            Some(h) => h.is_alive(),
            None => self.crew.as_ref().is_some_and(|c| !c.is_hulk()),
        }
    }

    pub fn is_hulk(&self) -> bool {
        self.crew.as_ref().is_some_and(|c| c.is_hulk())
    }

    /// Alive and crewed: counts towards victory
    pub fn is_combat_effective(&self) -> bool {
        self.is_alive() && !self.is_hulk()
    }

    pub fn hp_ratio(&self) -> f32 {
        self.health.as_ref().map(|h| h.hp_ratio()).unwrap_or(0.0)
    }

    pub fn heading(&self) -> f32 {
        self.movement.as_ref().map(|m| m.heading_deg).unwrap_or(0.0)
    }

    pub fn is_stunned(&self) -> bool {
        self.movement.as_ref().is_some_and(|m| m.stunned)
            || self.modifiers.has_flag(crate::unit::modifiers::STUNNED)
    }

    pub fn ready_at(&self, ability: &str) -> SimTime {
        self.cooldowns.get(ability).copied().unwrap_or(0.0)
    }

    /// Derived fighting strength, recomputed only after invalidation
    ///
    /// `max(1, base_power * hp_ratio * (ma + md + damage) / 150)` where
    /// `base_power` is the explicit rating or a tenth of the cost.
    pub fn strength(&mut self) -> f32 {
        if let Some(cached) = self.cached_strength {
            return cached;
        }
        let value = self.compute_strength();
        self.cached_strength = Some(value);
        value
    }

    fn compute_strength(&self) -> f32 {
        let base_power = self
            .power_rating
            .unwrap_or(self.cost * STRENGTH_COST_FACTOR);
        let stat_factor = self
            .stats
            .as_ref()
            .map(|s| (s.ma + s.md + s.damage) / STRENGTH_STAT_REFERENCE)
            .unwrap_or(1.0);
        (base_power * self.hp_ratio() * stat_factor).max(1.0)
    }

    /// Drop the cached strength and flag the owning army for a recount
    pub fn invalidate_strength(&mut self) {
        self.cached_strength = None;
        self.container_dirty = true;
    }

    pub(crate) fn take_container_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.container_dirty, false)
    }

    /// Between-step hull regeneration
    pub fn regenerate_hull(&mut self) -> f32 {
        let restored = self.health.as_mut().map(|h| h.regenerate()).unwrap_or(0.0);
        if restored > 0.0 {
            self.invalidate_strength();
        }
        restored
    }

    pub fn regenerate_shields(&mut self) -> f32 {
        let restored = self
            .health
            .as_mut()
            .map(|h| h.regenerate_shields())
            .unwrap_or(0.0);
        if restored > 0.0 {
            self.invalidate_strength();
        }
        restored
    }

    /// Weapons that can still fire this step
    pub fn ready_weapons(&self) -> impl Iterator<Item = (usize, &WeaponComponent)> {
        self.weapons.iter().enumerate().filter(|(_, w)| w.can_fire())
    }

    pub fn longest_range(&self) -> f32 {
        self.weapons
            .iter()
            .filter(|w| !w.is_destroyed)
            .map(|w| w.stats.range)
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::HealthComponent;

    fn frigate() -> Unit {
        Unit::new("Sword Frigate", "Imperium", Domain::Space)
            .with_health(HealthComponent::new(200.0))
            .with_stats(StatsComponent::new(50.0, 50.0, 50.0))
            .with_power(30.0)
    }

    #[test]
    fn test_strength_scales_with_hp() {
        let mut unit = frigate();
        assert_eq!(unit.strength(), 30.0);

        if let Some(h) = unit.health.as_mut() {
            h.take_damage(100.0);
        }
        // Stale until invalidated
        assert_eq!(unit.strength(), 30.0);
        unit.invalidate_strength();
        assert_eq!(unit.strength(), 15.0);
    }

    #[test]
    fn test_strength_floor_and_cost_fallback() {
        let mut unit = Unit::new("Skiff", "Orks", Domain::Space)
            .with_health(HealthComponent::new(10.0))
            .with_cost(5.0);
        assert_eq!(unit.strength(), 1.0);
    }

    #[test]
    fn test_hulk_not_combat_effective() {
        let mut unit = frigate().with_crew(CrewComponent::new(10, 5));
        assert!(unit.is_combat_effective());
        if let Some(c) = unit.crew.as_mut() {
            c.take_crew_damage(500, 0, None, 0);
        }
        assert!(unit.is_alive());
        assert!(!unit.is_combat_effective());
    }

    #[test]
    fn test_ready_at_defaults_to_zero() {
        let unit = frigate();
        assert_eq!(unit.ready_at("lance_strike"), 0.0);
    }
}
