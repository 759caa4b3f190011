//! Hull and shield pools

use serde::{Deserialize, Serialize};

use super::{Damageable, Healable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthComponent {
    pub max_hp: f32,
    pub current_hp: f32,
    #[serde(default)]
    pub max_shield: f32,
    #[serde(default)]
    pub current_shield: f32,
    /// Hull points restored per regeneration tick
    #[serde(default)]
    pub regen: f32,
    /// Shield points restored per regeneration tick
    #[serde(default)]
    pub shield_regen: f32,
}

impl HealthComponent {
    pub fn new(max_hp: f32) -> Self {
        let max_hp = max_hp.max(0.0);
        Self {
            max_hp,
            current_hp: max_hp,
            max_shield: 0.0,
            current_shield: 0.0,
            regen: 0.0,
            shield_regen: 0.0,
        }
    }

    /// Fully charged shield of the given size
    pub fn with_shield(mut self, max_shield: f32) -> Self {
        self.max_shield = max_shield.max(0.0);
        self.current_shield = self.max_shield;
        self
    }

    pub fn with_regen(mut self, regen: f32, shield_regen: f32) -> Self {
        self.regen = regen.max(0.0);
        self.shield_regen = shield_regen.max(0.0);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0.0
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            self.current_hp / self.max_hp
        }
    }

    /// Layered rule: the shield soaks first, the remainder hits the hull
    ///
    /// Returns `(shield_damage, hull_damage)`. Hull damage is what was
    /// actually removed, so overkill is not reported.
    pub fn take_damage(&mut self, amount: f32) -> (f32, f32) {
        let amount = amount.max(0.0);
        let shield_damage = amount.min(self.current_shield);
        self.current_shield -= shield_damage;

        let hull_damage = (amount - shield_damage).min(self.current_hp.max(0.0));
        self.current_hp = (self.current_hp - hull_damage).max(0.0);

        (shield_damage, hull_damage)
    }

    /// Split rule for weapons that treat shields and hulls differently
    ///
    /// The shield sees `amount * shield_mult`; whatever fraction of that it
    /// fails to absorb passes through to the hull scaled by `hull_mult`.
    pub fn take_split_damage(&mut self, amount: f32, shield_mult: f32, hull_mult: f32) -> (f32, f32) {
        let amount = amount.max(0.0);
        let shield_potential = amount * shield_mult.max(0.0);
        let absorbed = self.current_shield.min(shield_potential);
        let remainder_ratio = if shield_potential > 0.0 {
            (shield_potential - absorbed) / shield_potential
        } else {
            0.0
        };
        let hull_potential = amount * remainder_ratio * hull_mult.max(0.0);

        self.current_shield = (self.current_shield - absorbed).max(0.0);
        let hull_damage = hull_potential.min(self.current_hp.max(0.0));
        self.current_hp = (self.current_hp - hull_damage).max(0.0);

        (absorbed, hull_damage)
    }

    /// Restore hull up to max, returning the hp actually restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current_hp;
        self.current_hp = (self.current_hp + amount.max(0.0)).min(self.max_hp);
        self.current_hp - before
    }

    /// Apply one tick of hull regeneration. Wrecks do not regenerate.
    pub fn regenerate(&mut self) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        self.heal(self.regen)
    }

    pub fn regenerate_shields(&mut self) -> f32 {
        self.recharge_shields(self.shield_regen)
    }

    /// Top the shield up by `amount`, returning what was added
    pub fn recharge_shields(&mut self, amount: f32) -> f32 {
        let before = self.current_shield;
        self.current_shield = (self.current_shield + amount.max(0.0)).min(self.max_shield);
        self.current_shield - before
    }
}

impl Damageable for HealthComponent {
    fn absorb_damage(&mut self, amount: f32) -> f32 {
        let (shield, hull) = self.take_damage(amount);
        shield + hull
    }

    fn is_destroyed(&self) -> bool {
        !self.is_alive()
    }
}

impl Healable for HealthComponent {
    fn restore(&mut self, amount: f32) -> f32 {
        self.heal(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_absorbs_first() {
        let mut health = HealthComponent::new(100.0).with_shield(30.0);
        let (shield, hull) = health.take_damage(50.0);
        assert_eq!(shield, 30.0);
        assert_eq!(hull, 20.0);
        assert_eq!(health.current_shield, 0.0);
        assert_eq!(health.current_hp, 80.0);
    }

    #[test]
    fn test_overkill_not_reported() {
        let mut health = HealthComponent::new(10.0);
        let (_, hull) = health.take_damage(500.0);
        assert_eq!(hull, 10.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_split_damage_shield_weak_hull_strong() {
        let mut health = HealthComponent::new(1000.0).with_shield(50.0);
        // Shield sees 200, absorbs 50, 75% passes through at double strength
        let (shield, hull) = health.take_split_damage(100.0, 2.0, 2.0);
        assert_eq!(shield, 50.0);
        assert!((hull - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_split_damage_zero_shield_mult() {
        let mut health = HealthComponent::new(100.0).with_shield(50.0);
        let (shield, hull) = health.take_split_damage(40.0, 0.0, 1.5);
        assert_eq!(shield, 0.0);
        assert_eq!(hull, 0.0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut health = HealthComponent::new(100.0);
        health.take_damage(30.0);
        assert_eq!(health.heal(50.0), 30.0);
        assert_eq!(health.current_hp, 100.0);
    }

    #[test]
    fn test_dead_hull_does_not_regenerate() {
        let mut health = HealthComponent::new(50.0).with_regen(5.0, 0.0);
        health.take_damage(50.0);
        assert_eq!(health.regenerate(), 0.0);
    }
}
