//! Weapons as targetable sub-entities
//!
//! A weapon has its own hit pool. Losing it does not touch the hull, and a
//! wrecked hull does not by itself destroy its weapons.

use serde::{Deserialize, Serialize};

use super::Damageable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Reach in tiles
    pub range: f32,
    pub strength: f32,
    /// Armor piercing, subtracted from the target's effective armor
    #[serde(default)]
    pub ap: i32,
    pub damage: f32,
    #[serde(default = "default_weapon_type")]
    pub weapon_type: String,
}

fn default_weapon_type() -> String {
    "kinetic".to_string()
}

fn full_arc() -> f32 {
    360.0
}

fn unit_mult() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponComponent {
    pub name: String,
    pub stats: WeaponStats,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Total firing arc in degrees, centred on the unit's heading
    #[serde(default = "full_arc")]
    pub arc: f32,
    /// Seconds between volleys; 0 falls back to the battle default
    #[serde(default)]
    pub cooldown: f32,
    /// Seconds until the next volley may fire
    #[serde(default)]
    pub ready_in: f32,
    /// Effectiveness against shields and hulls; anything but 1.0 uses the split rule
    #[serde(default = "unit_mult")]
    pub shield_mult: f32,
    #[serde(default = "unit_mult")]
    pub hull_mult: f32,
    pub max_hp: f32,
    pub current_hp: f32,
    #[serde(default)]
    pub is_destroyed: bool,
}

impl WeaponComponent {
    pub fn new(name: impl Into<String>, stats: WeaponStats, max_hp: f32) -> Self {
        Self {
            name: name.into(),
            stats,
            tags: Vec::new(),
            arc: full_arc(),
            cooldown: 0.0,
            ready_in: 0.0,
            shield_mult: 1.0,
            hull_mult: 1.0,
            max_hp,
            current_hp: max_hp,
            is_destroyed: false,
        }
    }

    pub fn with_arc(mut self, arc: f32) -> Self {
        self.arc = arc.clamp(0.0, 360.0);
        self
    }

    pub fn with_multipliers(mut self, shield_mult: f32, hull_mult: f32) -> Self {
        self.shield_mult = shield_mult;
        self.hull_mult = hull_mult;
        self
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown.max(0.0);
        self
    }

    /// Raw damage of one volley before mitigation
    pub fn volley_damage(&self) -> f32 {
        self.stats.strength * 10.0 * self.stats.damage
    }

    pub fn can_fire(&self) -> bool {
        !self.is_destroyed && self.ready_in <= 0.0
    }

    /// Whether a target at `bearing` (relative to the unit's heading) is covered
    pub fn covers_bearing(&self, bearing: f32) -> bool {
        if self.arc >= 360.0 {
            return true;
        }
        let b = bearing.rem_euclid(360.0);
        let off_axis = if b > 180.0 { 360.0 - b } else { b };
        off_axis <= self.arc / 2.0
    }

    /// Start the reload timer after a volley
    pub fn mark_fired(&mut self, default_cooldown: f32) {
        self.ready_in = if self.cooldown > 0.0 {
            self.cooldown
        } else {
            default_cooldown
        };
    }

    pub fn tick(&mut self, dt: f32) {
        self.ready_in = (self.ready_in - dt).max(0.0);
    }
}

impl Damageable for WeaponComponent {
    fn absorb_damage(&mut self, amount: f32) -> f32 {
        if self.is_destroyed {
            return 0.0;
        }
        let taken = amount.max(0.0).min(self.current_hp);
        self.current_hp -= taken;
        if self.current_hp <= 0.0 {
            self.current_hp = 0.0;
            self.is_destroyed = true;
        }
        taken
    }

    fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lance() -> WeaponComponent {
        WeaponComponent::new(
            "Lance Battery",
            WeaponStats {
                range: 12.0,
                strength: 4.0,
                ap: 2,
                damage: 3.0,
                weapon_type: "energy".into(),
            },
            40.0,
        )
    }

    #[test]
    fn test_volley_damage() {
        assert_eq!(lance().volley_damage(), 120.0);
    }

    #[test]
    fn test_destroyed_weapon_cannot_fire() {
        let mut weapon = lance();
        weapon.absorb_damage(100.0);
        assert!(weapon.is_destroyed);
        assert!(!weapon.can_fire());
        assert_eq!(weapon.absorb_damage(10.0), 0.0);
    }

    #[test]
    fn test_reload_timer() {
        let mut weapon = lance().with_cooldown(2.0);
        weapon.mark_fired(1.0);
        assert!(!weapon.can_fire());
        weapon.tick(1.0);
        assert!(!weapon.can_fire());
        weapon.tick(1.0);
        assert!(weapon.can_fire());
    }

    #[test]
    fn test_forward_arc() {
        let weapon = lance().with_arc(90.0);
        assert!(weapon.covers_bearing(30.0));
        assert!(weapon.covers_bearing(330.0));
        assert!(!weapon.covers_bearing(90.0));
    }
}
