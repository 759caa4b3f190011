//! Per-unit attribute bundles
//!
//! Each component owns only its own numbers and serializes on its own.
//! Behaviour shared across components is expressed through the capability
//! traits below instead of probing for methods at runtime.

pub mod armor;
pub mod crew;
pub mod health;
pub mod morale;
pub mod movement;
pub mod stats;
pub mod traits;
pub mod weapon;

pub use armor::ArmorComponent;
pub use crew::CrewComponent;
pub use health::HealthComponent;
pub use morale::{MoraleComponent, MoraleState};
pub use movement::MovementComponent;
pub use stats::StatsComponent;
pub use traits::TraitSet;
pub use weapon::{WeaponComponent, WeaponStats};

/// Anything with its own hit pool that damage can be pointed at
pub trait Damageable {
    /// Apply already-mitigated damage, returning the amount actually absorbed
    fn absorb_damage(&mut self, amount: f32) -> f32;

    fn is_destroyed(&self) -> bool;
}

/// Anything whose hit pool can be restored
pub trait Healable {
    /// Restore up to `amount`, returning what was actually restored
    fn restore(&mut self, amount: f32) -> f32;
}

/// Anything that accumulates suppression from incoming fire
pub trait Suppressible {
    fn add_suppression(&mut self, amount: f32, cap: f32);

    fn suppression(&self) -> f32;

    fn is_suppressed(&self, threshold: f32) -> bool {
        self.suppression() >= threshold
    }
}
