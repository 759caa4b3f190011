//! Combat rules: damage, boarding and morale
//!
//! Everything here works on a single unit (or a single attacker/defender
//! pair) and knows nothing about the battle loop that calls it.

pub mod boarding;
pub mod constants;
pub mod damage;
pub mod morale;

pub use boarding::{resolve_boarding, seize, BoardingResult};
pub use damage::{attack_facing, mitigate, resolve_damage, ComponentTarget, DamageReport, DamageRequest};
pub use morale::{next_state, rally, update_morale, MoraleEnvironment};
