//! Void Reckoning - combat-resolution core for a faction-based wargame
//!
//! Units are bundles of optional components. Damage, boarding and morale
//! rules act on single units; the ability engine and the battle loop drive
//! them over a roster that each battle owns outright.

pub mod abilities;
pub mod battle;
pub mod combat;
pub mod components;
pub mod core;
pub mod spatial;
pub mod unit;
