//! Fixed combat rules that are not balance knobs
//!
//! Tunable numbers live in `core::config`.

// Crew attrition: defense and attack bonuses are counted in fives
pub const CREW_DEFENSE_DIVISOR: u32 = 5;

// Teleport relocation
pub const MAX_TELEPORT_ATTEMPTS: u32 = 10;

// Trait tags with mechanical effects
pub const TRAIT_FORTRESS: &str = "Fortress";
pub const TRAIT_FEAR: &str = "Fear";
pub const TRAIT_TERROR: &str = "Terror";
pub const TRAIT_INSPIRING: &str = "Inspiring";

// Resources drawn from the unit's own pool; everything else is faction-shared
pub const UNIT_LOCAL_RESOURCES: [&str; 3] = ["energy", "fuel", "ammo"];

// Scaling stats with this prefix read a faction resource
pub const FACTION_STAT_PREFIX: &str = "faction:";

// Derived strength: (ma + md + damage) of an average line unit
pub const STRENGTH_STAT_REFERENCE: f32 = 150.0;
pub const STRENGTH_COST_FACTOR: f32 = 0.1;

pub fn is_unit_local(resource: &str) -> bool {
    UNIT_LOCAL_RESOURCES.contains(&resource)
}
