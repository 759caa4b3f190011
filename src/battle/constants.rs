//! Battle loop constants
//!
//! Balance numbers live in `CombatConfig`; these are the structural ones.

// Map
pub const DEFAULT_BATTLE_WIDTH: i32 = 50;
pub const DEFAULT_BATTLE_HEIGHT: i32 = 40;

// Time
pub const ROUND_SECONDS: f32 = 1.0;
pub const DEFAULT_REAL_TIME_DT: f32 = 0.1;
pub const MIN_DT: f32 = 0.01;

// Combat
/// Floor for a target's defense multiplier, so a zero never divides
pub const MIN_DEFENSE_MULT: f32 = 0.1;
/// Hit chance for shooters with no stats
pub const DEFAULT_ACCURACY: f64 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map_is_playable() {
        assert!(DEFAULT_BATTLE_WIDTH > 0);
        assert!(DEFAULT_BATTLE_HEIGHT > 0);
    }

    #[test]
    fn test_time_steps_ordered() {
        assert!(MIN_DT > 0.0);
        assert!(MIN_DT < DEFAULT_REAL_TIME_DT);
        assert!(DEFAULT_REAL_TIME_DT < ROUND_SECONDS);
    }
}
