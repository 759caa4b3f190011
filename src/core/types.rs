//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to the army (fleet or regiment group) a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArmyId(pub Uuid);

impl ArmyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArmyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for battle instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Ability identifier as it appears in the registry
pub type AbilityId = String;

/// Simulated time in seconds (rounds count as one second each)
pub type SimTime = f32;

/// Update step counter
pub type Round = u64;

/// Theatre a unit fights in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    Ground,
    Space,
}

/// Directional sector an attack strikes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Front,
    Side,
    Rear,
    Dorsal,
    Ventral,
}

impl Facing {
    pub fn all() -> &'static [Facing] {
        &[
            Facing::Front,
            Facing::Side,
            Facing::Rear,
            Facing::Dorsal,
            Facing::Ventral,
        ]
    }

    /// Planar sector for a bearing in degrees (0 = dead ahead, clockwise)
    ///
    /// Dorsal and ventral hits never come out of a planar bearing; callers
    /// request them explicitly.
    pub fn from_bearing(bearing_deg: f32) -> Self {
        let b = bearing_deg.rem_euclid(360.0);
        if (135.0..=225.0).contains(&b) {
            Facing::Rear
        } else if (45.0..135.0).contains(&b) || (225.0..315.0).contains(&b) {
            Facing::Side
        } else {
            Facing::Front
        }
    }
}

/// Tile coordinate on the tactical grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in tiles
    pub fn distance(&self, other: &Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Absolute heading from self towards other in degrees (0 = +x, counter-clockwise)
    pub fn heading_to(&self, other: &Self) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        dy.atan2(dx).to_degrees().rem_euclid(360.0)
    }

    /// One tile step towards `other`, moving on both axes when needed
    pub fn step_towards(&self, other: &Self) -> Self {
        Self::new(
            self.x + (other.x - self.x).signum(),
            self.y + (other.y - self.y).signum(),
        )
    }

    /// One tile step directly away from `other`
    pub fn step_away(&self, other: &Self) -> Self {
        let mut dx = (self.x - other.x).signum();
        let dy = (self.y - other.y).signum();
        if dx == 0 && dy == 0 {
            dx = 1;
        }
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Bearing of `other` relative to an observer facing `heading_deg`
///
/// 0 is dead ahead, 180 is directly behind. Always in `[0, 360)`.
pub fn relative_bearing(observer: GridPos, heading_deg: f32, other: GridPos) -> f32 {
    (observer.heading_to(&other) - heading_deg).rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_uniqueness() {
        assert_ne!(UnitId::new(), UnitId::new());
    }

    #[test]
    fn test_grid_distance() {
        let a = GridPos::new(0, 0);
        let b = GridPos::new(3, 4);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_facing_from_bearing_sectors() {
        assert_eq!(Facing::from_bearing(0.0), Facing::Front);
        assert_eq!(Facing::from_bearing(30.0), Facing::Front);
        assert_eq!(Facing::from_bearing(330.0), Facing::Front);
        assert_eq!(Facing::from_bearing(90.0), Facing::Side);
        assert_eq!(Facing::from_bearing(270.0), Facing::Side);
        assert_eq!(Facing::from_bearing(180.0), Facing::Rear);
        assert_eq!(Facing::from_bearing(-180.0), Facing::Rear);
    }

    #[test]
    fn test_relative_bearing_behind() {
        let observer = GridPos::new(5, 5);
        // Facing +x, enemy on -x side
        let bearing = relative_bearing(observer, 0.0, GridPos::new(0, 5));
        assert!((bearing - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_step_towards_and_away() {
        let a = GridPos::new(0, 0);
        let b = GridPos::new(5, -3);
        assert_eq!(a.step_towards(&b), GridPos::new(1, -1));
        assert_eq!(a.step_away(&b), GridPos::new(-1, 1));
        assert_eq!(a.step_away(&a), GridPos::new(1, 0));
    }
}
