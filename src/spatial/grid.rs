//! Tactical map queries
//!
//! The combat core only ever talks to `SpatialGrid`; `TacticalGrid` is the
//! bounded, single-occupancy map the battle loop uses by default.

use ahash::AHashMap;

use crate::core::types::{relative_bearing, GridPos, UnitId};
use crate::spatial::sparse_hash::SparseHashGrid;

const HASH_CELL_SIZE: i32 = 8;

pub trait SpatialGrid {
    fn distance(&self, a: GridPos, b: GridPos) -> f32 {
        a.distance(&b)
    }

    /// Bearing of `other` as seen from `observer` facing `heading_deg`
    fn bearing(&self, observer: GridPos, heading_deg: f32, other: GridPos) -> f32 {
        relative_bearing(observer, heading_deg, other)
    }

    fn units_within(&self, center: GridPos, radius: f32) -> Vec<UnitId>;

    fn is_valid(&self, pos: GridPos) -> bool;

    fn unit_at(&self, pos: GridPos) -> Option<UnitId>;

    fn is_occupied(&self, pos: GridPos) -> bool {
        self.unit_at(pos).is_some()
    }

    fn position_of(&self, unit: UnitId) -> Option<GridPos>;

    /// Put a unit on the map, refusing invalid or taken tiles
    fn place(&mut self, unit: UnitId, pos: GridPos) -> bool;

    /// Relocate a placed unit, refusing invalid or taken tiles
    fn move_unit(&mut self, unit: UnitId, to: GridPos) -> bool;

    fn remove(&mut self, unit: UnitId);
}

#[derive(Debug, Clone)]
pub struct TacticalGrid {
    pub width: i32,
    pub height: i32,
    occupancy: AHashMap<GridPos, UnitId>,
    hash: SparseHashGrid,
}

impl TacticalGrid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            occupancy: AHashMap::new(),
            hash: SparseHashGrid::new(HASH_CELL_SIZE),
        }
    }

    /// Nearest free, valid tile to `pos` (searching outward in rings)
    pub fn nearest_free(&self, pos: GridPos) -> Option<GridPos> {
        let max_ring = self.width.max(self.height);
        for ring in 0..=max_ring {
            for dx in -ring..=ring {
                for dy in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let candidate = GridPos::new(pos.x + dx, pos.y + dy);
                    if self.is_valid(candidate) && !self.is_occupied(candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    pub fn clamp(&self, pos: GridPos) -> GridPos {
        GridPos::new(pos.x.clamp(0, self.width - 1), pos.y.clamp(0, self.height - 1))
    }
}

impl SpatialGrid for TacticalGrid {
    fn units_within(&self, center: GridPos, radius: f32) -> Vec<UnitId> {
        self.hash.query_radius(center, radius)
    }

    fn is_valid(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn unit_at(&self, pos: GridPos) -> Option<UnitId> {
        self.occupancy.get(&pos).copied()
    }

    fn position_of(&self, unit: UnitId) -> Option<GridPos> {
        self.hash.position(unit)
    }

    fn place(&mut self, unit: UnitId, pos: GridPos) -> bool {
        if !self.is_valid(pos) || self.is_occupied(pos) {
            return false;
        }
        self.remove(unit);
        self.occupancy.insert(pos, unit);
        self.hash.insert(unit, pos);
        true
    }

    fn move_unit(&mut self, unit: UnitId, to: GridPos) -> bool {
        if self.position_of(unit).is_none() {
            return false;
        }
        self.place(unit, to)
    }

    fn remove(&mut self, unit: UnitId) {
        if let Some(pos) = self.hash.remove(unit) {
            self.occupancy.remove(&pos);
        }
    }
}
