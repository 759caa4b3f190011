//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::{GridPos, UnitId};

/// Buckets units by coarse cell so radius queries only touch nearby cells
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: i32,
    cells: AHashMap<(i32, i32), Vec<UnitId>>,
    positions: AHashMap<UnitId, GridPos>,
}

impl SparseHashGrid {
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            cells: AHashMap::new(),
            positions: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: GridPos) -> (i32, i32) {
        (pos.x.div_euclid(self.cell_size), pos.y.div_euclid(self.cell_size))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    pub fn insert(&mut self, unit: UnitId, pos: GridPos) {
        self.remove(unit);
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push(unit);
        self.positions.insert(unit, pos);
    }

    pub fn remove(&mut self, unit: UnitId) -> Option<GridPos> {
        let pos = self.positions.remove(&unit)?;
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|&u| u != unit);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
        Some(pos)
    }

    pub fn position(&self, unit: UnitId) -> Option<GridPos> {
        self.positions.get(&unit).copied()
    }

    /// Units within `radius` tiles of `center`, sorted for deterministic iteration
    pub fn query_radius(&self, center: GridPos, radius: f32) -> Vec<UnitId> {
        let reach = (radius.max(0.0) / self.cell_size as f32).ceil() as i32;
        let (cx, cy) = self.cell_coord(center);

        let mut found: Vec<UnitId> = (-reach..=reach)
            .flat_map(|dx| (-reach..=reach).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(|coord| self.cells.get(&coord))
            .flatten()
            .copied()
            .filter(|unit| {
                self.positions
                    .get(unit)
                    .is_some_and(|pos| center.distance(pos) <= radius)
            })
            .collect();
        found.sort();
        found
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, units: impl Iterator<Item = (UnitId, GridPos)>) {
        self.clear();
        for (unit, pos) in units {
            self.insert(unit, pos);
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
