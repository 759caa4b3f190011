//! Spatial queries for the tactical map

pub mod grid;
pub mod sparse_hash;

pub use grid::{SpatialGrid, TacticalGrid};
pub use sparse_hash::SparseHashGrid;
