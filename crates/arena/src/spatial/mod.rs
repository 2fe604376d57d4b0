//! Spatial indexing utilities.
//!
//! A uniform hash grid over the world bounds, rebuilt lazily before queries.

mod hash_grid;

pub use hash_grid::{Bounds, SpatialHash, SpatialItem};
