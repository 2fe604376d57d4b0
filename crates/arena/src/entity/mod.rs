//! Simulation entities.
//!
//! Organisms are block grids with an optional compound body; food items are
//! single-square sensors, either spawned or ejected from an organism.

mod block;
mod food;
mod grid;
mod organism;

pub use block::{Block, BlockKind};
pub use food::{Ejection, FoodItem};
pub use grid::Grid;
pub use organism::{EatRelation, Organism, Role, SnakeState};
