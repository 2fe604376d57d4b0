//! Voxel arena simulation library.
//!
//! Organisms are grids of square blocks backed by compound rigid bodies. The
//! tick loop in [`Simulation`] drives input, physics, combat, food pickup,
//! snake chains and bot steering in a fixed order.

pub mod ai;
pub mod combat;
pub mod config;
pub mod entity;
pub mod error;
pub mod food;
pub mod layout;
pub mod peers;
pub mod physics;
pub mod session;
pub mod simulation;
pub mod snake;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use error::ArenaError;
pub use simulation::{FoodView, OrganismView, SimEvent, EffectKind, Simulation, TickReport};
