//! Rigid-body seam.
//!
//! The simulation never integrates motion itself. It maps block grids to
//! compound bodies through [`PhysicsWorld`] and interprets the collision-begin
//! events the backend reports. [`ArcadePhysics`] is the in-crate backend used
//! by headless sessions and tests.

mod arcade;
pub mod geometry;

pub use arcade::ArcadePhysics;

use glam::Vec2;

/// Opaque handle to a body owned by the backend.
pub type BodyHandle = u32;

/// Back-reference from a body part to the entity that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartTag {
    Organism(u32),
    Food(u32),
}

impl PartTag {
    /// Organism id, if this part belongs to one.
    #[inline]
    pub fn organism(self) -> Option<u32> {
        match self {
            PartTag::Organism(id) => Some(id),
            PartTag::Food(_) => None,
        }
    }
}

/// One axis-aligned rectangular part, in the body's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartDesc {
    pub offset: Vec2,
    pub half_extents: Vec2,
    pub tag: PartTag,
}

impl PartDesc {
    /// A square part of edge `edge` centred on `offset`.
    pub fn square(offset: Vec2, edge: f32, tag: PartTag) -> Self {
        Self {
            offset,
            half_extents: Vec2::splat(edge / 2.0),
            tag,
        }
    }
}

/// Kinematic state captured from and restored onto a body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
}

impl MotionState {
    /// At rest at `position`.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Local offset expressed in world space.
    #[inline]
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(local)
    }
}

/// Creation flags for a body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyOptions {
    /// Sensors move but never produce collision events.
    pub sensor: bool,
    /// Fraction of velocity lost per step.
    pub air_friction: f32,
    /// Bodies sharing the same negative group never collide.
    pub group: i32,
}

/// A pair of parts that started touching during the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionStart {
    pub a: PartTag,
    pub b: PartTag,
}

/// What the simulation needs from a 2-D physics engine.
pub trait PhysicsWorld: Send {
    /// Compose `parts` into one compound body.
    fn create_compound(&mut self, parts: &[PartDesc], motion: MotionState, options: BodyOptions) -> BodyHandle;

    /// Remove a body, returning its last motion state.
    fn destroy(&mut self, body: BodyHandle) -> Option<MotionState>;

    fn motion(&self, body: BodyHandle) -> Option<MotionState>;

    fn translate(&mut self, body: BodyHandle, delta: Vec2);

    fn set_position(&mut self, body: BodyHandle, position: Vec2);

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    /// Number of live bodies, sensors included.
    fn body_count(&self) -> usize;

    /// Advance one tick.
    fn step(&mut self);

    /// Collision-begin events produced since the last drain.
    fn drain_collision_starts(&mut self) -> Vec<CollisionStart>;

    /// World-space vertices of every part. Index 0 is the outer hull of the
    /// compound body; the remaining entries are the block parts.
    fn part_vertices(&self, body: BodyHandle) -> Vec<Vec<Vec2>>;

    /// Whether `point` lies inside the body's hull.
    fn hull_contains(&self, body: BodyHandle, point: Vec2) -> bool;
}
