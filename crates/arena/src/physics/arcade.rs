//! Minimal physics backend.
//!
//! Integrates velocities with air friction and reports collision-begin events
//! from separating-axis overlap tests. It does not resolve contacts: bodies
//! pass through each other, and the simulation reacts to the begin events.

use super::geometry::{bounds, convex_contains, convex_hull, polygons_overlap, rect_corners};
use super::{BodyHandle, BodyOptions, CollisionStart, MotionState, PartDesc, PartTag, PhysicsWorld};
use glam::Vec2;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug)]
struct Body {
    motion: MotionState,
    parts: Vec<PartDesc>,
    /// Hull in the local frame, counter-clockwise.
    hull: Vec<Vec2>,
    options: BodyOptions,
}

impl Body {
    fn world_parts(&self) -> Vec<[Vec2; 4]> {
        self.parts
            .iter()
            .map(|p| rect_corners(self.motion.to_world(p.offset), p.half_extents, self.motion.angle))
            .collect()
    }

    fn world_hull(&self) -> Vec<Vec2> {
        self.hull.iter().map(|&v| self.motion.to_world(v)).collect()
    }
}

/// Arcade-style backend: integration, group filtering and begin events.
#[derive(Debug, Default)]
pub struct ArcadePhysics {
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: BodyHandle,
    /// Body pairs overlapping after the previous step.
    touching: HashSet<(BodyHandle, BodyHandle)>,
    pending: Vec<CollisionStart>,
}

impl ArcadePhysics {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            ..Self::default()
        }
    }

    fn can_collide(a: &BodyOptions, b: &BodyOptions) -> bool {
        if a.sensor || b.sensor {
            return false;
        }
        !(a.group != 0 && a.group == b.group && a.group < 0)
    }

    /// First overlapping part pair between two bodies.
    fn first_contact(a: &Body, b: &Body) -> Option<(PartTag, PartTag)> {
        let (a_min, a_max) = bounds(&a.world_hull());
        let (b_min, b_max) = bounds(&b.world_hull());
        if a_max.x <= b_min.x || b_max.x <= a_min.x || a_max.y <= b_min.y || b_max.y <= a_min.y {
            return None;
        }

        let b_parts = b.world_parts();
        for (pa, poly_a) in a.parts.iter().zip(a.world_parts()) {
            for (pb, poly_b) in b.parts.iter().zip(&b_parts) {
                if polygons_overlap(&poly_a, poly_b) {
                    return Some((pa.tag, pb.tag));
                }
            }
        }
        None
    }
}

impl PhysicsWorld for ArcadePhysics {
    fn create_compound(&mut self, parts: &[PartDesc], motion: MotionState, options: BodyOptions) -> BodyHandle {
        let corners: Vec<Vec2> = parts
            .iter()
            .flat_map(|p| rect_corners(p.offset, p.half_extents, 0.0))
            .collect();
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        self.bodies.insert(
            handle,
            Body {
                motion,
                parts: parts.to_vec(),
                hull: convex_hull(&corners),
                options,
            },
        );
        handle
    }

    fn destroy(&mut self, body: BodyHandle) -> Option<MotionState> {
        self.touching.retain(|&(a, b)| a != body && b != body);
        self.bodies.remove(&body).map(|b| b.motion)
    }

    fn motion(&self, body: BodyHandle) -> Option<MotionState> {
        self.bodies.get(&body).map(|b| b.motion)
    }

    fn translate(&mut self, body: BodyHandle, delta: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.motion.position += delta;
        }
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.motion.position = position;
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.motion.velocity = velocity;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn step(&mut self) {
        for body in self.bodies.values_mut() {
            let keep = 1.0 - body.options.air_friction.clamp(0.0, 1.0);
            let m = &mut body.motion;
            m.position += m.velocity;
            m.angle += m.angular_velocity;
            m.velocity *= keep;
            m.angular_velocity *= keep;
        }

        let solid: Vec<(&BodyHandle, &Body)> = self.bodies.iter().filter(|(_, b)| !b.options.sensor).collect();
        let mut now_touching = HashSet::with_capacity(self.touching.len());
        for (i, &(&ha, a)) in solid.iter().enumerate() {
            for &(&hb, b) in &solid[i + 1..] {
                if !Self::can_collide(&a.options, &b.options) {
                    continue;
                }
                if let Some((ta, tb)) = Self::first_contact(a, b) {
                    now_touching.insert((ha, hb));
                    if !self.touching.contains(&(ha, hb)) {
                        self.pending.push(CollisionStart { a: ta, b: tb });
                    }
                }
            }
        }
        self.touching = now_touching;
    }

    fn drain_collision_starts(&mut self) -> Vec<CollisionStart> {
        std::mem::take(&mut self.pending)
    }

    fn part_vertices(&self, body: BodyHandle) -> Vec<Vec<Vec2>> {
        let Some(b) = self.bodies.get(&body) else {
            return Vec::new();
        };
        std::iter::once(b.world_hull())
            .chain(b.world_parts().into_iter().map(|corners| corners.to_vec()))
            .collect()
    }

    fn hull_contains(&self, body: BodyHandle, point: Vec2) -> bool {
        self.bodies
            .get(&body)
            .is_some_and(|b| convex_contains(&b.world_hull(), point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_body(physics: &mut ArcadePhysics, id: u32, at: Vec2, group: i32) -> BodyHandle {
        physics.create_compound(
            &[PartDesc::square(Vec2::ZERO, 20.0, PartTag::Organism(id))],
            MotionState::at(at),
            BodyOptions { group, ..BodyOptions::default() },
        )
    }

    #[test]
    fn test_begin_event_fires_once_per_contact() {
        let mut physics = ArcadePhysics::new();
        square_body(&mut physics, 1, Vec2::ZERO, 0);
        square_body(&mut physics, 2, Vec2::new(15.0, 0.0), 0);

        physics.step();
        let events = physics.drain_collision_starts();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].a, PartTag::Organism(1));
        assert_eq!(events[0].b, PartTag::Organism(2));

        physics.step();
        assert!(physics.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_shared_negative_group_never_collides() {
        let mut physics = ArcadePhysics::new();
        square_body(&mut physics, 1, Vec2::ZERO, -4);
        square_body(&mut physics, 2, Vec2::new(5.0, 0.0), -4);
        physics.step();
        assert!(physics.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_sensor_moves_without_events() {
        let mut physics = ArcadePhysics::new();
        square_body(&mut physics, 1, Vec2::ZERO, 0);
        let food = physics.create_compound(
            &[PartDesc::square(Vec2::ZERO, 10.0, PartTag::Food(9))],
            MotionState { velocity: Vec2::new(10.0, 0.0), ..MotionState::at(Vec2::ZERO) },
            BodyOptions { sensor: true, air_friction: 0.5, group: 0 },
        );
        physics.step();
        assert!(physics.drain_collision_starts().is_empty());
        let motion = physics.motion(food).unwrap();
        assert_eq!(motion.position, Vec2::new(10.0, 0.0));
        assert_eq!(motion.velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_part_vertices_lead_with_hull() {
        let mut physics = ArcadePhysics::new();
        let body = physics.create_compound(
            &[
                PartDesc::square(Vec2::new(-10.0, 0.0), 20.0, PartTag::Organism(1)),
                PartDesc::square(Vec2::new(10.0, 0.0), 20.0, PartTag::Organism(1)),
            ],
            MotionState::at(Vec2::new(100.0, 100.0)),
            BodyOptions::default(),
        );
        let parts = physics.part_vertices(body);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 4);
        assert!(physics.hull_contains(body, Vec2::new(119.0, 109.0)));
        assert!(!physics.hull_contains(body, Vec2::new(121.0, 100.0)));
    }
}
