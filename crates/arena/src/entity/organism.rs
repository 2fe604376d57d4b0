//! Organism: a growable block grid.

use super::grid::Grid;
use crate::physics::{BodyHandle, MotionState};
use glam::Vec2;
use protocol::Color;
use std::collections::{HashMap, VecDeque};

/// Who drives an organism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Local player steered by the pointer.
    Player,
    /// Computer-controlled.
    Bot,
    /// Ghost mirrored from a relay peer. Has no body and no grid.
    Remote,
}

/// Active gradual-consumption relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EatRelation {
    pub target: u32,
    pub elapsed_ticks: u32,
}

/// Trailing chain of a snake head.
#[derive(Debug, Clone, Default)]
pub struct SnakeState {
    /// Segment organism ids, head end first.
    pub segments: Vec<u32>,
    /// Recent head positions, newest first.
    pub history: VecDeque<Vec2>,
    /// Block offsets relative to the head block at the moment of the toggle.
    pub saved_offsets: Vec<Vec2>,
}

#[derive(Debug, Clone)]
pub struct Organism {
    pub id: u32,
    pub role: Role,
    pub color: Color,
    pub grid: Grid,
    /// Block count of this organism's own grid.
    pub mass: u32,
    /// Bounding square edge of the grid.
    pub size: f32,
    pub body: Option<BodyHandle>,
    /// Last motion state read from the body (or mirrored for ghosts).
    pub motion: MotionState,
    /// Peer id -> time of the last resolved hit.
    pub hit_cooldowns: HashMap<u32, u64>,
    /// Hit flash stays on until this time.
    pub hit_until: u64,
    /// Owning snake head when this organism is a segment.
    pub parent: Option<u32>,
    pub snake: Option<SnakeState>,
    pub snake_toggled_at: Option<u64>,
    pub eating: Option<EatRelation>,
    /// Destruction deadline while the grid is empty.
    pub death_at: Option<u64>,
    pub collision_group: i32,
}

impl Organism {
    pub fn new(id: u32, role: Role, color: Color, block_size: f32, position: Vec2) -> Self {
        Self {
            id,
            role,
            color,
            grid: Grid::new(block_size),
            mass: 0,
            size: 0.0,
            body: None,
            motion: MotionState::at(position),
            hit_cooldowns: HashMap::new(),
            hit_until: 0,
            parent: None,
            snake: None,
            snake_toggled_at: None,
            eating: None,
            death_at: None,
            collision_group: 0,
        }
    }

    /// Body-less mirror of a relay peer.
    pub fn ghost(id: u32, color: Color, block_size: f32, position: Vec2) -> Self {
        Self::new(id, Role::Remote, color, block_size, position)
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.motion.position
    }

    #[inline]
    pub fn is_segment(&self) -> bool {
        self.parent.is_some()
    }

    #[inline]
    pub fn is_snake(&self) -> bool {
        self.snake.is_some()
    }

    /// Segment ids in chain order (empty outside snake form).
    pub fn segments(&self) -> &[u32] {
        self.snake.as_ref().map_or(&[], |s| s.segments.as_slice())
    }

    /// Id that owns this organism's pickups and fragments.
    #[inline]
    pub fn owner_id(&self) -> u32 {
        self.parent.unwrap_or(self.id)
    }

    #[inline]
    pub fn is_hit(&self, now: u64) -> bool {
        now < self.hit_until
    }

    /// Whether a hit against `peer` was resolved within `window` ms.
    pub fn hit_recently(&self, peer: u32, now: u64, window: u64) -> bool {
        self.hit_cooldowns
            .get(&peer)
            .is_some_and(|&at| now.saturating_sub(at) < window)
    }

    /// Stamp a hit against `peer` and forget stamps older than `window`.
    pub fn record_hit(&mut self, peer: u32, now: u64, window: u64) {
        self.hit_cooldowns.retain(|_, at| now.saturating_sub(*at) < window);
        self.hit_cooldowns.insert(peer, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_cooldown_window() {
        let mut org = Organism::new(1, Role::Bot, Color::default(), 20.0, Vec2::ZERO);
        assert!(!org.hit_recently(2, 1000, 500));
        org.record_hit(2, 1000, 500);
        assert!(org.hit_recently(2, 1499, 500));
        assert!(!org.hit_recently(2, 1500, 500));
        assert!(!org.hit_recently(3, 1200, 500));
    }

    #[test]
    fn test_stale_hits_are_pruned() {
        let mut org = Organism::new(1, Role::Bot, Color::default(), 20.0, Vec2::ZERO);
        org.record_hit(2, 1000, 500);
        org.record_hit(3, 1200, 500);
        assert_eq!(org.hit_cooldowns.len(), 2);
        org.record_hit(4, 1600, 500);
        assert_eq!(org.hit_cooldowns.len(), 2);
        assert!(!org.hit_cooldowns.contains_key(&2));
        assert!(org.hit_recently(3, 1600, 500));
    }

    #[test]
    fn test_segment_owner() {
        let mut seg = Organism::new(5, Role::Bot, Color::default(), 20.0, Vec2::ZERO);
        assert_eq!(seg.owner_id(), 5);
        seg.parent = Some(2);
        assert!(seg.is_segment());
        assert_eq!(seg.owner_id(), 2);
        assert!(seg.segments().is_empty());
    }
}
