//! World state management.
//!
//! Owns every organism and food item by id, plus the spatial index over food.

use crate::entity::{FoodItem, Organism};
use crate::spatial::{Bounds, SpatialHash, SpatialItem};
use glam::Vec2;
use protocol::Color;
use rand::Rng;
use std::collections::HashMap;

/// World border bounds, centred on the origin.
#[derive(Debug, Clone, Copy)]
pub struct WorldBorder {
    pub min: Vec2,
    pub max: Vec2,
    pub width: f32,
    pub height: f32,
}

impl WorldBorder {
    pub fn new(width: f32, height: f32) -> Self {
        let half = Vec2::new(width, height) / 2.0;
        Self {
            min: -half,
            max: half,
            width,
            height,
        }
    }

    /// Uniformly random position inside the border.
    #[inline]
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.random_range(self.min.x..self.max.x),
            rng.random_range(self.min.y..self.max.y),
        )
    }

    /// Keep a square of half-edge `half` inside the border.
    #[inline]
    pub fn clamp(&self, position: Vec2, half: f32) -> Vec2 {
        let lo = self.min + Vec2::splat(half);
        let hi = self.max - Vec2::splat(half);
        // A body wider than the world is pinned to the centre line.
        Vec2::new(
            if lo.x <= hi.x { position.x.clamp(lo.x, hi.x) } else { 0.0 },
            if lo.y <= hi.y { position.y.clamp(lo.y, hi.y) } else { 0.0 },
        )
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }
}

/// Item and organism storage.
#[derive(Debug)]
pub struct World {
    next_node_id: u32,

    pub(crate) organisms: HashMap<u32, Organism>,
    /// Organism ids in insertion order (swap-removed).
    pub organism_ids: Vec<u32>,
    organism_pos: HashMap<u32, usize>,

    pub(crate) foods: HashMap<u32, FoodItem>,
    pub food_ids: Vec<u32>,
    food_pos: HashMap<u32, usize>,

    pub border: WorldBorder,

    /// Food proximity index.
    pub food_index: SpatialHash,
}

impl World {
    /// Create a new world with the given border size.
    pub fn new(width: f32, height: f32) -> Self {
        let border = WorldBorder::new(width, height);
        Self {
            next_node_id: 1,
            organisms: HashMap::with_capacity(64),
            organism_ids: Vec::with_capacity(64),
            organism_pos: HashMap::with_capacity(64),
            foods: HashMap::with_capacity(512),
            food_ids: Vec::with_capacity(512),
            food_pos: HashMap::with_capacity(512),
            food_index: SpatialHash::new(border.bounds()),
            border,
        }
    }

    /// Get the next entity ID. Organisms and food share the sequence.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_node_id;
        self.next_node_id = self.next_node_id.wrapping_add(1);
        if self.next_node_id == 0 {
            self.next_node_id = 1; // Skip 0
        }
        id
    }

    #[inline]
    pub fn organism(&self, id: u32) -> Option<&Organism> {
        self.organisms.get(&id)
    }

    #[inline]
    pub fn organism_mut(&mut self, id: u32) -> Option<&mut Organism> {
        self.organisms.get_mut(&id)
    }

    pub fn add_organism(&mut self, organism: Organism) -> u32 {
        let id = organism.id;
        self.organism_pos.insert(id, self.organism_ids.len());
        self.organism_ids.push(id);
        self.organisms.insert(id, organism);
        id
    }

    pub fn remove_organism(&mut self, id: u32) -> Option<Organism> {
        let organism = self.organisms.remove(&id)?;
        if let Some(idx) = self.organism_pos.remove(&id) {
            self.organism_ids.swap_remove(idx);
            if let Some(&moved) = self.organism_ids.get(idx) {
                self.organism_pos.insert(moved, idx);
            }
        }
        Some(organism)
    }

    #[inline]
    pub fn food(&self, id: u32) -> Option<&FoodItem> {
        self.foods.get(&id)
    }

    #[inline]
    pub fn food_mut(&mut self, id: u32) -> Option<&mut FoodItem> {
        self.foods.get_mut(&id)
    }

    pub fn add_food(&mut self, item: FoodItem) -> u32 {
        let id = item.id;
        self.food_index
            .insert(SpatialItem::new(id, item.position, item.size / 2.0));
        self.food_pos.insert(id, self.food_ids.len());
        self.food_ids.push(id);
        self.foods.insert(id, item);
        id
    }

    pub fn remove_food(&mut self, id: u32) -> Option<FoodItem> {
        let item = self.foods.remove(&id)?;
        self.food_index.remove(id);
        if let Some(idx) = self.food_pos.remove(&id) {
            self.food_ids.swap_remove(idx);
            if let Some(&moved) = self.food_ids.get(idx) {
                self.food_pos.insert(moved, idx);
            }
        }
        Some(item)
    }

    /// Move a food item and keep the index in sync.
    pub fn move_food(&mut self, id: u32, position: Vec2) {
        if let Some(item) = self.foods.get_mut(&id) {
            item.position = position;
            self.food_index.update(id, position);
        }
    }

    #[inline]
    pub fn organism_count(&self) -> usize {
        self.organism_ids.len()
    }

    #[inline]
    pub fn food_count(&self) -> usize {
        self.food_ids.len()
    }

    /// Random bright color.
    pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
        Color::new(
            rng.random_range(50..=255),
            rng.random_range(50..=255),
            rng.random_range(50..=255),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Role;

    #[test]
    fn test_next_id_skips_zero() {
        let mut world = World::new(100.0, 100.0);
        world.next_node_id = u32::MAX;
        assert_eq!(world.next_id(), u32::MAX);
        assert_eq!(world.next_id(), 1);
    }

    #[test]
    fn test_swap_remove_keeps_positions() {
        let mut world = World::new(100.0, 100.0);
        for _ in 0..3 {
            let id = world.next_id();
            world.add_organism(Organism::new(id, Role::Bot, Color::default(), 20.0, Vec2::ZERO));
        }
        assert!(world.remove_organism(1).is_some());
        assert_eq!(world.organism_ids, vec![3, 2]);
        assert!(world.remove_organism(3).is_some());
        assert_eq!(world.organism_ids, vec![2]);
        assert!(world.remove_organism(3).is_none());
    }

    #[test]
    fn test_food_index_follows_moves() {
        let mut world = World::new(1000.0, 1000.0);
        let id = world.next_id();
        world.add_food(FoodItem::new(id, Vec2::ZERO, 10.0, Color::default(), 0));
        world.move_food(id, Vec2::new(300.0, 300.0));
        assert!(world.food_index.find_in_radius(Vec2::ZERO, 20.0).is_empty());
        assert_eq!(world.food_index.find_in_radius(Vec2::new(300.0, 300.0), 20.0), vec![id]);
        world.remove_food(id);
        assert_eq!(world.food_count(), 0);
        assert!(world.food_index.is_empty());
    }

    #[test]
    fn test_border_clamp() {
        let border = WorldBorder::new(100.0, 100.0);
        assert_eq!(border.clamp(Vec2::new(80.0, -10.0), 10.0), Vec2::new(40.0, -10.0));
        assert_eq!(border.clamp(Vec2::new(80.0, 0.0), 60.0).x, 0.0);
    }
}
