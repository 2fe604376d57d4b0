//! Hash grid for proximity queries.

use fixedbitset::FixedBitSet;
use glam::Vec2;
use std::collections::HashMap;

/// Cells per axis.
const GRID_SIZE: usize = 32;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square of half-edge `radius` around `center`.
    #[inline]
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        }
    }

    /// Check if two bounds intersect. Touching edges do not count.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min.x >= self.max.x
            || other.max.x <= self.min.x
            || other.min.y >= self.max.y
            || other.max.y <= self.min.y)
    }
}

/// An indexed entry.
#[derive(Debug, Clone, Copy)]
pub struct SpatialItem {
    pub id: u32,
    pub position: Vec2,
    /// Half extent used for the cached bounds.
    pub radius: f32,
    pub bound: Bounds,
}

impl SpatialItem {
    #[inline]
    pub fn new(id: u32, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            position,
            radius,
            bound: Bounds::around(position, radius),
        }
    }
}

/// Uniform grid with flat item storage and O(1) removal.
pub struct SpatialHash {
    items: Vec<SpatialItem>,
    id_to_index: HashMap<u32, usize>,
    bounds: Bounds,
    cell_size: Vec2,
    /// Item indices per cell.
    cells: Vec<Vec<usize>>,
    dirty: bool,
    /// Items already reported by the running query.
    seen: FixedBitSet,
}

impl SpatialHash {
    /// Create an index covering `bounds`.
    pub fn new(bounds: Bounds) -> Self {
        let extent = (bounds.max - bounds.min).max(Vec2::ONE);
        Self {
            items: Vec::with_capacity(512),
            id_to_index: HashMap::with_capacity(512),
            bounds,
            cell_size: extent / GRID_SIZE as f32,
            cells: vec![Vec::new(); GRID_SIZE * GRID_SIZE],
            dirty: false,
            seen: FixedBitSet::with_capacity(512),
        }
    }

    #[inline]
    fn cell_range(&self, bound: &Bounds) -> (usize, usize, usize, usize) {
        let lo = ((bound.min - self.bounds.min) / self.cell_size).floor();
        let hi = ((bound.max - self.bounds.min) / self.cell_size).floor();
        let clamp = |v: f32| (v.max(0.0) as usize).min(GRID_SIZE - 1);
        (clamp(lo.x), clamp(hi.x), clamp(lo.y), clamp(hi.y))
    }

    /// Insert or update an item.
    pub fn insert(&mut self, item: SpatialItem) {
        match self.id_to_index.get(&item.id) {
            Some(&idx) => self.items[idx] = item,
            None => {
                self.id_to_index.insert(item.id, self.items.len());
                self.items.push(item);
            }
        }
        self.dirty = true;
    }

    /// Move an existing item.
    pub fn update(&mut self, id: u32, position: Vec2) {
        if let Some(&idx) = self.id_to_index.get(&id) {
            let radius = self.items[idx].radius;
            self.items[idx] = SpatialItem::new(id, position, radius);
            self.dirty = true;
        }
    }

    /// Remove an item by id.
    pub fn remove(&mut self, id: u32) {
        if let Some(idx) = self.id_to_index.remove(&id) {
            self.items.swap_remove(idx);
            if idx < self.items.len() {
                self.id_to_index.insert(self.items[idx].id, idx);
            }
            self.dirty = true;
        }
    }

    fn rebuild(&mut self) {
        if !self.dirty {
            return;
        }
        for cell in &mut self.cells {
            cell.clear();
        }
        for idx in 0..self.items.len() {
            let (x0, x1, y0, y1) = self.cell_range(&self.items[idx].bound);
            for gy in y0..=y1 {
                for gx in x0..=x1 {
                    self.cells[gy * GRID_SIZE + gx].push(idx);
                }
            }
        }
        self.dirty = false;
    }

    /// Ids of every item whose bounds intersect `bound`.
    pub fn find_in_bounds(&mut self, bound: &Bounds) -> Vec<u32> {
        self.rebuild();
        self.seen.clear();
        self.seen.grow(self.items.len());

        let (x0, x1, y0, y1) = self.cell_range(bound);
        let mut result = Vec::new();
        for gy in y0..=y1 {
            for gx in x0..=x1 {
                for &idx in &self.cells[gy * GRID_SIZE + gx] {
                    if self.seen.put(idx) {
                        continue;
                    }
                    let item = &self.items[idx];
                    if item.bound.intersects(bound) {
                        result.push(item.id);
                    }
                }
            }
        }
        result
    }

    /// Ids of items whose bounds intersect the square around `center`.
    #[inline]
    pub fn find_in_radius(&mut self, center: Vec2, radius: f32) -> Vec<u32> {
        self.find_in_bounds(&Bounds::around(center, radius))
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&SpatialItem> {
        self.id_to_index.get(&id).map(|&idx| &self.items[idx])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for SpatialHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialHash")
            .field("items", &self.items.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}
