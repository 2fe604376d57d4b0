//! Block grid of one organism.
//!
//! Offsets live on a lattice of pitch `edge`. After a recenter the lattice is
//! shifted by the centroid, so occupancy is tested by half-edge overlap
//! instead of exact equality.

use super::block::{Block, BlockKind};
use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

const NEIGHBORS: [Vec2; 4] = [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y];

/// Unordered set of blocks with unique offsets.
#[derive(Debug, Clone)]
pub struct Grid {
    blocks: Vec<Block>,
    edge: f32,
}

impl Grid {
    /// Create an empty grid of blocks with edge length `edge`.
    pub fn new(edge: f32) -> Self {
        Self { blocks: Vec::new(), edge }
    }

    #[inline]
    pub fn edge(&self) -> f32 {
        self.edge
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether any block covers `offset`.
    pub fn is_occupied(&self, offset: Vec2) -> bool {
        self.blocks.iter().any(|b| b.occupies(offset))
    }

    /// Add a block at `offset`. Returns false if the site is taken.
    pub fn insert(&mut self, offset: Vec2, kind: BlockKind) -> bool {
        if self.is_occupied(offset) {
            return false;
        }
        self.blocks.push(Block::new(offset, kind, self.edge));
        true
    }

    /// Detach the block at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Block> {
        (index < self.blocks.len()).then(|| self.blocks.remove(index))
    }

    /// Keep only the block at `index`, returning the others in grid order.
    pub fn split_off_all_but(&mut self, index: usize) -> Vec<Block> {
        if index >= self.blocks.len() {
            return Vec::new();
        }
        let kept = self.blocks.remove(index);
        std::mem::replace(&mut self.blocks, vec![kept])
    }

    /// Index of the block to lose next: uniform over body blocks, falling
    /// back to any block when only special blocks remain.
    pub fn removal_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let body: Vec<usize> = (0..self.blocks.len())
            .filter(|&i| self.blocks[i].kind == BlockKind::Body)
            .collect();
        if let Some(&i) = body.choose(rng) {
            return Some(i);
        }
        (!self.blocks.is_empty()).then(|| rng.random_range(0..self.blocks.len()))
    }

    /// Choose where the next block attaches.
    ///
    /// Prefers a free 4-neighbour of an existing block; otherwise samples the
    /// bounding square (grown by one edge) for a free lattice site. An empty
    /// grid grows at the origin.
    pub fn pick_growth_site<R: Rng + ?Sized>(&self, rng: &mut R, attempts: u32) -> Option<Vec2> {
        let Some(anchor) = self.blocks.first().map(|b| b.offset) else {
            return Some(Vec2::ZERO);
        };

        let mut candidates: Vec<Vec2> = Vec::new();
        for block in &self.blocks {
            for dir in NEIGHBORS {
                let site = block.offset + dir * self.edge;
                if !self.is_occupied(site) && !candidates.iter().any(|c| c.distance_squared(site) < 1e-2) {
                    candidates.push(site);
                }
            }
        }
        if let Some(&site) = candidates.choose(rng) {
            return Some(site);
        }

        let (min, max) = self.extent()?;
        let lo = ((min - anchor) / self.edge).round() - Vec2::ONE;
        let hi = ((max - anchor) / self.edge).round() + Vec2::ONE;
        for _ in 0..attempts {
            let i = rng.random_range(lo.x as i32..=hi.x as i32) as f32;
            let j = rng.random_range(lo.y as i32..=hi.y as i32) as f32;
            let site = anchor + Vec2::new(i, j) * self.edge;
            if !self.is_occupied(site) {
                return Some(site);
            }
        }
        None
    }

    /// Mean of all block offsets.
    pub fn centroid(&self) -> Option<Vec2> {
        if self.blocks.is_empty() {
            return None;
        }
        let sum: Vec2 = self.blocks.iter().map(|b| b.offset).sum();
        Some(sum / self.blocks.len() as f32)
    }

    /// Shift every offset so the centroid sits at the origin. Returns the
    /// old centroid (zero for an empty grid).
    pub fn recenter(&mut self) -> Vec2 {
        let Some(centroid) = self.centroid() else {
            return Vec2::ZERO;
        };
        for block in &mut self.blocks {
            block.offset -= centroid;
        }
        centroid
    }

    /// Min and max block offsets.
    pub fn extent(&self) -> Option<(Vec2, Vec2)> {
        let first = self.blocks.first()?.offset;
        Some(
            self.blocks
                .iter()
                .fold((first, first), |(lo, hi), b| (lo.min(b.offset), hi.max(b.offset))),
        )
    }

    /// Bounding square edge: the larger span plus one block of margin.
    pub fn span_size(&self) -> f32 {
        match self.extent() {
            Some((lo, hi)) => (hi - lo).max_element() + self.edge,
            None => 0.0,
        }
    }

    /// No two blocks overlap.
    pub fn has_unique_offsets(&self) -> bool {
        self.blocks.iter().enumerate().all(|(i, a)| {
            self.blocks[i + 1..].iter().all(|b| !a.occupies(b.offset))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grid_of(offsets: &[(f32, f32)]) -> Grid {
        let mut grid = Grid::new(20.0);
        for &(x, y) in offsets {
            assert!(grid.insert(Vec2::new(x, y), BlockKind::Body));
        }
        grid
    }

    #[test]
    fn test_insert_rejects_occupied_site() {
        let mut grid = grid_of(&[(0.0, 0.0)]);
        assert!(!grid.insert(Vec2::new(4.0, -3.0), BlockKind::Body));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_growth_stays_contiguous_and_unique() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = Grid::new(20.0);
        for _ in 0..40 {
            let site = grid.pick_growth_site(&mut rng, 16).unwrap();
            assert!(grid.insert(site, BlockKind::Body));
            grid.recenter();
            assert!(grid.has_unique_offsets());
        }
        assert_eq!(grid.len(), 40);
        // Every block touches at least one other block edge-to-edge.
        for block in grid.blocks() {
            let touching = NEIGHBORS
                .iter()
                .any(|&dir| grid.is_occupied(block.offset + dir * 20.0));
            assert!(touching);
        }
    }

    #[test]
    fn test_recenter_and_span() {
        let mut grid = grid_of(&[(0.0, 0.0), (20.0, 0.0), (40.0, 0.0)]);
        assert_eq!(grid.recenter(), Vec2::new(20.0, 0.0));
        assert_eq!(grid.centroid(), Some(Vec2::ZERO));
        assert_eq!(grid.span_size(), 60.0);
        assert_eq!(Grid::new(20.0).span_size(), 0.0);
    }

    #[test]
    fn test_removal_prefers_body_blocks() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = grid_of(&[(0.0, 0.0)]);
        grid.insert(Vec2::new(20.0, 0.0), BlockKind::Eye);
        for _ in 0..20 {
            assert_eq!(grid.removal_index(&mut rng), Some(0));
        }
        grid.remove(0);
        assert_eq!(grid.removal_index(&mut rng), Some(0));
        assert_eq!(grid.blocks()[0].kind, BlockKind::Eye);
    }

    #[test]
    fn test_split_off_all_but_keeps_one() {
        let mut grid = grid_of(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)]);
        let rest = grid.split_off_all_but(1);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.blocks()[0].offset, Vec2::new(20.0, 0.0));
        assert_eq!(rest.len(), 2);
    }
}
