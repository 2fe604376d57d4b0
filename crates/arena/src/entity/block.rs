//! Block: one cell of an organism's grid.

use glam::Vec2;

/// Material of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockKind {
    /// Plain body tissue. Lost first when an organism is damaged.
    #[default]
    Body,
    /// Decorative face block; kept as the head when turning into a snake.
    Eye,
}

/// A square cell at a local offset within its organism's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub offset: Vec2,
    pub kind: BlockKind,
    pub edge: f32,
}

impl Block {
    pub fn new(offset: Vec2, kind: BlockKind, edge: f32) -> Self {
        Self { offset, kind, edge }
    }

    /// Whether this block covers the lattice site at `offset`.
    #[inline]
    pub fn occupies(&self, offset: Vec2) -> bool {
        let half = self.edge / 2.0;
        (self.offset.x - offset.x).abs() < half && (self.offset.y - offset.y).abs() < half
    }
}
