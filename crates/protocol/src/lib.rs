//! Shared protocol crate for voxel-arena.
//!
//! This crate contains:
//! - Binary reading/writing utilities
//! - Relay packet definitions and builders
//! - Shared `Color` type

mod binary;
mod error;
pub mod packets;

pub use binary::{BinaryReader, BinaryWriter};
pub use error::ProtocolError;

/// RGB color used as an organism's style identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
