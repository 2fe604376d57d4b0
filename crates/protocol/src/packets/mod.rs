//! Packet definitions for the snapshot relay.
//!
//! This module contains both client->relay and relay->client packet types.

mod client;
mod relay;

pub use client::*;
pub use relay::*;

/// Opcodes for client -> relay packets.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOpcode {
    /// Ask to be placed in a room.
    JoinRoom = 0x01,
    /// Per-tick snapshot of the sender's organism.
    Update = 0x10,
}

/// Opcodes for relay -> client packets.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOpcode {
    /// Snapshot of another peer in the room.
    PlayerUpdate = 0x10,
    /// Peers already in the room when joining.
    CurrentPlayers = 0x30,
    /// A peer entered the room.
    PlayerJoined = 0x31,
    /// A peer left the room.
    PlayerLeft = 0x32,
}

/// Position and size of one organism as broadcast once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub mass: u32,
}

impl Snapshot {
    pub(crate) const WIRE_LEN: usize = 16;

    pub(crate) fn write(&self, w: &mut crate::BinaryWriter) {
        w.put_f32(self.x);
        w.put_f32(self.y);
        w.put_f32(self.size);
        w.put_u32(self.mass);
    }

    pub(crate) fn read(r: &mut crate::BinaryReader) -> Result<Self, crate::ProtocolError> {
        Ok(Self {
            x: r.get_f32()?,
            y: r.get_f32()?,
            size: r.get_f32()?,
            mass: r.get_u32()?,
        })
    }
}
