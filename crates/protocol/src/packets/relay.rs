//! Relay -> Client packets.

use super::{RelayOpcode, Snapshot};
use crate::{BinaryReader, BinaryWriter, ProtocolError};

/// Parsed relay packet.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayPacket {
    /// Another peer's snapshot (0x10).
    PlayerUpdate { peer_id: u32, snapshot: Snapshot },
    /// Peers already present in the joined room (0x30).
    CurrentPlayers(Vec<u32>),
    /// A peer joined the room (0x31).
    PlayerJoined(u32),
    /// A peer left the room (0x32).
    PlayerLeft(u32),
}

impl RelayPacket {
    /// Parse a relay packet from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        let packet = match opcode {
            0x10 => {
                let peer_id = reader.get_u32()?;
                let snapshot = Snapshot::read(&mut reader)?;
                RelayPacket::PlayerUpdate { peer_id, snapshot }
            }
            0x30 => {
                let count = reader.get_u16()? as usize;
                let mut peers = Vec::with_capacity(count.min(reader.remaining() / 4));
                for _ in 0..count {
                    peers.push(reader.get_u32()?);
                }
                RelayPacket::CurrentPlayers(peers)
            }
            0x31 => RelayPacket::PlayerJoined(reader.get_u32()?),
            0x32 => RelayPacket::PlayerLeft(reader.get_u32()?),
            _ => return Err(ProtocolError::InvalidOpcode(opcode)),
        };
        reader.finish(opcode)?;
        Ok(packet)
    }

    /// Encode this packet.
    pub fn build(&self) -> BinaryWriter {
        match self {
            RelayPacket::PlayerUpdate { peer_id, snapshot } => build_player_update(*peer_id, snapshot),
            RelayPacket::CurrentPlayers(peers) => build_current_players(peers),
            RelayPacket::PlayerJoined(peer_id) => build_peer_event(RelayOpcode::PlayerJoined, *peer_id),
            RelayPacket::PlayerLeft(peer_id) => build_peer_event(RelayOpcode::PlayerLeft, *peer_id),
        }
    }
}

/// Build a PlayerUpdate packet (0x10).
pub fn build_player_update(peer_id: u32, snapshot: &Snapshot) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(5 + Snapshot::WIRE_LEN);
    w.put_u8(RelayOpcode::PlayerUpdate as u8);
    w.put_u32(peer_id);
    snapshot.write(&mut w);
    w
}

/// Build a CurrentPlayers packet (0x30).
///
/// Rooms are small, so the peer list is capped at `u16::MAX` entries.
pub fn build_current_players(peers: &[u32]) -> BinaryWriter {
    let count = peers.len().min(u16::MAX as usize);
    let mut w = BinaryWriter::with_capacity(3 + count * 4);
    w.put_u8(RelayOpcode::CurrentPlayers as u8);
    w.put_u16(count as u16);
    for &peer in &peers[..count] {
        w.put_u32(peer);
    }
    w
}

/// Build a PlayerJoined (0x31) or PlayerLeft (0x32) packet.
pub fn build_peer_event(opcode: RelayOpcode, peer_id: u32) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(5);
    w.put_u8(opcode as u8);
    w.put_u32(peer_id);
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_players_layout() {
        let data = build_current_players(&[3, 9]).finish();
        assert_eq!(&data[..3], &[0x30, 2, 0]);
        assert_eq!(
            RelayPacket::parse(&data),
            Ok(RelayPacket::CurrentPlayers(vec![3, 9]))
        );
    }

    #[test]
    fn test_current_players_count_exceeds_body() {
        // Claims two peers but only carries one.
        let data = [0x30, 2, 0, 1, 0, 0, 0];
        assert_eq!(RelayPacket::parse(&data), Err(ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_player_update_carries_peer_id() {
        let snapshot = Snapshot { x: 1.0, y: 2.0, size: 40.0, mass: 3 };
        let data = build_player_update(77, &snapshot).finish();
        match RelayPacket::parse(&data) {
            Ok(RelayPacket::PlayerUpdate { peer_id, snapshot: parsed }) => {
                assert_eq!(peer_id, 77);
                assert_eq!(parsed, snapshot);
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }
}
