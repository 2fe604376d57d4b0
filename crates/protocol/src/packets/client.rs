//! Client -> Relay packets.

use super::{ClientOpcode, Snapshot};
use crate::{BinaryReader, BinaryWriter, ProtocolError};

/// Parsed client packet.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    /// Join a room (0x01).
    JoinRoom,
    /// Organism snapshot (0x10).
    Update(Snapshot),
}

impl ClientPacket {
    /// Parse a client packet from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        let packet = match opcode {
            0x01 => ClientPacket::JoinRoom,
            0x10 => ClientPacket::Update(Snapshot::read(&mut reader)?),
            _ => return Err(ProtocolError::InvalidOpcode(opcode)),
        };
        reader.finish(opcode)?;
        Ok(packet)
    }

    /// Encode this packet.
    pub fn build(&self) -> BinaryWriter {
        match self {
            ClientPacket::JoinRoom => build_join_room(),
            ClientPacket::Update(snapshot) => build_update(snapshot),
        }
    }
}

/// Build a JoinRoom packet (0x01).
pub fn build_join_room() -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(1);
    w.put_u8(ClientOpcode::JoinRoom as u8);
    w
}

/// Build an Update packet (0x10).
pub fn build_update(snapshot: &Snapshot) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(1 + Snapshot::WIRE_LEN);
    w.put_u8(ClientOpcode::Update as u8);
    snapshot.write(&mut w);
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let snapshot = Snapshot { x: -12.5, y: 40.0, size: 60.0, mass: 7 };
        let data = build_update(&snapshot).finish();
        assert_eq!(data.len(), 17);
        assert_eq!(ClientPacket::parse(&data), Ok(ClientPacket::Update(snapshot)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(ClientPacket::parse(&[]), Err(ProtocolError::UnexpectedEof));
        assert_eq!(ClientPacket::parse(&[0x7F]), Err(ProtocolError::InvalidOpcode(0x7F)));
        assert_eq!(ClientPacket::parse(&[0x10, 0, 0]), Err(ProtocolError::UnexpectedEof));
        assert_eq!(
            ClientPacket::parse(&[0x01, 0xAA]),
            Err(ProtocolError::TrailingBytes { opcode: 0x01, extra: 1 })
        );
    }
}
