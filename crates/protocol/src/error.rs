//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while parsing relay packets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid packet opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Unexpected end of data")]
    UnexpectedEof,

    #[error("Packet {opcode:#04x} has {extra} trailing bytes")]
    TrailingBytes { opcode: u8, extra: usize },
}
