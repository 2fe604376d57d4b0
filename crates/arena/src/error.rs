//! Error types surfaced by the arena crate.
//!
//! Simulation operations themselves never fail; these cover the edges of the
//! crate (configuration files and the relay link).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("Failed to access config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Relay link failed: {0}")]
    Relay(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Relay link closed")]
    RelayClosed,
}
