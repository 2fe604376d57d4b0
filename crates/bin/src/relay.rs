//! Arena relay - room-based snapshot relay server

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Voxel Arena Relay v{}", env!("CARGO_PKG_VERSION"));

    // Shares arena.toml with the simulation binary
    let config = arena::Config::load()?.relay;
    info!("  Max players per room: {}", config.max_room_players);

    relay::run(relay::RelayConfig {
        bind: config.bind,
        port: config.port,
        max_room_players: config.max_room_players,
    })
    .await?;

    Ok(())
}
