//! Arena - headless simulation session

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,arena=debug")),
        )
        .init();

    info!("Voxel Arena v{}", env!("CARGO_PKG_VERSION"));

    let config = arena::Config::load()?;
    info!("Loaded configuration");
    info!("  World: {}x{}", config.world.width, config.world.height);
    info!("  Bots: {}, food target: {}", config.bots.count, config.food.target);
    match &config.relay.url {
        Some(url) => info!("  Relay: {}", url),
        None => info!("  Relay: offline"),
    }

    arena::session::run(config).await?;

    Ok(())
}
