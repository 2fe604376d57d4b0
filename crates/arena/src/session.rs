//! Headless session runner.
//!
//! Drives a [`Simulation`] on a fixed interval, steers the local player with a
//! wandering pointer and, when a relay url is configured, exchanges one
//! snapshot per tick with the other peers in the room.

use crate::config::Config;
use crate::error::ArenaError;
use crate::peers::PeerEvent;
use crate::simulation::{SimEvent, Simulation};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use glam::Vec2;
use protocol::packets::{RelayPacket, Snapshot, build_join_room, build_update};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

type RelaySink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// WebSocket link to a snapshot relay.
pub struct RelayLink {
    write: RelaySink,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    reader: JoinHandle<()>,
}

impl RelayLink {
    /// Connect, join a room and start decoding inbound packets.
    pub async fn connect(url: &str) -> Result<Self, ArenaError> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();
        write
            .send(Message::Binary(build_join_room().finish().to_vec().into()))
            .await?;

        let (tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Binary(data)) => match RelayPacket::parse(&data) {
                        Ok(packet) => {
                            if tx.send(PeerEvent::from(packet)).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Bad relay packet: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Relay closed the link");
                        break;
                    }
                    Err(e) => {
                        error!("Relay error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        info!("Linked to relay at {}", url);
        Ok(Self { write, events, reader })
    }

    /// Publish the local organism.
    pub async fn send_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), ArenaError> {
        self.write
            .send(Message::Binary(build_update(snapshot).finish().to_vec().into()))
            .await?;
        Ok(())
    }

    /// Everything received since the last call.
    pub fn drain(&mut self) -> Result<Vec<PeerEvent>, ArenaError> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => out.push(event),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(out),
                Err(mpsc::error::TryRecvError::Disconnected) => return Err(ArenaError::RelayClosed),
            }
        }
    }
}

impl Drop for RelayLink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Wandering pointer for a player with no human attached.
#[derive(Debug, Clone)]
struct Pilot {
    heading: Vec2,
    /// Ticks between heading changes.
    period: u64,
}

impl Pilot {
    fn new(period: u64) -> Self {
        Self {
            heading: Vec2::X,
            period: period.max(1),
        }
    }

    fn steer<R: Rng + ?Sized>(&mut self, tick: u64, rng: &mut R) -> Vec2 {
        if tick % self.period == 0 {
            self.heading = Vec2::from_angle(rng.random_range(0.0..TAU));
        }
        self.heading
    }
}

/// Run a session until the local player dies or the process is interrupted.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let tick_interval_ms = config.world.tick_interval_ms.max(1);
    let relay_url = config.relay.url.clone();

    let mut sim = Simulation::new(config);
    info!("Initial world spawn...");
    sim.populate();
    let player = sim.spawn_player();

    let mut link = match relay_url {
        Some(url) => Some(RelayLink::connect(&url).await?),
        None => {
            info!("No relay configured, playing offline");
            None
        }
    };

    let mut pilot = Pilot::new(120);
    let mut rng = StdRng::from_os_rng();
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted, stopping session");
                break;
            }
        }

        if let Some(link) = link.as_mut() {
            for event in link.drain()? {
                sim.apply_peer_event(event);
            }
        }
        sim.set_pointer(pilot.steer(sim.tick_count(), &mut rng));

        let tick_start = std::time::Instant::now();
        let report = sim.tick();
        let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
        let tick_budget = tick_interval_ms as f64 * 0.9;
        if tick_ms > tick_budget {
            warn!(
                "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} organisms, {} food",
                report.tick, tick_ms, tick_budget, report.organisms, report.food
            );
        }

        for event in sim.drain_events() {
            match event {
                SimEvent::GameOver { organism } => info!("Organism {} was destroyed", organism),
                SimEvent::SnakeToggled { organism, snake } => debug!("Organism {} snake={}", organism, snake),
                SimEvent::Effect { kind, position } => trace!("{:?} at ({:.0}, {:.0})", kind, position.x, position.y),
            }
        }
        if sim.is_game_over() {
            info!("Game over for organism {} after {} ticks", player, report.tick);
            break;
        }

        if let (Some(link), Some(snapshot)) = (link.as_mut(), sim.local_snapshot()) {
            link.send_snapshot(&snapshot).await?;
        }
    }
    Ok(())
}
