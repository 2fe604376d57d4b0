//! Snapshot relay.
//!
//! Groups connected peers into rooms of bounded size and forwards each peer's
//! per-tick snapshot to the rest of its room. The relay never looks inside a
//! snapshot; it only routes.

use futures_util::{SinkExt, StreamExt};
use protocol::packets::{ClientPacket, RelayPacket};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod rooms;

pub use rooms::{Outgoing, RelayState};

/// Listener settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    pub max_room_players: usize,
}

/// Room state plus one outbound queue per connected peer.
struct Hub {
    state: RelayState,
    outboxes: HashMap<u32, mpsc::UnboundedSender<RelayPacket>>,
}

impl Hub {
    fn new(max_room_players: usize) -> Self {
        Self {
            state: RelayState::new(max_room_players),
            outboxes: HashMap::new(),
        }
    }

    fn register(&mut self, outbox: mpsc::UnboundedSender<RelayPacket>) -> u32 {
        let peer = self.state.next_peer_id();
        self.outboxes.insert(peer, outbox);
        peer
    }

    fn unregister(&mut self, peer: u32) {
        self.outboxes.remove(&peer);
        let out = self.state.leave(peer);
        self.deliver(out);
    }

    fn handle(&mut self, peer: u32, packet: ClientPacket) {
        let out = match packet {
            ClientPacket::JoinRoom => self.state.join(peer),
            ClientPacket::Update(snapshot) => self.state.update(peer, snapshot),
        };
        self.deliver(out);
    }

    fn deliver(&self, out: Vec<Outgoing>) {
        for Outgoing { to, packet } in out {
            match self.outboxes.get(&to) {
                Some(outbox) => {
                    // A closed outbox means the peer is already tearing down.
                    let _ = outbox.send(packet);
                }
                None => debug!("Dropping packet for unknown peer {}", to),
            }
        }
    }
}

/// Bind and serve until the listener fails.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Relay listening on ws://{}", addr);
    serve(listener, config.max_room_players).await
}

/// Accept WebSocket peers on an already bound listener.
pub async fn serve(listener: TcpListener, max_room_players: usize) -> anyhow::Result<()> {
    let hub = Arc::new(RwLock::new(Hub::new(max_room_players)));
    loop {
        let (stream, addr) = listener.accept().await?;
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, hub).await {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, hub: Arc<RwLock<Hub>>) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let peer = hub.write().await.register(outbox);
    info!("Peer {} connected from {}", peer, addr);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => match ClientPacket::parse(&data) {
                        Ok(packet) => hub.write().await.handle(peer, packet),
                        Err(e) => warn!("Packet error from {}: {}", addr, e),
                    },
                    Some(Ok(Message::Close(_))) => {
                        info!("Peer {} disconnected", peer);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            packet = inbox.recv() => {
                let Some(packet) = packet else {
                    break;
                };
                if let Err(e) = write.send(Message::Binary(packet.build().finish().to_vec().into())).await {
                    warn!("Failed to send to peer {}: {}", peer, e);
                    break;
                }
            }
        }
    }

    hub.write().await.unregister(peer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::packets::{Snapshot, build_join_room, build_update};
    use std::time::Duration;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn next_packet(client: &mut Client) -> RelayPacket {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("relay went quiet")
                .expect("stream ended")
                .expect("websocket error");
            if let Message::Binary(data) = msg {
                return RelayPacket::parse(&data).unwrap();
            }
        }
    }

    async fn send(client: &mut Client, packet: protocol::BinaryWriter) {
        client
            .send(Message::Binary(packet.finish().to_vec().into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_two_peers_share_a_room() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        tokio::spawn(serve(listener, 10));

        let (mut a, _) = connect_async(url.as_str()).await.unwrap();
        send(&mut a, build_join_room()).await;
        assert_eq!(next_packet(&mut a).await, RelayPacket::CurrentPlayers(vec![]));

        let (mut b, _) = connect_async(url.as_str()).await.unwrap();
        send(&mut b, build_join_room()).await;
        let RelayPacket::CurrentPlayers(others) = next_packet(&mut b).await else {
            panic!("expected current players");
        };
        assert_eq!(others.len(), 1);
        let a_id = others[0];
        let RelayPacket::PlayerJoined(b_id) = next_packet(&mut a).await else {
            panic!("expected player joined");
        };

        let snapshot = Snapshot { x: 10.0, y: 20.0, size: 40.0, mass: 4 };
        send(&mut b, build_update(&snapshot)).await;
        assert_eq!(
            next_packet(&mut a).await,
            RelayPacket::PlayerUpdate { peer_id: b_id, snapshot }
        );

        send(&mut a, build_update(&snapshot)).await;
        assert_eq!(
            next_packet(&mut b).await,
            RelayPacket::PlayerUpdate { peer_id: a_id, snapshot }
        );

        b.close(None).await.unwrap();
        assert_eq!(next_packet(&mut a).await, RelayPacket::PlayerLeft(b_id));
    }
}
