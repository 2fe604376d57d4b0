//! Ghost organisms mirrored from relay peers.

use crate::combat;
use crate::entity::Organism;
use crate::simulation::Simulation;
use crate::world::World;
use glam::Vec2;
use protocol::packets::{RelayPacket, Snapshot};
use std::collections::HashMap;
use tracing::{debug, info};

/// Inbound relay traffic, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// Peers already present when we joined.
    CurrentPlayers(Vec<u32>),
    Joined(u32),
    Update { peer: u32, snapshot: Snapshot },
    Left(u32),
}

impl From<RelayPacket> for PeerEvent {
    fn from(packet: RelayPacket) -> Self {
        match packet {
            RelayPacket::CurrentPlayers(peers) => PeerEvent::CurrentPlayers(peers),
            RelayPacket::PlayerJoined(peer) => PeerEvent::Joined(peer),
            RelayPacket::PlayerUpdate { peer_id, snapshot } => PeerEvent::Update { peer: peer_id, snapshot },
            RelayPacket::PlayerLeft(peer) => PeerEvent::Left(peer),
        }
    }
}

/// Relay peer id -> ghost organism id.
#[derive(Debug, Default)]
pub struct PeerMirror {
    ghosts: HashMap<u32, u32>,
}

impl PeerMirror {
    /// Ghost organism standing in for `peer`.
    pub fn ghost_of(&self, peer: u32) -> Option<u32> {
        self.ghosts.get(&peer).copied()
    }

    pub fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghosts.is_empty()
    }
}

fn ensure_ghost(sim: &mut Simulation, peer: u32) -> u32 {
    if let Some(id) = sim.peers.ghost_of(peer) {
        return id;
    }
    let id = sim.world.next_id();
    let color = World::random_color(&mut sim.rng);
    let edge = sim.config.organism.block_size;
    sim.world
        .add_organism(Organism::ghost(id, color, edge, Vec2::ZERO));
    sim.peers.ghosts.insert(peer, id);
    info!("Peer {} joined as ghost {}", peer, id);
    id
}

/// Apply one relay event to the mirror.
pub fn apply(sim: &mut Simulation, event: PeerEvent) {
    match event {
        PeerEvent::CurrentPlayers(peers) => {
            for peer in peers {
                ensure_ghost(sim, peer);
            }
        }
        PeerEvent::Joined(peer) => {
            ensure_ghost(sim, peer);
        }
        PeerEvent::Update { peer, snapshot } => {
            let id = ensure_ghost(sim, peer);
            if let Some(ghost) = sim.world.organism_mut(id) {
                ghost.motion.position = Vec2::new(snapshot.x, snapshot.y);
                ghost.size = snapshot.size;
                ghost.mass = snapshot.mass;
            }
        }
        PeerEvent::Left(peer) => {
            if let Some(id) = sim.peers.ghosts.remove(&peer) {
                combat::discard(sim, id);
                info!("Peer {} left", peer);
            } else {
                debug!("Unknown peer {} left", peer);
            }
        }
    }
}
