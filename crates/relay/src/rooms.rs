//! Room bookkeeping for the relay.
//!
//! Pure state: every operation returns the packets to deliver, so the
//! socket layer only has to route them.

use protocol::packets::{RelayPacket, Snapshot};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::collections::HashMap;
use tracing::{debug, info};

/// Length of generated room ids.
const ROOM_ID_LEN: usize = 9;

/// A packet addressed to one peer.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub to: u32,
    pub packet: RelayPacket,
}

#[derive(Debug)]
struct Room {
    id: String,
    /// Members in join order.
    peers: Vec<u32>,
}

/// Rooms and their members.
#[derive(Debug)]
pub struct RelayState {
    max_room_players: usize,
    /// Rooms in creation order; the first with space is reused.
    rooms: Vec<Room>,
    peer_rooms: HashMap<u32, String>,
    next_peer_id: u32,
}

impl RelayState {
    pub fn new(max_room_players: usize) -> Self {
        Self {
            max_room_players: max_room_players.max(1),
            rooms: Vec::new(),
            peer_rooms: HashMap::new(),
            next_peer_id: 1,
        }
    }

    /// Allocate an id for a new connection.
    pub fn next_peer_id(&mut self) -> u32 {
        let id = self.next_peer_id;
        self.next_peer_id = self.next_peer_id.wrapping_add(1);
        if self.next_peer_id == 0 {
            self.next_peer_id = 1;
        }
        id
    }

    /// Room the peer currently sits in.
    pub fn room_of(&self, peer: u32) -> Option<&str> {
        self.peer_rooms.get(&peer).map(String::as_str)
    }

    /// Members of a room, in join order.
    pub fn members(&self, room: &str) -> Option<&[u32]> {
        self.rooms.iter().find(|r| r.id == room).map(|r| r.peers.as_slice())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn find_room(&mut self) -> usize {
        if let Some(index) = self.rooms.iter().position(|r| r.peers.len() < self.max_room_players) {
            return index;
        }
        let mut rng = rand::rng();
        let id = loop {
            let candidate: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(ROOM_ID_LEN)
                .map(char::from)
                .collect();
            if self.rooms.iter().all(|r| r.id != candidate) {
                break candidate;
            }
        };
        debug!("Created room {}", id);
        self.rooms.push(Room { id, peers: Vec::new() });
        self.rooms.len() - 1
    }

    /// Put `peer` into a room with space.
    ///
    /// The joiner learns who is already there; everyone else learns about the
    /// joiner. Joining twice is ignored.
    pub fn join(&mut self, peer: u32) -> Vec<Outgoing> {
        if let Some(room) = self.room_of(peer) {
            debug!("Peer {} already in room {}", peer, room);
            return Vec::new();
        }
        let index = self.find_room();
        let room = &mut self.rooms[index];
        let others = room.peers.clone();
        room.peers.push(peer);
        self.peer_rooms.insert(peer, room.id.clone());
        info!("Peer {} in room {} ({} players)", peer, room.id, room.peers.len());

        let mut out = Vec::with_capacity(others.len() + 1);
        out.push(Outgoing {
            to: peer,
            packet: RelayPacket::CurrentPlayers(others.clone()),
        });
        out.extend(others.into_iter().map(|to| Outgoing {
            to,
            packet: RelayPacket::PlayerJoined(peer),
        }));
        out
    }

    /// Forward a snapshot to the rest of the sender's room. Dropped when the
    /// sender has not joined.
    pub fn update(&self, peer: u32, snapshot: Snapshot) -> Vec<Outgoing> {
        self.room_mates(peer)
            .map(|to| Outgoing {
                to,
                packet: RelayPacket::PlayerUpdate { peer_id: peer, snapshot },
            })
            .collect()
    }

    /// Remove a disconnected peer and tell its room.
    pub fn leave(&mut self, peer: u32) -> Vec<Outgoing> {
        let Some(room_id) = self.peer_rooms.remove(&peer) else {
            return Vec::new();
        };
        let Some(index) = self.rooms.iter().position(|r| r.id == room_id) else {
            return Vec::new();
        };
        let room = &mut self.rooms[index];
        room.peers.retain(|&p| p != peer);
        let out = room
            .peers
            .iter()
            .map(|&to| Outgoing {
                to,
                packet: RelayPacket::PlayerLeft(peer),
            })
            .collect();
        if room.peers.is_empty() {
            debug!("Room {} is empty, removing", room_id);
            self.rooms.remove(index);
        }
        out
    }

    fn room_mates(&self, peer: u32) -> impl Iterator<Item = u32> + '_ {
        self.room_of(peer)
            .and_then(|room| self.members(room))
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(move |&p| p != peer)
    }
}
