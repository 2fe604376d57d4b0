use super::bot::Bot;
use crate::entity::Role;
use crate::simulation::Simulation;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::debug;

/// Bot manager.
#[derive(Debug, Default)]
pub struct BotManager {
    /// Active bots.
    pub bots: Vec<Bot>,
}

impl BotManager {
    /// Create a new bot manager.
    pub fn new() -> Self {
        Self { bots: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// Spawn a fresh bot at a random position.
    pub fn add_bot(&mut self, sim: &mut Simulation) -> u32 {
        let position = sim.world.border.random_position(&mut sim.rng);
        let wander = Vec2::from_angle(sim.rng.random_range(0.0..TAU));
        let blocks = sim.config.organism.start_blocks;
        let id = sim.spawn_organism(Role::Bot, position, blocks);
        self.bots.push(Bot::new(id, wander));
        id
    }

    /// Forget destroyed bots and, when `spawn` is set, refill to the
    /// configured count. Returns the number of bots added.
    pub fn maintain(&mut self, sim: &mut Simulation, spawn: bool) -> usize {
        let before = self.bots.len();
        self.bots.retain(|b| sim.world.organism(b.id).is_some());
        if self.bots.len() < before {
            debug!("{} bots destroyed", before - self.bots.len());
        }
        if !spawn {
            return 0;
        }
        let missing = sim.config.bots.count.saturating_sub(self.bots.len());
        for _ in 0..missing {
            let id = self.add_bot(sim);
            debug!("Spawned bot {}", id);
        }
        missing
    }

    /// Update all bots.
    pub fn update(&mut self, sim: &mut Simulation) {
        for bot in &mut self.bots {
            bot.update(sim);
        }
    }

    /// Pending translation per bot organism.
    pub fn intents(&self) -> impl Iterator<Item = (u32, Vec2)> + '_ {
        self.bots.iter().map(|b| (b.id, b.intent))
    }
}
