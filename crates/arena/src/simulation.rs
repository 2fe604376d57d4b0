//! The tick loop.
//!
//! [`Simulation`] owns all state and runs one fixed-order step per tick:
//!
//! 1. pointer and bot intents become body translations
//! 2. the physics backend integrates
//! 3. body motion is copied back and clamped to the border
//! 4. snake segments follow their heads
//! 5. collision-begin events go to the combat resolver
//! 6. food contacts are collected and eat relations advance
//! 7. expired death timers fire, food refills, bots decide

use crate::ai::BotManager;
use crate::combat;
use crate::config::Config;
use crate::entity::{Block, BlockKind, FoodItem, Organism, Role};
use crate::food;
use crate::layout;
use crate::peers::{self, PeerEvent, PeerMirror};
use crate::physics::{ArcadePhysics, PhysicsWorld};
use crate::snake;
use crate::world::World;
use glam::Vec2;
use protocol::Color;
use protocol::packets::Snapshot;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Presentation-only effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Puff where two organisms bounced.
    Explosion,
    /// Cloud where an organism was destroyed.
    DeathCloud,
}

/// Notifications for the presentation layer and the session runner.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Effect { kind: EffectKind, position: Vec2 },
    SnakeToggled { organism: u32, snake: bool },
    /// The local player was destroyed. Terminal.
    GameOver { organism: u32 },
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub organisms: usize,
    pub food: usize,
    pub collisions: usize,
    pub pickups: usize,
    pub transfers: usize,
    pub destroyed: usize,
}

/// Read-only organism state for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganismView {
    pub id: u32,
    pub role: Role,
    pub color: Color,
    pub position: Vec2,
    pub angle: f32,
    pub size: f32,
    pub mass: u32,
    pub hit: bool,
    pub snake: bool,
    pub parent: Option<u32>,
    pub blocks: Vec<Block>,
}

/// Read-only food state for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodView {
    pub id: u32,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
    pub kind: BlockKind,
    /// Rotation phase in radians.
    pub spin: f32,
}

/// Spin rate of food squares, radians per millisecond.
const FOOD_SPIN_RATE: f32 = 0.002;

/// Owned simulation state.
pub struct Simulation {
    pub(crate) config: Config,
    pub(crate) physics: Box<dyn PhysicsWorld>,
    pub(crate) world: World,
    pub(crate) bots: BotManager,
    pub(crate) peers: PeerMirror,
    pub(crate) rng: StdRng,
    /// Simulation clock, advanced by the tick interval.
    pub(crate) now_ms: u64,
    pub(crate) tick_count: u64,
    pub(crate) player: Option<u32>,
    pub(crate) pointer: Vec2,
    pub(crate) game_over: bool,
    pub(crate) events: Vec<SimEvent>,
}

impl Simulation {
    /// Simulation backed by the in-crate physics.
    pub fn new(config: Config) -> Self {
        Self::with_physics(config, Box::new(ArcadePhysics::new()))
    }

    /// Simulation backed by a caller-provided physics engine.
    pub fn with_physics(config: Config, physics: Box<dyn PhysicsWorld>) -> Self {
        let rng = match config.world.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let world = World::new(config.world.width, config.world.height);
        info!(
            "Simulation ready: {}x{} world, {}ms ticks",
            config.world.width, config.world.height, config.world.tick_interval_ms
        );
        Self {
            config,
            physics,
            world,
            bots: BotManager::new(),
            peers: PeerMirror::default(),
            rng,
            now_ms: 0,
            tick_count: 0,
            player: None,
            pointer: Vec2::ZERO,
            game_over: false,
            events: Vec::new(),
        }
    }

    /// Fill the food pool to its target and spawn the configured bots.
    pub fn populate(&mut self) {
        let target = self.config.food.target;
        let food = food::spawn_food(self, target);
        let mut bots = std::mem::take(&mut self.bots);
        let spawned = bots.maintain(self, true);
        self.bots = bots;
        info!("World initialized: {} food, {} bots", food, spawned);
    }

    /// Create an organism of `blocks` blocks (at least one) packed into a
    /// square, centred on `position`. The first block is the eye.
    pub fn spawn_organism(&mut self, role: Role, position: Vec2, blocks: usize) -> u32 {
        let blocks = blocks.max(1);
        let edge = self.config.organism.block_size;
        let id = self.world.next_id();
        let color = World::random_color(&mut self.rng);
        let mut org = Organism::new(id, role, color, edge, position);

        let cols = (blocks as f32).sqrt().ceil().max(1.0) as usize;
        let offsets: Vec<Vec2> = (0..blocks)
            .map(|i| Vec2::new((i % cols) as f32, (i / cols) as f32) * edge)
            .collect();
        let centroid = offsets.iter().copied().sum::<Vec2>() / blocks.max(1) as f32;
        for (i, offset) in offsets.into_iter().enumerate() {
            let kind = if i == 0 { BlockKind::Eye } else { BlockKind::Body };
            org.grid.insert(offset - centroid, kind);
        }

        self.world.add_organism(org);
        layout::rebuild_layout(self, id);
        id
    }

    /// Spawn the local player at a random position.
    pub fn spawn_player(&mut self) -> u32 {
        let position = self.world.border.random_position(&mut self.rng);
        let blocks = self.config.organism.start_blocks;
        let id = self.spawn_organism(Role::Player, position, blocks);
        self.player = Some(id);
        self.game_over = false;
        info!("Player spawned as organism {} at ({:.0}, {:.0})", id, position.x, position.y);
        id
    }

    /// Steer the local player; `direction` is relative to its position.
    pub fn set_pointer(&mut self, direction: Vec2) {
        self.pointer = direction;
    }

    /// Grow an organism by one block (or segment).
    pub fn add_block(&mut self, id: u32) -> bool {
        layout::add_block(self, id)
    }

    /// Detach one block without ejecting it.
    pub fn remove_block(&mut self, id: u32, index: Option<usize>) -> bool {
        layout::remove_block(self, id, index).is_some()
    }

    pub fn toggle_snake(&mut self, id: u32) -> bool {
        snake::toggle(self, id)
    }

    pub fn spawn_food_at(&mut self, position: Vec2) -> u32 {
        food::spawn_food_at(self, position)
    }

    pub fn apply_peer_event(&mut self, event: PeerEvent) {
        peers::apply(self, event);
    }

    /// Run one tick.
    pub fn tick(&mut self) -> TickReport {
        self.tick_count += 1;
        self.now_ms += self.config.world.tick_interval_ms;

        self.apply_movement();
        self.physics.step();
        self.sync_bodies();
        snake::update_snakes(self);

        let mut report = TickReport {
            tick: self.tick_count,
            ..TickReport::default()
        };
        report.collisions = combat::resolve_collisions(self);
        report.pickups = food::scan_contacts(self);
        report.transfers = combat::progress_eating(self);
        report.destroyed = combat::process_death_timers(self);

        if self.tick_count % self.config.food.spawn_interval_ticks.max(1) == 0 {
            food::spawn_batch(self);
        }

        let respawn = self.config.bots.respawn;
        let mut bots = std::mem::take(&mut self.bots);
        bots.maintain(self, respawn);
        bots.update(self);
        self.bots = bots;

        report.organisms = self.world.organism_count();
        report.food = self.world.food_count();
        if self.tick_count % 400 == 0 {
            debug!(
                "Tick {}: {} organisms, {} food, {} bots, {} ghosts, {} bodies",
                self.tick_count,
                report.organisms,
                report.food,
                self.bots.len(),
                self.peers.len(),
                self.physics.body_count()
            );
        }
        report
    }

    fn apply_movement(&mut self) {
        let (speed, snake_speed) = (self.config.organism.speed, self.config.organism.snake_speed);
        if let Some(org) = self.player.and_then(|id| self.world.organism(id)) {
            if let Some(body) = org.body {
                let speed = if org.is_snake() { snake_speed } else { speed };
                let delta = self.pointer.normalize_or_zero() * speed;
                if delta != Vec2::ZERO {
                    self.physics.translate(body, delta);
                }
            }
        }
        for (id, intent) in self.bots.intents() {
            if let Some(body) = self.world.organism(id).and_then(|o| o.body) {
                self.physics.translate(body, intent);
            }
        }
    }

    fn sync_bodies(&mut self) {
        let border = self.world.border;
        for org in self.world.organisms.values_mut() {
            let Some(body) = org.body else {
                continue;
            };
            let Some(mut motion) = self.physics.motion(body) else {
                continue;
            };
            let clamped = border.clamp(motion.position, org.size / 2.0);
            if clamped != motion.position {
                self.physics.set_position(body, clamped);
                motion.position = clamped;
            }
            org.motion = motion;
        }
        food::sync_items(self);
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[inline]
    pub fn player_id(&self) -> Option<u32> {
        self.player
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[inline]
    pub fn organism(&self, id: u32) -> Option<&Organism> {
        self.world.organism(id)
    }

    #[inline]
    pub fn organism_ids(&self) -> &[u32] {
        &self.world.organism_ids
    }

    /// Own mass plus snake segments.
    pub fn total_mass(&self, id: u32) -> u32 {
        snake::total_mass(&self.world, id)
    }

    #[inline]
    pub fn food(&self, id: u32) -> Option<&FoodItem> {
        self.world.food(id)
    }

    #[inline]
    pub fn food_ids(&self) -> &[u32] {
        &self.world.food_ids
    }

    #[inline]
    pub fn food_count(&self) -> usize {
        self.world.food_count()
    }

    #[inline]
    pub fn bots(&self) -> &BotManager {
        &self.bots
    }

    #[inline]
    pub fn peers(&self) -> &PeerMirror {
        &self.peers
    }

    /// What the relay gets once per tick: the local player's position,
    /// size and total mass.
    pub fn local_snapshot(&self) -> Option<Snapshot> {
        let org = self.world.organism(self.player?)?;
        Some(Snapshot {
            x: org.position().x,
            y: org.position().y,
            size: org.size,
            mass: self.total_mass(org.id),
        })
    }

    pub fn organism_views(&self) -> Vec<OrganismView> {
        self.world
            .organism_ids
            .iter()
            .filter_map(|id| self.world.organism(*id))
            .map(|o| OrganismView {
                id: o.id,
                role: o.role,
                color: o.color,
                position: o.position(),
                angle: o.motion.angle,
                size: o.size,
                mass: o.mass,
                hit: o.is_hit(self.now_ms),
                snake: o.is_snake(),
                parent: o.parent,
                blocks: o.grid.blocks().to_vec(),
            })
            .collect()
    }

    pub fn food_views(&self) -> Vec<FoodView> {
        self.world
            .food_ids
            .iter()
            .filter_map(|id| self.world.food(*id))
            .map(|f| FoodView {
                id: f.id,
                position: f.position,
                size: f.size,
                color: f.color,
                kind: f.kind,
                spin: (self.now_ms.saturating_sub(f.born_ms) as f32 * FOOD_SPIN_RATE) % TAU,
            })
            .collect()
    }

    /// Take every event raised since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.food.target = 0;
        config.bots.count = 0;
        config.world.seed = Some(1);
        config
    }

    #[test]
    fn test_spawn_packs_blocks_around_position() {
        let mut sim = Simulation::new(quiet_config());
        let id = sim.spawn_organism(Role::Bot, Vec2::new(50.0, 50.0), 4);
        let org = sim.organism(id).unwrap();
        assert_eq!(org.position(), Vec2::new(50.0, 50.0));
        assert_eq!(org.mass, 4);
        assert_eq!(org.size, 40.0);
        assert_eq!(org.grid.blocks()[0].kind, BlockKind::Eye);
    }

    #[test]
    fn test_spawn_never_creates_empty_organism() {
        let mut config = quiet_config();
        config.organism.start_blocks = 0;
        let mut sim = Simulation::new(config);
        let id = sim.spawn_player();
        let org = sim.organism(id).unwrap();
        assert_eq!(org.mass, 1);
        assert!(org.body.is_some());
        assert_eq!(sim.physics.body_count(), 1);
    }

    #[test]
    fn test_clock_advances_per_tick() {
        let mut sim = Simulation::new(quiet_config());
        let report = sim.tick();
        assert_eq!(report.tick, 1);
        assert_eq!(sim.now_ms(), 16);
    }

    #[test]
    fn test_pointer_moves_player() {
        let mut sim = Simulation::new(quiet_config());
        let id = sim.spawn_organism(Role::Player, Vec2::ZERO, 4);
        sim.player = Some(id);
        let start = sim.organism(id).unwrap().position();
        sim.set_pointer(Vec2::new(10.0, 0.0));
        sim.tick();
        let moved = sim.organism(id).unwrap().position() - start;
        assert!((moved.x - sim.config().organism.speed).abs() < 1e-3);
        assert!(moved.y.abs() < 1e-3);
    }

    #[test]
    fn test_snake_player_moves_at_snake_speed() {
        let mut sim = Simulation::new(quiet_config());
        let id = sim.spawn_organism(Role::Player, Vec2::ZERO, 4);
        sim.player = Some(id);
        assert!(sim.toggle_snake(id));
        let start = sim.organism(id).unwrap().position();
        sim.set_pointer(Vec2::new(0.0, -3.0));
        sim.tick();
        let moved = sim.organism(id).unwrap().position() - start;
        assert!((moved.y + sim.config().organism.snake_speed).abs() < 1e-3);
        assert!(moved.x.abs() < 1e-3);
    }

    #[test]
    fn test_bodies_clamped_to_border() {
        let mut sim = Simulation::new(quiet_config());
        let id = sim.spawn_organism(Role::Bot, Vec2::new(2490.0, 0.0), 4);
        sim.tick();
        assert_eq!(sim.organism(id).unwrap().position().x, 2480.0);
    }

    #[test]
    fn test_local_snapshot_and_views() {
        let mut sim = Simulation::new(quiet_config());
        assert!(sim.local_snapshot().is_none());
        let id = sim.spawn_player();
        sim.spawn_food_at(Vec2::new(1000.0, 1000.0));
        let snapshot = sim.local_snapshot().unwrap();
        assert_eq!(snapshot.mass, 4);
        assert_eq!(snapshot.size, 40.0);

        let views = sim.organism_views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, id);
        assert_eq!(views[0].blocks.len(), 4);
        assert_eq!(sim.food_views().len(), 1);
    }

    #[test]
    fn test_losing_player_ends_game() {
        let mut sim = Simulation::new(quiet_config());
        let id = sim.spawn_player();
        combat::destroy_organism(&mut sim, id);
        assert!(sim.is_game_over());
        assert!(sim.drain_events().contains(&SimEvent::GameOver { organism: id }));
        assert!(sim.drain_events().is_empty());
    }
}
