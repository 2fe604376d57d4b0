//! Simulation configuration.

use crate::error::ArenaError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub organism: OrganismConfig,
    #[serde(default)]
    pub snake: SnakeConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub bots: BotConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from `arena.toml` or write and use defaults.
    pub fn load() -> Result<Self, ArenaError> {
        Self::load_from(Path::new("arena.toml"))
    }

    /// Load configuration from `path`, creating it with defaults if missing.
    pub fn load_from(path: &Path) -> Result<Self, ArenaError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Parse a TOML document; missing keys fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ArenaError> {
        Ok(toml::from_str(contents)?)
    }
}

/// World bounds and clock.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_size")]
    pub width: f32,
    #[serde(default = "default_world_size")]
    pub height: f32,
    /// Tick interval in milliseconds; also the simulation clock step.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Fixed RNG seed (random when unset).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_size(),
            height: default_world_size(),
            tick_interval_ms: default_tick_interval(),
            seed: None,
        }
    }
}

fn default_world_size() -> f32 {
    5000.0
}
fn default_tick_interval() -> u64 {
    16
}

/// Organism body, movement and combat tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganismConfig {
    /// Edge length of one block.
    #[serde(default = "default_block_size")]
    pub block_size: f32,
    /// Blocks an organism spawns with.
    #[serde(default = "default_start_blocks")]
    pub start_blocks: usize,
    /// Translation per tick in normal form.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Translation per tick in snake form.
    #[serde(default = "default_snake_speed")]
    pub snake_speed: f32,
    /// Fraction of velocity lost per tick.
    #[serde(default = "default_air_friction")]
    pub air_friction: f32,
    #[serde(default = "default_hit_cooldown")]
    pub hit_cooldown_ms: u64,
    #[serde(default = "default_death_grace")]
    pub death_grace_ms: u64,
    #[serde(default = "default_hit_flash")]
    pub hit_flash_ms: u64,
    /// Ticks between two blocks moving from an eaten organism to its eater.
    #[serde(default = "default_eat_interval")]
    pub eat_interval_ticks: u32,
    /// Speed given to ejected fragments.
    #[serde(default = "default_eject_speed")]
    pub eject_speed: f32,
    /// Nobody may pick up a fresh fragment during this window.
    #[serde(default = "default_self_pickup_lock")]
    pub self_pickup_lock_ms: u64,
    /// Only the emitter may pick up a fragment during this window.
    #[serde(default = "default_enemy_pickup_lock")]
    pub enemy_pickup_lock_ms: u64,
    /// Rejection-sampling attempts when no adjacent growth site is free.
    #[serde(default = "default_growth_attempts")]
    pub growth_attempts: u32,
}

impl Default for OrganismConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            start_blocks: default_start_blocks(),
            speed: default_speed(),
            snake_speed: default_snake_speed(),
            air_friction: default_air_friction(),
            hit_cooldown_ms: default_hit_cooldown(),
            death_grace_ms: default_death_grace(),
            hit_flash_ms: default_hit_flash(),
            eat_interval_ticks: default_eat_interval(),
            eject_speed: default_eject_speed(),
            self_pickup_lock_ms: default_self_pickup_lock(),
            enemy_pickup_lock_ms: default_enemy_pickup_lock(),
            growth_attempts: default_growth_attempts(),
        }
    }
}

fn default_block_size() -> f32 {
    20.0
}
fn default_start_blocks() -> usize {
    4
}
fn default_speed() -> f32 {
    4.0
}
fn default_snake_speed() -> f32 {
    2.5
}
fn default_air_friction() -> f32 {
    0.1
}
fn default_hit_cooldown() -> u64 {
    500
}
fn default_death_grace() -> u64 {
    600
}
fn default_hit_flash() -> u64 {
    150
}
fn default_eat_interval() -> u32 {
    15
}
fn default_eject_speed() -> f32 {
    6.0
}
fn default_self_pickup_lock() -> u64 {
    300
}
fn default_enemy_pickup_lock() -> u64 {
    1500
}
fn default_growth_attempts() -> u32 {
    32
}

/// Snake form tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnakeConfig {
    #[serde(default = "default_toggle_cooldown")]
    pub toggle_cooldown_ms: u64,
    /// Upper bound on recorded head positions.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// History entries between consecutive segments.
    #[serde(default = "default_segment_step")]
    pub segment_step: usize,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            toggle_cooldown_ms: default_toggle_cooldown(),
            history_len: default_history_len(),
            segment_step: default_segment_step(),
        }
    }
}

fn default_toggle_cooldown() -> u64 {
    3000
}
fn default_history_len() -> usize {
    600
}
fn default_segment_step() -> usize {
    6
}

/// Food spawning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Population the spawner refills towards.
    #[serde(default = "default_food_target")]
    pub target: usize,
    /// Items added per refill.
    #[serde(default = "default_food_batch")]
    pub batch: usize,
    #[serde(default = "default_food_interval")]
    pub spawn_interval_ticks: u64,
    #[serde(default = "default_food_size")]
    pub size: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            target: default_food_target(),
            batch: default_food_batch(),
            spawn_interval_ticks: default_food_interval(),
            size: default_food_size(),
        }
    }
}

fn default_food_target() -> usize {
    250
}
fn default_food_batch() -> usize {
    5
}
fn default_food_interval() -> u64 {
    30
}
fn default_food_size() -> f32 {
    10.0
}

/// Bot population and steering radii.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_count")]
    pub count: usize,
    #[serde(default = "default_separation_radius")]
    pub separation_radius: f32,
    #[serde(default = "default_danger_radius")]
    pub danger_radius: f32,
    #[serde(default = "default_pursuit_radius")]
    pub pursuit_radius: f32,
    #[serde(default = "default_min_engage")]
    pub min_engage_distance: f32,
    #[serde(default = "default_food_radius")]
    pub food_radius: f32,
    /// Per-tick chance of picking a new wander direction.
    #[serde(default = "default_wander_reroll")]
    pub wander_reroll_chance: f64,
    /// Per-tick chance of toggling snake form.
    #[serde(default = "default_snake_toggle_chance")]
    pub snake_toggle_chance: f64,
    /// Replace destroyed bots with fresh ones.
    #[serde(default = "default_respawn")]
    pub respawn: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            count: default_bot_count(),
            separation_radius: default_separation_radius(),
            danger_radius: default_danger_radius(),
            pursuit_radius: default_pursuit_radius(),
            min_engage_distance: default_min_engage(),
            food_radius: default_food_radius(),
            wander_reroll_chance: default_wander_reroll(),
            snake_toggle_chance: default_snake_toggle_chance(),
            respawn: default_respawn(),
        }
    }
}

fn default_bot_count() -> usize {
    8
}
fn default_separation_radius() -> f32 {
    120.0
}
fn default_danger_radius() -> f32 {
    400.0
}
fn default_pursuit_radius() -> f32 {
    500.0
}
fn default_min_engage() -> f32 {
    30.0
}
fn default_food_radius() -> f32 {
    600.0
}
fn default_wander_reroll() -> f64 {
    0.02
}
fn default_snake_toggle_chance() -> f64 {
    0.002
}
fn default_respawn() -> bool {
    true
}

/// Snapshot relay settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Relay to join (`ws://host:port`); offline when unset.
    #[serde(default)]
    pub url: Option<String>,
    /// Bind address when running the relay.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_room_players")]
    pub max_room_players: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            bind: default_bind(),
            port: default_port(),
            max_room_players: default_max_room_players(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_max_room_players() -> usize {
    10
}
