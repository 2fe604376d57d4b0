use crate::simulation::Simulation;
use crate::snake::{self, total_mass};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// A computer-controlled organism.
#[derive(Debug, Clone)]
pub struct Bot {
    /// Organism id.
    pub id: u32,
    /// Persisted wander heading (unit length).
    pub wander: Vec2,
    /// Translation to apply at the start of the next tick.
    pub intent: Vec2,
}

impl Bot {
    pub fn new(id: u32, wander: Vec2) -> Self {
        Self {
            id,
            wander,
            intent: Vec2::ZERO,
        }
    }

    /// Pick the next-tick translation and maybe toggle snake form.
    ///
    /// Separation from nearby bots is always added. On top of it the bot
    /// flees the nearest heavier organism, else chases the nearest lighter
    /// one, else heads for the nearest food, else wanders.
    pub fn update(&mut self, sim: &mut Simulation) {
        self.intent = Vec2::ZERO;
        let Some(me) = sim.world.organism(self.id) else {
            return;
        };
        if me.body.is_none() {
            return;
        }
        let pos = me.position();
        let speed = if me.is_snake() {
            sim.config.organism.snake_speed
        } else {
            sim.config.organism.speed
        };
        let my_mass = total_mass(&sim.world, self.id);
        let cfg = &sim.config.bots;

        let mut separation = Vec2::ZERO;
        let mut threat: Option<(f32, Vec2)> = None;
        let mut prey: Option<(f32, Vec2)> = None;
        for &other in &sim.world.organism_ids {
            if other == self.id {
                continue;
            }
            let Some(o) = sim.world.organism(other) else {
                continue;
            };
            if o.is_segment() {
                continue;
            }
            let delta = pos - o.position();
            let dist = delta.length();

            if o.role == crate::entity::Role::Bot && dist > 0.0 && dist < cfg.separation_radius {
                separation += delta / dist * (cfg.separation_radius - dist) / cfg.separation_radius;
            }

            let mass = total_mass(&sim.world, other);
            if mass == 0 {
                continue;
            }
            if mass > my_mass && dist < cfg.danger_radius {
                if threat.is_none_or(|(d, _)| dist < d) {
                    threat = Some((dist, o.position()));
                }
            } else if mass < my_mass && dist > cfg.min_engage_distance && dist < cfg.pursuit_radius {
                if prey.is_none_or(|(d, _)| dist < d) {
                    prey = Some((dist, o.position()));
                }
            }
        }

        let (food_radius, reroll, toggle_chance) =
            (cfg.food_radius, cfg.wander_reroll_chance, cfg.snake_toggle_chance);

        let primary = if let Some((_, at)) = threat {
            (pos - at).normalize_or_zero()
        } else if let Some((_, at)) = prey {
            (at - pos).normalize_or_zero()
        } else if let Some(at) = nearest_food(sim, self.id, pos, food_radius) {
            (at - pos).normalize_or_zero()
        } else {
            if self.wander == Vec2::ZERO || sim.rng.random_bool(reroll.clamp(0.0, 1.0)) {
                self.wander = Vec2::from_angle(sim.rng.random_range(0.0..TAU));
            }
            self.wander
        };

        self.intent = (separation + primary).normalize_or_zero() * speed;

        if sim.rng.random_bool(toggle_chance.clamp(0.0, 1.0)) {
            snake::toggle(sim, self.id);
        }
    }
}

fn nearest_food(sim: &mut Simulation, id: u32, pos: Vec2, radius: f32) -> Option<Vec2> {
    let now = sim.now_ms;
    let candidates = sim.world.food_index.find_in_radius(pos, radius);
    candidates
        .into_iter()
        .filter_map(|f| sim.world.food(f))
        .filter(|f| f.can_be_collected_by(id, now) && f.position.distance(pos) <= radius)
        .min_by(|a, b| a.position.distance_squared(pos).total_cmp(&b.position.distance_squared(pos)))
        .map(|f| f.position)
}
