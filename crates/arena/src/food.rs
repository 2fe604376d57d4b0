//! Food and fragment pool.
//!
//! Spawned food and fragments ejected from organisms share one pool. Items are
//! sensor bodies: they drift under the physics step but never produce
//! collision events, so pickups are found by a per-tick proximity scan.

use crate::entity::{Block, Ejection, FoodItem};
use crate::layout;
use crate::physics::{BodyOptions, MotionState, PartDesc, PartTag};
use crate::simulation::Simulation;
use crate::world::World;
use glam::Vec2;
use tracing::debug;

/// Add a plain food item at `position`.
pub fn spawn_food_at(sim: &mut Simulation, position: Vec2) -> u32 {
    let size = sim.config.food.size;
    let color = World::random_color(&mut sim.rng);
    let id = sim.world.next_id();
    let item = FoodItem::new(id, position, size, color, sim.now_ms);
    register(sim, item, Vec2::ZERO)
}

/// Spawn up to `amount` items at random positions, never exceeding the target.
pub fn spawn_food(sim: &mut Simulation, amount: usize) -> usize {
    let room = sim
        .config
        .food
        .target
        .saturating_sub(sim.world.food_count());
    let amount = amount.min(room);
    for _ in 0..amount {
        let position = sim.world.border.random_position(&mut sim.rng);
        spawn_food_at(sim, position);
    }
    amount
}

/// Periodic refill towards the population target.
pub fn spawn_batch(sim: &mut Simulation) -> usize {
    let batch = sim.config.food.batch;
    let spawned = spawn_food(sim, batch);
    if spawned > 0 {
        debug!("Spawned {} food ({} total)", spawned, sim.world.food_count());
    }
    spawned
}

/// Turn a detached block into a standalone fragment at `position`.
pub fn eject_fragment(
    sim: &mut Simulation,
    block: Block,
    position: Vec2,
    emitter: u32,
    forbid_owner: bool,
    direction: Vec2,
) -> u32 {
    let now = sim.now_ms;
    let cfg = &sim.config.organism;
    let ejection = Ejection {
        emitter,
        forbid_owner,
        pickup_locked_until: now + cfg.self_pickup_lock_ms,
        enemy_locked_until: now + cfg.enemy_pickup_lock_ms,
    };
    let velocity = direction.normalize_or_zero() * cfg.eject_speed;
    let color = sim
        .world
        .organism(emitter)
        .map_or_else(|| World::random_color(&mut sim.rng), |o| o.color);

    let id = sim.world.next_id();
    let mut item = FoodItem::new(id, position, block.edge, color, now);
    item.kind = block.kind;
    item.ejection = Some(ejection);
    register(sim, item, velocity)
}

fn register(sim: &mut Simulation, mut item: FoodItem, velocity: Vec2) -> u32 {
    let body = sim.physics.create_compound(
        &[PartDesc::square(Vec2::ZERO, item.size, PartTag::Food(item.id))],
        MotionState {
            velocity,
            ..MotionState::at(item.position)
        },
        BodyOptions {
            sensor: true,
            air_friction: sim.config.organism.air_friction,
            group: 0,
        },
    );
    item.body = Some(body);
    sim.world.add_food(item)
}

/// Try to hand `food` to `consumer`.
///
/// Honours every pickup lock. The item only leaves the pool once the
/// consumer has grown by one block (or one segment for snakes).
pub fn collect_particle(sim: &mut Simulation, food: u32, consumer: u32) -> bool {
    let now = sim.now_ms;
    let Some(owner) = sim.world.organism(consumer).map(|o| o.owner_id()) else {
        return false;
    };
    if !sim
        .world
        .food(food)
        .is_some_and(|item| item.can_be_collected_by(owner, now))
    {
        return false;
    }
    if !layout::add_block(sim, owner) {
        return false;
    }
    let Some(item) = sim.world.food_mut(food) else {
        return false;
    };
    item.collected = true;
    if let Some(body) = item.body.take() {
        sim.physics.destroy(body);
    }
    sim.world.remove_food(food);
    true
}

/// Match every organism body against nearby items and collect what touches.
pub fn scan_contacts(sim: &mut Simulation) -> usize {
    let now = sim.now_ms;
    let max_food_half = sim.config.food.size.max(sim.config.organism.block_size) / 2.0;

    let mut contacts: Vec<(u32, u32)> = Vec::new();
    for &id in &sim.world.organism_ids {
        let Some(org) = sim.world.organisms.get(&id) else {
            continue;
        };
        if org.body.is_none() {
            continue;
        }
        let owner = org.owner_id();
        let reach = org.size / 2.0;
        let center = org.position();
        for food in sim.world.food_index.find_in_radius(center, reach + max_food_half) {
            let Some(item) = sim.world.foods.get(&food) else {
                continue;
            };
            if center.distance(item.position) < reach + item.size / 2.0
                && item.can_be_collected_by(owner, now)
            {
                contacts.push((food, id));
            }
        }
    }

    contacts
        .into_iter()
        .filter(|&(food, consumer)| collect_particle(sim, food, consumer))
        .count()
}

/// Copy sensor-body motion back into the pool and clamp items to the border.
pub fn sync_items(sim: &mut Simulation) {
    let border = sim.world.border;
    let moves: Vec<(u32, Vec2)> = sim
        .world
        .food_ids
        .iter()
        .filter_map(|id| {
            let item = sim.world.foods.get(id)?;
            let motion = sim.physics.motion(item.body?)?;
            (motion.position != item.position).then_some((*id, motion.position))
        })
        .collect();

    for (id, position) in moves {
        let half = sim.world.food(id).map_or(0.0, |f| f.size / 2.0);
        let clamped = border.clamp(position, half);
        if clamped != position {
            if let Some(body) = sim.world.food(id).and_then(|f| f.body) {
                sim.physics.set_position(body, clamped);
                sim.physics.set_velocity(body, Vec2::ZERO);
            }
        }
        sim.world.move_food(id, clamped);
    }
}
