//! Organism-versus-organism combat.
//!
//! Collision-begin events between two organism bodies are resolved once per
//! unordered pair per tick. A strictly heavier organism that fully contains
//! the other starts eating it; every other contact is a bounce that costs
//! both sides a block.

use crate::entity::{EatRelation, Role};
use crate::food;
use crate::layout;
use crate::simulation::{EffectKind, SimEvent, Simulation};
use crate::snake::total_mass;
use glam::Vec2;
use rand::Rng;
use std::collections::HashSet;
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Interpret this step's collision-begin events. Returns resolved pairs.
pub fn resolve_collisions(sim: &mut Simulation) -> usize {
    let events = sim.physics.drain_collision_starts();
    let mut processed: HashSet<(u32, u32)> = HashSet::with_capacity(events.len());
    let mut resolved = 0;

    for event in events {
        let (Some(a), Some(b)) = (event.a.organism(), event.b.organism()) else {
            continue;
        };
        if a == b || !processed.insert((a.min(b), a.max(b))) {
            continue;
        }
        if resolve_pair(sim, a, b) {
            resolved += 1;
        }
    }
    resolved
}

/// Resolve one contact between `a` and `b`. Returns false when it was ignored.
pub fn resolve_pair(sim: &mut Simulation, a: u32, b: u32) -> bool {
    let now = sim.now_ms;
    let window = sim.config.organism.hit_cooldown_ms;
    let (Some(oa), Some(ob)) = (sim.world.organism(a), sim.world.organism(b)) else {
        return false;
    };
    if oa.body.is_none() || ob.body.is_none() {
        return false;
    }
    if oa.hit_recently(b, now, window) || ob.hit_recently(a, now, window) {
        return false;
    }

    let mass_a = total_mass(&sim.world, a);
    let mass_b = total_mass(&sim.world, b);
    let (bigger, smaller, bigger_mass, smaller_mass) = if mass_a >= mass_b {
        (a, b, mass_a, mass_b)
    } else {
        (b, a, mass_b, mass_a)
    };

    for (id, peer) in [(a, b), (b, a)] {
        if let Some(org) = sim.world.organism_mut(id) {
            org.record_hit(peer, now, window);
        }
    }

    let guarded = sim
        .world
        .organism(smaller)
        .is_some_and(|o| !o.segments().is_empty());
    if bigger_mass > smaller_mass && !guarded && engulfs(sim, bigger, smaller) {
        start_eating(sim, bigger, smaller);
    } else {
        bounce(sim, a, b);
    }
    true
}

/// Whether every block part of `smaller` lies inside the hull of `bigger`.
pub fn engulfs(sim: &Simulation, bigger: u32, smaller: u32) -> bool {
    let (Some(big), Some(small)) = (
        sim.world.organism(bigger).and_then(|o| o.body),
        sim.world.organism(smaller).and_then(|o| o.body),
    ) else {
        return false;
    };
    let parts = sim.physics.part_vertices(small);
    parts.len() > 1
        && parts
            .iter()
            .skip(1)
            .flatten()
            .all(|&v| sim.physics.hull_contains(big, v))
}

fn start_eating(sim: &mut Simulation, eater: u32, target: u32) {
    let Some(org) = sim.world.organism_mut(eater) else {
        return;
    };
    if org.eating.is_some_and(|rel| rel.target == target) {
        return;
    }
    org.eating = Some(EatRelation {
        target,
        elapsed_ticks: 0,
    });
    debug!("Organism {} starts eating {}", eater, target);
}

fn bounce(sim: &mut Simulation, a: u32, b: u32) {
    let (Some(pa), Some(pb)) = (
        sim.world.organism(a).map(|o| o.position()),
        sim.world.organism(b).map(|o| o.position()),
    ) else {
        return;
    };
    let dir = (pb - pa).try_normalize().unwrap_or(Vec2::X);
    let push = dir * sim.config.organism.block_size / 4.0;
    for (id, delta) in [(a, -push), (b, push)] {
        if let Some(body) = sim.world.organism(id).and_then(|o| o.body) {
            sim.physics.translate(body, delta);
        }
    }

    remove_cube_blocks(sim, a, 1, Some(pb));
    remove_cube_blocks(sim, b, 1, Some(pa));
    sim.events.push(SimEvent::Effect {
        kind: EffectKind::Explosion,
        position: (pa + pb) / 2.0,
    });
}

/// Knock `count` blocks off `id` as fragments flying away from `aggressor`.
///
/// Snake heads lose their tail-most segment first. Fragments shed by a chain
/// can never be picked up again by the snake that lost them.
pub fn remove_cube_blocks(sim: &mut Simulation, id: u32, count: u32, aggressor: Option<Vec2>) -> u32 {
    let flash = sim.config.organism.hit_flash_ms;
    let mut removed = 0;
    for _ in 0..count {
        let Some(org) = sim.world.organism(id) else {
            break;
        };
        let owner = org.owner_id();
        let target = org.segments().last().copied().unwrap_or(id);
        let shed_by_chain = target != id || org.is_segment();

        let Some((block, at)) = layout::remove_block(sim, target, None) else {
            break;
        };
        let direction = aggressor
            .and_then(|p| (at - p).try_normalize())
            .unwrap_or_else(|| Vec2::from_angle(sim.rng.random_range(0.0..TAU)));
        food::eject_fragment(sim, block, at, owner, shed_by_chain, direction);

        let now = sim.now_ms;
        for flagged in [id, target] {
            if let Some(org) = sim.world.organism_mut(flagged) {
                org.hit_until = now + flash;
            }
        }
        settle_loss(sim, target);
        removed += 1;
    }
    removed
}

/// Arm the death timer of an emptied organism. Emptied segments go at once.
fn settle_loss(sim: &mut Simulation, id: u32) {
    let deadline = sim.now_ms + sim.config.organism.death_grace_ms;
    let Some(org) = sim.world.organism_mut(id) else {
        return;
    };
    if !org.grid.is_empty() || org.role == Role::Remote {
        return;
    }
    if org.is_segment() {
        destroy_organism(sim, id);
    } else if org.death_at.is_none() {
        org.death_at = Some(deadline);
        debug!("Organism {} emptied, destroyed at {}ms unless it regrows", id, deadline);
    }
}

fn eating_still_valid(sim: &Simulation, eater: u32, target: u32) -> bool {
    let (Some(e), Some(t)) = (sim.world.organism(eater), sim.world.organism(target)) else {
        return false;
    };
    e.body.is_some()
        && t.body.is_some()
        && !t.grid.is_empty()
        && t.segments().is_empty()
        && total_mass(&sim.world, target) < total_mass(&sim.world, eater)
        && e.position().distance(t.position()) <= e.size + t.size
}

/// Advance every eat relation by one tick. Returns blocks transferred.
pub fn progress_eating(sim: &mut Simulation) -> usize {
    let interval = sim.config.organism.eat_interval_ticks.max(1);
    let flash = sim.config.organism.hit_flash_ms;
    let eaters: Vec<(u32, EatRelation)> = sim
        .world
        .organism_ids
        .iter()
        .filter_map(|id| sim.world.organism(*id).and_then(|o| o.eating).map(|rel| (*id, rel)))
        .collect();

    let mut transfers = 0;
    for (eater, rel) in eaters {
        if !eating_still_valid(sim, eater, rel.target) {
            if let Some(org) = sim.world.organism_mut(eater) {
                org.eating = None;
            }
            debug!("Organism {} stops eating {}", eater, rel.target);
            continue;
        }

        let elapsed_ticks = rel.elapsed_ticks + 1;
        let done = elapsed_ticks >= interval;
        if let Some(org) = sim.world.organism_mut(eater) {
            org.eating = Some(EatRelation {
                target: rel.target,
                elapsed_ticks: if done { 0 } else { elapsed_ticks },
            });
        }
        if !done {
            continue;
        }

        if layout::remove_block(sim, rel.target, None).is_some() {
            let now = sim.now_ms;
            if let Some(org) = sim.world.organism_mut(rel.target) {
                org.hit_until = now + flash;
            }
            settle_loss(sim, rel.target);
            layout::add_block(sim, eater);
            transfers += 1;
        }

        let consumed = sim
            .world
            .organism(rel.target)
            .is_none_or(|t| t.grid.is_empty());
        if consumed {
            if let Some(org) = sim.world.organism_mut(eater) {
                org.eating = None;
            }
            debug!("Organism {} finished eating {}", eater, rel.target);
        }
    }
    transfers
}

/// Destroy emptied organisms whose grace period ran out. Returns the count.
pub fn process_death_timers(sim: &mut Simulation) -> usize {
    let now = sim.now_ms;
    let due: Vec<u32> = sim
        .world
        .organism_ids
        .iter()
        .copied()
        .filter(|id| {
            sim.world
                .organism(*id)
                .and_then(|o| o.death_at)
                .is_some_and(|at| now >= at)
        })
        .collect();

    let mut destroyed = 0;
    for id in due {
        let Some(org) = sim.world.organism_mut(id) else {
            continue;
        };
        if org.grid.is_empty() {
            destroy_organism(sim, id);
            destroyed += 1;
        } else {
            org.death_at = None;
        }
    }
    destroyed
}

/// Remove an organism, its body and any segments it owns, with no events.
pub(crate) fn discard(sim: &mut Simulation, id: u32) -> Option<crate::entity::Organism> {
    let org = sim.world.remove_organism(id)?;
    if let Some(body) = org.body {
        sim.physics.destroy(body);
    }
    for &seg in org.segments() {
        discard(sim, seg);
    }
    if let Some(parent) = org.parent {
        if let Some(snake) = sim.world.organism_mut(parent).and_then(|p| p.snake.as_mut()) {
            snake.segments.retain(|&s| s != id);
        }
    }
    Some(org)
}

/// Destroy an organism. Losing the local player ends the game.
pub fn destroy_organism(sim: &mut Simulation, id: u32) {
    let Some(org) = discard(sim, id) else {
        return;
    };
    sim.events.push(SimEvent::Effect {
        kind: EffectKind::DeathCloud,
        position: org.position(),
    });
    if sim.player == Some(id) {
        sim.game_over = true;
        sim.events.push(SimEvent::GameOver { organism: id });
        info!("Player organism {} destroyed, game over", id);
    } else {
        debug!("Organism {} destroyed", id);
    }
}
