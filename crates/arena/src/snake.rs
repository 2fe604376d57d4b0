//! Snake form.
//!
//! A snake head keeps a single block; every other block becomes a one-block
//! segment organism that trails the head along its recorded path. Heads and
//! their segments share a negative collision group so the chain never hits
//! itself.

use crate::combat;
use crate::entity::{BlockKind, Organism, Role, SnakeState};
use crate::layout::rebuild_layout;
use crate::simulation::{SimEvent, Simulation};
use crate::world::World;
use glam::Vec2;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Own mass plus the mass of every trailing segment.
pub fn total_mass(world: &World, id: u32) -> u32 {
    let Some(org) = world.organism(id) else {
        return 0;
    };
    org.mass
        + org
            .segments()
            .iter()
            .filter_map(|s| world.organism(*s))
            .map(|s| s.mass)
            .sum::<u32>()
}

/// Switch between normal and snake form, honouring the toggle cooldown.
pub fn toggle(sim: &mut Simulation, id: u32) -> bool {
    let cooldown = sim.config.snake.toggle_cooldown_ms;
    let now = sim.now_ms;
    let Some(org) = sim.world.organism(id) else {
        return false;
    };
    if org.role == Role::Remote || org.is_segment() {
        return false;
    }
    if org.snake_toggled_at.is_some_and(|at| now < at + cooldown) {
        return false;
    }

    let entering = !org.is_snake();
    let changed = if entering { enter(sim, id) } else { exit(sim, id) };
    if changed {
        if let Some(org) = sim.world.organism_mut(id) {
            org.snake_toggled_at = Some(now);
        }
        info!("Organism {} {} snake form", id, if entering { "entered" } else { "left" });
        sim.events.push(SimEvent::SnakeToggled { organism: id, snake: entering });
    }
    changed
}

fn enter(sim: &mut Simulation, id: u32) -> bool {
    let step = sim.config.snake.segment_step.max(1);
    let Some(org) = sim.world.organism_mut(id) else {
        return false;
    };
    if org.grid.is_empty() {
        return false;
    }
    if let Some(motion) = org.body.and_then(|b| sim.physics.motion(b)) {
        org.motion = motion;
    }

    let head_index = org
        .grid
        .blocks()
        .iter()
        .position(|b| b.kind == BlockKind::Eye)
        .unwrap_or(0);
    let head_offset = org.grid.blocks()[head_index].offset;
    let head_pos = org.motion.to_world(head_offset);
    let rest = org.grid.split_off_all_but(head_index);

    let back = -org.motion.velocity.try_normalize().unwrap_or(Vec2::X);
    let spacing = org.grid.edge() / step as f32;
    let history: VecDeque<Vec2> = (0..=(rest.len() + 1) * step)
        .map(|i| head_pos + back * spacing * i as f32)
        .collect();
    let placements: Vec<(Vec2, BlockKind)> = rest
        .iter()
        .enumerate()
        .map(|(k, b)| (history[(k + 1) * step], b.kind))
        .collect();

    org.collision_group = -(id as i32);
    org.snake = Some(SnakeState {
        segments: Vec::with_capacity(rest.len()),
        history,
        saved_offsets: rest.iter().map(|b| b.offset - head_offset).collect(),
    });
    rebuild_layout(sim, id);

    for (at, kind) in placements {
        spawn_segment(sim, id, at, kind);
    }
    true
}

fn exit(sim: &mut Simulation, id: u32) -> bool {
    let attempts = sim.config.organism.growth_attempts;
    let Some(snake) = sim.world.organism_mut(id).and_then(|o| o.snake.take()) else {
        return false;
    };

    let kinds: Vec<BlockKind> = snake
        .segments
        .iter()
        .map(|s| {
            sim.world
                .organism(*s)
                .and_then(|o| o.grid.blocks().first())
                .map_or(BlockKind::Body, |b| b.kind)
        })
        .collect();
    for &seg in &snake.segments {
        combat::discard(sim, seg);
    }

    let Some(org) = sim.world.organism_mut(id) else {
        return false;
    };
    org.collision_group = 0;
    let anchor = org.grid.blocks().first().map_or(Vec2::ZERO, |b| b.offset);
    for (i, kind) in kinds.into_iter().enumerate() {
        let restored = snake
            .saved_offsets
            .get(i)
            .is_some_and(|&offset| org.grid.insert(anchor + offset, kind));
        if !restored {
            if let Some(site) = org.grid.pick_growth_site(&mut sim.rng, attempts) {
                org.grid.insert(site, kind);
            }
        }
    }
    rebuild_layout(sim, id);
    true
}

/// Create a one-block segment trailing `head` at `position`.
fn spawn_segment(sim: &mut Simulation, head: u32, position: Vec2, kind: BlockKind) -> Option<u32> {
    let (role, color, group, edge) = {
        let org = sim.world.organism(head)?;
        (org.role, org.color, org.collision_group, org.grid.edge())
    };
    let seg_id = sim.world.next_id();
    let mut seg = Organism::new(seg_id, role, color, edge, position);
    seg.parent = Some(head);
    seg.collision_group = group;
    seg.grid.insert(Vec2::ZERO, kind);
    sim.world.add_organism(seg);
    rebuild_layout(sim, seg_id);

    if let Some(snake) = sim.world.organism_mut(head).and_then(|o| o.snake.as_mut()) {
        snake.segments.push(seg_id);
    }
    Some(seg_id)
}

/// Grow a snake by one segment at the tail end of its history.
pub fn append_segment(sim: &mut Simulation, head: u32) -> bool {
    let step = sim.config.snake.segment_step.max(1);
    let Some(org) = sim.world.organism_mut(head) else {
        return false;
    };
    let spacing = org.grid.edge() / step as f32;
    let Some(snake) = org.snake.as_mut() else {
        return false;
    };

    let index = (snake.segments.len() + 1) * step;
    while snake.history.len() <= index {
        let len = snake.history.len();
        let last = snake.history.back().copied().unwrap_or(org.motion.position);
        let dir = if len >= 2 {
            (last - snake.history[len - 2]).try_normalize().unwrap_or(Vec2::NEG_X)
        } else {
            Vec2::NEG_X
        };
        snake.history.push_back(last + dir * spacing);
    }
    let at = snake.history[index];
    debug!("Snake {} grows to {} segments", head, snake.segments.len() + 1);
    spawn_segment(sim, head, at, BlockKind::Body).is_some()
}

/// Record head positions and drag every segment to its lagged history slot.
pub fn update_snakes(sim: &mut Simulation) {
    let step = sim.config.snake.segment_step.max(1);
    let history_len = sim.config.snake.history_len;
    let heads: Vec<u32> = sim
        .world
        .organism_ids
        .iter()
        .copied()
        .filter(|id| sim.world.organism(*id).is_some_and(Organism::is_snake))
        .collect();

    for head in heads {
        let Some(org) = sim.world.organism_mut(head) else {
            continue;
        };
        let position = org.position();
        let Some(snake) = org.snake.as_mut() else {
            continue;
        };
        snake.history.push_front(position);
        let needed = (snake.segments.len() + 1) * step + 1;
        snake.history.truncate(history_len.max(needed));

        let last = snake.history.len() - 1;
        let placements: Vec<(u32, Vec2)> = snake
            .segments
            .iter()
            .enumerate()
            .map(|(k, &seg)| (seg, snake.history[((k + 1) * step).min(last)]))
            .collect();

        for (seg, at) in placements {
            let Some(seg_org) = sim.world.organism_mut(seg) else {
                continue;
            };
            if let Some(body) = seg_org.body {
                sim.physics.set_position(body, at);
                sim.physics.set_velocity(body, Vec2::ZERO);
            }
            seg_org.motion.position = at;
            seg_org.motion.velocity = Vec2::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn quiet_sim() -> Simulation {
        let mut config = Config::default();
        config.food.target = 0;
        config.bots.count = 0;
        config.world.seed = Some(3);
        Simulation::new(config)
    }

    #[test]
    fn test_enter_splits_blocks_into_segments() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 5);
        assert!(toggle(&mut sim, id));

        let head = sim.organism(id).unwrap();
        assert_eq!(head.mass, 1);
        assert_eq!(head.segments().len(), 4);
        assert_eq!(head.collision_group, -(id as i32));
        for &seg in head.segments() {
            let seg = sim.organism(seg).unwrap();
            assert_eq!(seg.parent, Some(id));
            assert_eq!(seg.mass, 1);
            assert_eq!(seg.collision_group, -(id as i32));
        }
        assert_eq!(total_mass(&sim.world, id), 5);
    }

    #[test]
    fn test_toggle_respects_cooldown() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 3);
        assert!(toggle(&mut sim, id));
        assert!(!toggle(&mut sim, id));
        sim.now_ms += sim.config.snake.toggle_cooldown_ms;
        assert!(toggle(&mut sim, id));
        assert!(!sim.organism(id).unwrap().is_snake());
    }

    #[test]
    fn test_round_trip_keeps_mass_and_growth() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 4);
        assert!(toggle(&mut sim, id));
        assert!(append_segment(&mut sim, id));
        assert!(append_segment(&mut sim, id));
        assert_eq!(total_mass(&sim.world, id), 6);
        let organisms_in_snake = sim.world.organism_count();
        assert_eq!(sim.physics.body_count(), organisms_in_snake);

        sim.now_ms += sim.config.snake.toggle_cooldown_ms;
        assert!(toggle(&mut sim, id));
        let org = sim.organism(id).unwrap();
        assert_eq!(org.mass, 6);
        assert_eq!(org.collision_group, 0);
        assert!(org.grid.has_unique_offsets());
        assert_eq!(sim.world.organism_count(), organisms_in_snake - 5);
        assert_eq!(sim.physics.body_count(), 1);
    }

    #[test]
    fn test_segments_follow_history() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 3);
        assert!(toggle(&mut sim, id));
        let step = sim.config.snake.segment_step;

        // Freshly seeded segments trail one block edge apart.
        let head = sim.organism(id).unwrap();
        let first = sim.organism(head.segments()[0]).unwrap().position();
        assert!((first.distance(head.position()) - 20.0).abs() < 1e-3);

        update_snakes(&mut sim);
        let head = sim.organism(id).unwrap();
        let snake = head.snake.as_ref().unwrap();
        assert_eq!(snake.history[0], head.position());
        for (k, &seg) in snake.segments.iter().enumerate() {
            let seg = sim.organism(seg).unwrap();
            assert_eq!(seg.position(), snake.history[(k + 1) * step]);
        }
    }
}
