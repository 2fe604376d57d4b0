//! Grid-to-body composition.
//!
//! Every grid mutation ends in [`rebuild_layout`], which recenters the grid,
//! replaces the compound body and carries the old body's motion over.

use crate::entity::{Block, BlockKind, Role};
use crate::physics::{BodyOptions, PartDesc, PartTag};
use crate::simulation::Simulation;
use crate::snake;
use glam::Vec2;
use tracing::trace;

/// Recenter the grid of `id` and rebuild its compound body.
///
/// Blocks keep their world positions: the body origin moves by the rotated
/// centroid shift. An emptied grid loses its body and reports zero size and
/// mass; destruction is left to the death timer.
pub fn rebuild_layout(sim: &mut Simulation, id: u32) {
    let air_friction = sim.config.organism.air_friction;
    let Some(org) = sim.world.organisms.get_mut(&id) else {
        return;
    };
    if org.role == Role::Remote {
        return;
    }

    let mut motion = match org.body.take() {
        Some(body) => sim.physics.destroy(body).unwrap_or(org.motion),
        None => org.motion,
    };
    let shift = org.grid.recenter();

    if org.grid.is_empty() {
        org.size = 0.0;
        org.mass = 0;
        org.motion = motion;
        return;
    }

    motion.position = motion.to_world(shift);
    org.size = org.grid.span_size();
    org.mass = org.grid.len() as u32;

    let parts: Vec<PartDesc> = org
        .grid
        .blocks()
        .iter()
        .map(|b| PartDesc::square(b.offset, b.edge, PartTag::Organism(id)))
        .collect();
    let body = sim.physics.create_compound(
        &parts,
        motion,
        BodyOptions {
            sensor: false,
            air_friction,
            group: org.collision_group,
        },
    );
    org.body = Some(body);
    org.motion = motion;
    if org.death_at.take().is_some() {
        trace!("Organism {} regrew, death timer cleared", id);
    }
}

/// Grow `id` by one block.
///
/// Snake heads and their segments grow by appending a segment to the chain.
/// Returns false when nothing could be added.
pub fn add_block(sim: &mut Simulation, id: u32) -> bool {
    let attempts = sim.config.organism.growth_attempts;
    let Some(org) = sim.world.organisms.get_mut(&id) else {
        return false;
    };
    if org.role == Role::Remote {
        return false;
    }
    let owner = org.owner_id();
    if owner != id || org.is_snake() {
        return snake::append_segment(sim, owner);
    }

    let Some(site) = org.grid.pick_growth_site(&mut sim.rng, attempts) else {
        return false;
    };
    if !org.grid.insert(site, BlockKind::Body) {
        return false;
    }
    rebuild_layout(sim, id);
    true
}

/// Detach one block (at `index`, or the preferred removal pick) and rebuild.
///
/// Returns the block together with its world position before removal.
pub fn remove_block(sim: &mut Simulation, id: u32, index: Option<usize>) -> Option<(Block, Vec2)> {
    let org = sim.world.organisms.get_mut(&id)?;
    if let Some(body) = org.body {
        if let Some(motion) = sim.physics.motion(body) {
            org.motion = motion;
        }
    }
    let index = match index {
        Some(i) => i,
        None => org.grid.removal_index(&mut sim.rng)?,
    };
    let block = org.grid.remove(index)?;
    let world_pos = org.motion.to_world(block.offset);
    rebuild_layout(sim, id);
    Some((block, world_pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn quiet_sim() -> Simulation {
        let mut config = Config::default();
        config.food.target = 0;
        config.bots.count = 0;
        config.world.seed = Some(11);
        Simulation::new(config)
    }

    #[test]
    fn test_mass_tracks_grid_after_growth() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 1);
        for n in 2..=12 {
            assert!(add_block(&mut sim, id));
            let org = sim.organism(id).unwrap();
            assert_eq!(org.mass as usize, n);
            assert_eq!(org.grid.len(), n);
            assert!(org.grid.has_unique_offsets());
            assert!(org.grid.centroid().unwrap().length() < 1e-3);
        }
    }

    #[test]
    fn test_rebuild_preserves_momentum() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 4);
        let body = sim.organism(id).unwrap().body.unwrap();
        sim.physics.set_velocity(body, Vec2::new(3.0, -1.0));

        assert!(add_block(&mut sim, id));
        let new_body = sim.organism(id).unwrap().body.unwrap();
        assert_ne!(body, new_body);
        let motion = sim.physics.motion(new_body).unwrap();
        assert_eq!(motion.velocity, Vec2::new(3.0, -1.0));
    }

    #[test]
    fn test_blocks_keep_world_positions_across_recenter() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::new(100.0, 50.0), 1);
        let before: Vec<Vec2> = {
            let org = sim.organism(id).unwrap();
            org.grid.blocks().iter().map(|b| org.motion.to_world(b.offset)).collect()
        };
        assert!(add_block(&mut sim, id));
        let org = sim.organism(id).unwrap();
        let after: Vec<Vec2> = org.grid.blocks().iter().map(|b| org.motion.to_world(b.offset)).collect();
        for p in before {
            assert!(after.iter().any(|q| q.distance(p) < 1e-3));
        }
    }

    #[test]
    fn test_emptied_grid_drops_body() {
        let mut sim = quiet_sim();
        let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 1);
        let (block, at) = remove_block(&mut sim, id, None).unwrap();
        assert_eq!(block.edge, 20.0);
        assert_eq!(at, Vec2::ZERO);

        let org = sim.organism(id).unwrap();
        assert!(org.body.is_none());
        assert_eq!(org.mass, 0);
        assert_eq!(org.size, 0.0);
        assert!(remove_block(&mut sim, id, None).is_none());
    }
}
