//! End-to-end behaviour of the tick loop.

use arena::entity::Role;
use arena::{Config, SimEvent, Simulation, combat, food};
use glam::Vec2;

fn quiet_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.food.target = 0;
    config.bots.count = 0;
    config.world.seed = Some(seed);
    config
}

fn tick_interval(sim: &Simulation) -> u64 {
    sim.config().world.tick_interval_ms
}

#[test]
fn test_engulfed_organism_is_eaten_and_destroyed() {
    let mut sim = Simulation::new(quiet_config(11));
    let a = sim.spawn_organism(Role::Bot, Vec2::ZERO, 4);
    let b = sim.spawn_organism(Role::Bot, Vec2::ZERO, 1);

    sim.tick();
    assert_eq!(sim.organism(a).unwrap().eating.map(|r| r.target), Some(b));

    let interval = sim.config().organism.eat_interval_ticks;
    for _ in 1..interval - 1 {
        sim.tick();
    }
    assert_eq!(sim.organism(a).unwrap().mass, 4);
    assert_eq!(sim.organism(b).unwrap().mass, 1);

    let report = sim.tick();
    assert_eq!(report.transfers, 1);
    assert_eq!(sim.organism(a).unwrap().mass, 5);
    assert_eq!(sim.organism(b).unwrap().mass, 0);
    assert!(sim.organism(a).unwrap().eating.is_none());

    let deadline = sim.organism(b).unwrap().death_at.unwrap();
    assert_eq!(deadline, sim.now_ms() + sim.config().organism.death_grace_ms);
    while sim.now_ms() + tick_interval(&sim) < deadline {
        sim.tick();
        assert!(sim.organism(b).is_some());
    }
    let report = sim.tick();
    assert_eq!(report.destroyed, 1);
    assert!(sim.organism(b).is_none());
    assert_eq!(sim.total_mass(a), 5);
}

#[test]
fn test_single_pickup_from_full_pool() {
    let mut config = quiet_config(12);
    config.food.target = 250;
    let mut sim = Simulation::new(config);
    sim.populate();
    assert_eq!(sim.food_count(), 250);

    let item = sim.food_ids()[0];
    let at = sim.food(item).unwrap().position;
    let id = sim.spawn_organism(Role::Bot, at, 4);
    assert!(food::collect_particle(&mut sim, item, id));
    assert_eq!(sim.food_count(), 249);
    assert_eq!(sim.organism(id).unwrap().mass, 5);
    assert!(sim.organism(id).unwrap().grid.has_unique_offsets());
}

#[test]
fn test_snake_pickup_adds_a_segment() {
    let mut sim = Simulation::new(quiet_config(13));
    let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 4);
    assert!(sim.toggle_snake(id));
    assert_eq!(sim.organism(id).unwrap().segments().len(), 3);

    let item = sim.spawn_food_at(Vec2::new(500.0, 500.0));
    assert!(food::collect_particle(&mut sim, item, id));
    let head = sim.organism(id).unwrap();
    assert_eq!(head.segments().len(), 4);
    assert_eq!(head.mass, 1);
    assert_eq!(sim.total_mass(id), 5);
}

#[test]
fn test_regrowth_cancels_death_timer() {
    let mut sim = Simulation::new(quiet_config(14));
    let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 1);
    assert_eq!(combat::remove_cube_blocks(&mut sim, id, 1, None), 1);
    assert!(sim.organism(id).unwrap().death_at.is_some());

    assert!(sim.add_block(id));
    assert!(sim.organism(id).unwrap().death_at.is_none());

    let grace = sim.config().organism.death_grace_ms;
    let ticks = grace / tick_interval(&sim) + 2;
    for _ in 0..ticks {
        sim.tick();
    }
    let org = sim.organism(id).unwrap();
    assert!(org.mass >= 1);
    assert!(org.death_at.is_none());
}

#[test]
fn test_equal_masses_bounce_through_tick() {
    let mut sim = Simulation::new(quiet_config(15));
    let a = sim.spawn_organism(Role::Bot, Vec2::ZERO, 3);
    let b = sim.spawn_organism(Role::Bot, Vec2::new(30.0, 0.0), 3);

    let report = sim.tick();
    assert_eq!(report.collisions, 1);
    for id in [a, b] {
        let org = sim.organism(id).unwrap();
        assert_eq!(org.mass, 2);
        assert!(org.eating.is_none());
    }
    assert_eq!(sim.food_count(), 2);
    assert!(sim
        .drain_events()
        .iter()
        .any(|e| matches!(e, SimEvent::Effect { kind: arena::EffectKind::Explosion, .. })));
}

#[test]
fn test_snake_round_trip_keeps_mass() {
    let mut sim = Simulation::new(quiet_config(16));
    let id = sim.spawn_organism(Role::Bot, Vec2::ZERO, 4);

    assert!(sim.toggle_snake(id));
    assert_eq!(sim.total_mass(id), 4);
    assert!(sim.add_block(id));
    assert_eq!(sim.total_mass(id), 5);
    assert!(!sim.toggle_snake(id));

    let cooldown = sim.config().snake.toggle_cooldown_ms;
    for _ in 0..cooldown / tick_interval(&sim) + 1 {
        sim.tick();
    }
    assert_eq!(sim.organism_ids().len(), 5);

    assert!(sim.toggle_snake(id));
    let org = sim.organism(id).unwrap();
    assert!(!org.is_snake());
    assert_eq!(org.mass, 5);
    assert!(org.grid.has_unique_offsets());
    assert_eq!(sim.organism_ids(), &[id]);
}

#[test]
fn test_mass_matches_grid_while_bots_play() {
    let mut config = Config::default();
    config.world.seed = Some(17);
    config.world.width = 1500.0;
    config.world.height = 1500.0;
    config.food.target = 120;
    config.bots.count = 8;
    let mut sim = Simulation::new(config);
    sim.populate();

    for _ in 0..400 {
        sim.tick();
        for &id in sim.organism_ids() {
            let org = sim.organism(id).unwrap();
            if org.role == Role::Remote {
                continue;
            }
            assert_eq!(org.mass as usize, org.grid.len());
            assert!(org.grid.has_unique_offsets());
        }
    }
    assert_eq!(sim.bots().len(), 8);
}

#[test]
fn test_player_death_ends_game() {
    let mut sim = Simulation::new(quiet_config(18));
    let id = sim.spawn_player();
    let blocks = sim.organism(id).unwrap().mass;
    assert_eq!(combat::remove_cube_blocks(&mut sim, id, blocks, None), blocks);

    let grace = sim.config().organism.death_grace_ms;
    for _ in 0..grace / tick_interval(&sim) + 1 {
        if sim.is_game_over() {
            break;
        }
        sim.tick();
    }
    assert!(sim.is_game_over());
    assert!(sim.drain_events().contains(&SimEvent::GameOver { organism: id }));
}
