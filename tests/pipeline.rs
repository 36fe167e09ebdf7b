//! End-to-end pipeline behavior: seeding, division growth, pool accounting
//! and predator culling through the public `Simulation` surface.

use cellular_growth::Simulation;
use growth_common::{DivisionTrigger, GrowthConfig, Vec2};

fn headless_config(capacity: u32) -> GrowthConfig {
    let mut config = GrowthConfig::default();
    config.simulation.cell_capacity = capacity;
    config.simulation.random_seed = 11;
    config.membrane.enabled = false;
    config.predator.enabled = false;
    config
}

fn eager_division(config: &mut GrowthConfig) {
    config.division.trigger = DivisionTrigger::Frames(1);
    config.division.rate = 1.0;
    config.division.min_interval = 0.0;
}

#[test]
fn capacity_one_world_stays_put() {
    let mut config = headless_config(1);
    config.division.enabled = false;
    let mut sim = Simulation::new(config).unwrap();
    assert_eq!(sim.world.cells.pool.count(), 0);

    for _ in 0..30 {
        sim.step().unwrap();
    }
    assert_eq!(sim.current_cell_count(), 1);
    assert_eq!(sim.world.cells.pool.count(), 0);
}

#[test]
fn first_step_divides_seed_into_linked_pair() {
    let mut config = headless_config(16);
    eager_division(&mut config);
    let mut sim = Simulation::new(config).unwrap();

    sim.step().unwrap();

    assert_eq!(sim.current_cell_count(), 2);
    assert_eq!(sim.world.cells.pool.count(), 14);
    assert_eq!(sim.world.count_alive_edges(), 1);
    let edge = sim
        .world
        .edges
        .read()
        .iter()
        .find(|e| e.is_alive())
        .copied()
        .unwrap();
    assert!(edge.connects(0, 1), "daughter links the seed to slot 1");
}

#[test]
fn exhausted_pool_leaves_topology_untouched() {
    let mut config = headless_config(4);
    eager_division(&mut config);
    config.division.max_link = 64;
    let mut sim = Simulation::new(config).unwrap();
    sim.emit_cells(Vec2::new(3.0, 0.0), 3);
    assert_eq!(sim.world.cells.pool.count(), 0);
    let edges_before = sim.world.count_alive_edges();

    for _ in 0..5 {
        sim.step().unwrap();
    }

    assert_eq!(sim.current_cell_count(), 4);
    assert_eq!(sim.world.cells.pool.count(), 0);
    assert_eq!(sim.world.count_alive_edges(), edges_before);
}

#[test]
fn alive_plus_free_always_equals_capacity() {
    let mut config = headless_config(64);
    eager_division(&mut config);
    let mut sim = Simulation::new(config).unwrap();

    for step in 0..100 {
        sim.step().unwrap();
        let cells = sim.current_cell_count() + sim.world.cells.pool.count();
        assert_eq!(cells, 64, "cell accounting broke at step {}", step);
        let edges = sim.world.count_alive_edges() + sim.world.edges.pool.count();
        assert_eq!(edges, 64, "edge accounting broke at step {}", step);
    }
}

#[test]
fn predator_culls_cell_and_its_edges() {
    let mut config = headless_config(8);
    config.division.enabled = false;
    config.predator.enabled = true;
    config.predator.count = 1;
    config.predator.wander = 0.0;
    let mut sim = Simulation::new(config).unwrap();
    sim.emit_cells(Vec2::new(30.0, 0.0), 1);
    {
        let world = &mut sim.world;
        let cells = world.cells.read_mut();
        cells[0].position = Vec2::new(0.0, 0.0);
        cells[1].position = Vec2::new(30.0, 0.0);
        if let Some(slot) = world.edges.pool.consume() {
            world.edges.read_mut()[slot as usize] =
                cellular_growth::entity::Edge::link(0, 1);
        }
        let predators = world.predators.read_mut();
        predators[0].position = Vec2::new(0.0, 0.0);
        predators[0].velocity = Vec2::zero();
    }
    let free_before = sim.world.cells.pool.count();

    sim.step().unwrap();

    let cells = sim.world.cells.read();
    assert!(!cells[0].is_alive(), "cell under the predator is culled");
    assert!(cells[1].is_alive(), "distant cell survives");
    assert_eq!(sim.world.cells.pool.count(), free_before + 1);
    assert_eq!(sim.world.count_alive_edges(), 0, "orphaned edge reclaimed");
    assert_eq!(sim.world.edges.pool.count(), 8);
    assert_eq!(cells[1].links, 0, "survivor's degree recounted");
}

#[test]
fn remove_circle_then_regrow() {
    let mut config = headless_config(32);
    eager_division(&mut config);
    let mut sim = Simulation::new(config).unwrap();
    for _ in 0..10 {
        sim.step().unwrap();
    }
    let before = sim.current_cell_count();
    assert!(before > 2);

    let removed = sim.remove_cells_circle(Vec2::zero(), 1000.0);
    assert_eq!(removed, before);
    assert_eq!(sim.current_cell_count(), 0);
    sim.step().unwrap();
    assert_eq!(
        sim.world.count_alive_edges(),
        0,
        "edges of removed cells reclaimed on the next step"
    );

    sim.emit_cells(Vec2::zero(), 1);
    for _ in 0..5 {
        sim.step().unwrap();
    }
    assert!(sim.current_cell_count() > 1, "growth resumes after clearing");
}

#[test]
fn link_counts_never_exceed_the_configured_ceiling() {
    let mut config = headless_config(64);
    config.simulation.seed = growth_common::Seed::Triangle;
    eager_division(&mut config);
    config.division.max_link = 4;
    let mut sim = Simulation::new(config).unwrap();

    for step in 0..80 {
        sim.step().unwrap();
        for (slot, cell) in sim.world.cells.read().iter().enumerate() {
            if cell.is_alive() {
                assert!(
                    cell.links <= 4,
                    "cell {} reached {} links at step {}",
                    slot,
                    cell.links,
                    step
                );
            }
        }
    }
    assert!(sim.current_cell_count() > 3, "growth still happens under the cap");
}

#[test]
fn identical_seeds_produce_identical_runs() {
    let mut config = headless_config(64);
    eager_division(&mut config);
    let mut a = Simulation::new(config.clone()).unwrap();
    let mut b = Simulation::new(config).unwrap();

    for _ in 0..50 {
        a.step().unwrap();
        b.step().unwrap();
    }
    assert_eq!(a.current_cell_count(), b.current_cell_count());
    for (ca, cb) in a.world.cells.read().iter().zip(b.world.cells.read()) {
        assert_eq!(ca.alive, cb.alive);
        assert_eq!(ca.position, cb.position);
    }
}
