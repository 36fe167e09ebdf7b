//! Membrane containment through the full step pipeline: escaped cells and
//! predators are pulled back toward the ring.

use cellular_growth::Simulation;
use growth_common::{GrowthConfig, Vec2};

fn walled_config() -> GrowthConfig {
    let mut config = GrowthConfig::default();
    config.simulation.cell_capacity = 16;
    config.simulation.random_seed = 5;
    config.division.enabled = false;
    config.membrane.enabled = true;
    config.membrane.nodes = 64;
    config.membrane.radius = 5.0;
    config.predator.enabled = false;
    config
}

#[test]
fn ring_is_seeded_closed() {
    let sim = Simulation::new(walled_config()).unwrap();
    let membrane = &sim.world.membrane;
    assert_eq!(membrane.nodes.pool.count(), 0);
    assert_eq!(membrane.edges.pool.count(), 0);
    let alive_nodes = membrane.nodes.read().iter().filter(|n| n.is_alive()).count();
    assert_eq!(alive_nodes, 64);
    assert!((membrane.current - 5.0).abs() < 1e-5);
}

#[test]
fn escaped_cell_is_pulled_back_inside() {
    let mut sim = Simulation::new(walled_config()).unwrap();
    sim.world.cells.read_mut()[0].position = Vec2::new(9.0, 0.0);

    let start = sim.world.cells.read()[0].position.length();
    for _ in 0..240 {
        sim.step().unwrap();
    }
    let end = sim.world.cells.read()[0].position.length();
    assert!(
        end < start,
        "containment must pull the cell inward (start {:.2}, end {:.2})",
        start,
        end
    );
    assert!(end < 6.5, "cell settles near or inside the ring, got {:.2}", end);
}

#[test]
fn escaped_predator_is_pulled_back_inside() {
    let mut config = walled_config();
    config.predator.enabled = true;
    config.predator.count = 1;
    config.predator.wander = 0.0;
    config.predator.kill_radius = 0.0;
    let mut sim = Simulation::new(config).unwrap();
    {
        let predators = sim.world.predators.read_mut();
        predators[0].position = Vec2::new(0.0, 12.0);
        predators[0].velocity = Vec2::zero();
    }

    for _ in 0..240 {
        sim.step().unwrap();
    }
    let end = sim.world.predators.read()[0].position.length();
    assert!(end < 8.0, "predator pulled back toward the ring, got {:.2}", end);
}
