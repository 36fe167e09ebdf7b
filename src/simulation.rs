use crate::cells;
use crate::edges::recount_links;
use crate::entity::{Cell, Edge, Face, MembraneEdge, MembraneNode, Predator, ALIVE};
use crate::phase::{KernelRegistry, Phase};
use crate::pointer::ExternalInput;
use crate::predators::emit_predators;
use crate::state::{StepCtx, World};
use anyhow::Result;
use growth_common::{DivisionTrigger, GrowthConfig, Seed, Vec2};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use zerocopy::IntoBytes;

/// The physics step never integrates more than this many seconds at once;
/// a stalled host frame must not slingshot the springs.
const MAX_DT: f32 = 0.05;

/// A snapshot of the simulation state and metrics at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulation time in seconds at which the snapshot was taken.
    pub time: f32,
    pub frame: u64,
    pub alive_cells: u32,
    pub alive_edges: u32,
    pub alive_faces: u32,
    pub alive_predators: u32,
    /// Free cell slots remaining in the pool.
    pub free_cell_slots: u32,
    /// Optional raw [x, y] positions of alive cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<(f32, f32)>>,
}

/// Free-slot counts read back once per step, after every parallel phase
/// has joined. The division gate and the logs read these, never the live
/// atomics mid-phase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolCounts {
    pub free_cells: u32,
    pub free_edges: u32,
    pub free_faces: u32,
    pub free_predators: u32,
}

/// Per-frame element counts a renderer needs alongside the raw buffers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DrawCounts {
    pub cells: u32,
    pub edges: u32,
    pub faces: u32,
    pub membrane_nodes: u32,
    pub predators: u32,
}

/// Borrowed view over every arena's current generation. The slices are
/// plain-old-data; `*_bytes` exposes them for a byte-oriented consumer.
pub struct RenderView<'a> {
    pub cells: &'a [Cell],
    pub edges: &'a [Edge],
    pub faces: &'a [Face],
    pub membrane_nodes: &'a [MembraneNode],
    pub membrane_edges: &'a [MembraneEdge],
    pub predators: &'a [Predator],
    pub counts: DrawCounts,
}

impl<'a> RenderView<'a> {
    pub fn cell_bytes(&self) -> &'a [u8] {
        self.cells.as_bytes()
    }

    pub fn edge_bytes(&self) -> &'a [u8] {
        self.edges.as_bytes()
    }

    pub fn predator_bytes(&self) -> &'a [u8] {
        self.predators.as_bytes()
    }
}

/// Manages the growth simulation: seeds the world, dispatches the phase
/// pipeline each step, and exposes the host-side control surface.
pub struct Simulation {
    pub config: GrowthConfig,
    pub world: World,
    registry: KernelRegistry,
    frame: u64,
    time: f32,
    /// Elapsed-seconds accumulator for the `Seconds` division trigger.
    divide_accum: f32,
    /// Host toggle gating the whole division pipeline.
    dividable: bool,
    pending_input: ExternalInput,
    pool_counts: PoolCounts,
    recorded_snapshots: Vec<Snapshot>,
}

impl Simulation {
    pub fn new(config: GrowthConfig) -> Result<Self> {
        config.validate()?;
        let params = config.get_sim_params();
        let mut sim = Simulation {
            world: World::new(params),
            registry: KernelRegistry::resolve(),
            frame: 0,
            time: 0.0,
            divide_accum: 0.0,
            dividable: true,
            pending_input: ExternalInput::default(),
            pool_counts: PoolCounts::default(),
            recorded_snapshots: Vec::new(),
            config,
        };
        sim.seed_world();
        sim.update_pool_counts();
        Ok(sim)
    }

    /// Fills every pool and emits the configured seed topology. Also the
    /// second half of `reset`.
    fn seed_world(&mut self) {
        let world = &mut self.world;
        world.cells.pool.fill_reverse();
        world.edges.pool.fill_reverse();
        world.faces.pool.fill_reverse();
        world.predators.pool.fill_reverse();
        world.membrane.nodes.pool.fill_reverse();
        world.membrane.edges.pool.fill_reverse();

        match self.config.simulation.seed {
            Seed::Cell => {
                cells::emit_cells(world, Vec2::zero(), 1, 0);
            }
            Seed::Triangle => {
                let r = world.params.radius;
                let positions = [
                    Vec2::new(0.0, r),
                    Vec2::new(-0.866 * r, -0.5 * r),
                    Vec2::new(0.866 * r, -0.5 * r),
                ];
                for &position in &positions {
                    if let Some(slot) = world.cells.pool.consume() {
                        world.cells.read_mut()[slot as usize] = Cell {
                            position,
                            radius: r * 0.5,
                            threshold: world.params.threshold,
                            alive: ALIVE,
                            ..Cell::default()
                        };
                    }
                }
                for (a, b) in [(0u32, 1u32), (1, 2), (2, 0)] {
                    if let Some(slot) = world.edges.pool.consume() {
                        world.edges.read_mut()[slot as usize] = Edge::link(a, b);
                    }
                }
                if let Some(slot) = world.faces.pool.consume() {
                    world.faces.read_mut()[slot as usize] = Face::triangle([0, 1, 2], [0, 1, 2]);
                }
                recount_links(world);
            }
        }

        if self.config.membrane.enabled {
            world
                .membrane
                .seed_ring(world.params.membrane_radius, world.params.membrane_node_radius);
        }
        if self.config.predator.enabled {
            let emitted = emit_predators(
                world,
                Vec2::zero(),
                world.params.membrane_radius * 0.5,
                self.config.predator.count,
                0,
            );
            debug!("seeded {} predators", emitted);
        }
        info!(
            "world seeded: {} cells, {} edges, {} faces",
            world.count_alive_cells(),
            world.count_alive_edges(),
            world.count_alive_faces()
        );
    }

    /// Supplies next step's interaction point. Latched until replaced.
    pub fn set_input(&mut self, input: ExternalInput) {
        self.pending_input = input;
    }

    /// Host toggle for the division pipeline; the phases simply stop being
    /// dispatched while this is off.
    pub fn set_dividable(&mut self, dividable: bool) {
        self.dividable = dividable;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the simulation by one step: motion phases, optional
    /// membrane and predator phases, the division pipeline when due, then
    /// the removal passes.
    pub fn step(&mut self) -> Result<()> {
        let dt = self.config.timing.dt.min(MAX_DT);
        let ctx = StepCtx { dt, time: self.time, frame: self.frame };
        let division_due = self.division_due(dt);
        let registry = &self.registry;
        let world = &mut self.world;

        world.pointer.interact(self.pending_input, dt);

        registry.dispatch(Phase::UpdateEdges, world, &ctx);
        registry.dispatch(Phase::InteractCells, world, &ctx);
        registry.dispatch(Phase::UpdateCells, world, &ctx);

        if self.config.membrane.enabled {
            world.membrane.ease(world.params.membrane_radius, dt);
            registry.dispatch(Phase::WrapCells, world, &ctx);
            registry.dispatch(Phase::MembraneInteract, world, &ctx);
            registry.dispatch(Phase::MembraneStretch, world, &ctx);
            registry.dispatch(Phase::MembraneExpand, world, &ctx);
            registry.dispatch(Phase::MembraneUpdate, world, &ctx);
            registry.dispatch(Phase::MembraneRelax, world, &ctx);
        }

        if self.config.predator.enabled {
            registry.dispatch(Phase::Hunt, world, &ctx);
            registry.dispatch(Phase::PredatorInteract, world, &ctx);
            registry.dispatch(Phase::PredatorUpdate, world, &ctx);
            if self.config.membrane.enabled {
                registry.dispatch(Phase::WrapPredators, world, &ctx);
            }
        }

        if division_due {
            registry.dispatch(Phase::Activate, world, &ctx);
            if world.params.checked_protocol {
                registry.dispatch(Phase::Check, world, &ctx);
            }
            registry.dispatch(Phase::Divide, world, &ctx);
        }

        registry.dispatch(Phase::RemoveEdges, world, &ctx);
        registry.dispatch(Phase::RemoveFaces, world, &ctx);

        self.update_pool_counts();
        self.frame += 1;
        self.time += dt;
        Ok(())
    }

    /// Once-per-step readback barrier: every dispatch above has joined, so
    /// the atomic counters are quiescent.
    fn update_pool_counts(&mut self) {
        let world = &self.world;
        self.pool_counts = PoolCounts {
            free_cells: world.cells.pool.count(),
            free_edges: world.edges.pool.count(),
            free_faces: world.faces.pool.count(),
            free_predators: world.predators.pool.count(),
        };
    }

    /// Free-slot counts as of the last completed step.
    pub fn pool_counts(&self) -> PoolCounts {
        self.pool_counts
    }

    /// Evaluates the configured trigger. The population gate lives inside
    /// the Divide kernel; this only decides whether the pipeline runs.
    fn division_due(&mut self, dt: f32) -> bool {
        if !self.dividable || !self.config.division.enabled {
            return false;
        }
        match self.config.division.trigger {
            DivisionTrigger::Frames(n) => (self.frame + 1) % n.max(1) as u64 == 0,
            DivisionTrigger::Seconds(interval) => {
                self.divide_accum += dt;
                if self.divide_accum >= interval {
                    self.divide_accum -= interval;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Scatters extra cells around a point; interaction surface.
    pub fn emit_cells(&mut self, center: Vec2, count: u32) -> u32 {
        cells::emit_cells(&mut self.world, center, count, self.frame).len() as u32
    }

    /// Kills every cell inside the circle; interaction surface. Orphaned
    /// edges and faces are reclaimed by the next step's removal passes.
    pub fn remove_cells_circle(&mut self, center: Vec2, radius: f32) -> u32 {
        cells::remove_cells_circle(&mut self.world, center, radius)
    }

    /// Kills every cell within `threshold` of a swept segment; interaction
    /// surface for stroke-style erasing.
    pub fn remove_cells_line(&mut self, start: Vec2, end: Vec2, threshold: f32) -> u32 {
        cells::remove_cells_line(&mut self.world, start, end, threshold)
    }

    /// Rebuilds the initial state in place. Buffers, pools, clocks and the
    /// pointer all return to the freshly-seeded configuration.
    pub fn reset(&mut self) {
        let world = &mut self.world;
        world.cells.reset();
        world.edges.reset();
        world.faces.reset();
        world.predators.reset();
        world.membrane.nodes.reset();
        world.membrane.edges.reset();
        world.membrane.current = 0.0;
        world.pointer.reset();
        self.frame = 0;
        self.time = 0.0;
        self.divide_accum = 0.0;
        self.pending_input = ExternalInput::default();
        self.seed_world();
        self.update_pool_counts();
    }

    /// Positions of all alive cells.
    pub fn get_results(&self) -> Vec<(f32, f32)> {
        self.world
            .cells
            .read()
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| (c.position.x, c.position.y))
            .collect()
    }

    pub fn current_cell_count(&self) -> u32 {
        self.world.count_alive_cells()
    }

    /// Borrowed buffer view plus alive counts for a render consumer.
    pub fn render_view(&self) -> RenderView<'_> {
        let world = &self.world;
        RenderView {
            cells: world.cells.read(),
            edges: world.edges.read(),
            faces: world.faces.read(),
            membrane_nodes: world.membrane.nodes.read(),
            membrane_edges: world.membrane.edges.read(),
            predators: world.predators.read(),
            counts: DrawCounts {
                cells: world.count_alive_cells(),
                edges: world.count_alive_edges(),
                faces: world.count_alive_faces(),
                membrane_nodes: world
                    .membrane
                    .nodes
                    .read()
                    .iter()
                    .filter(|n| n.is_alive())
                    .count() as u32,
                predators: world
                    .predators
                    .read()
                    .iter()
                    .filter(|p| p.is_alive())
                    .count() as u32,
            },
        }
    }

    /// Collects current metrics as a Snapshot. Called at record intervals.
    pub fn record_snapshot(&mut self) {
        let world = &self.world;
        let positions = if self.config.output.save_positions_in_snapshot {
            Some(self.get_results())
        } else {
            None
        };
        let snapshot = Snapshot {
            time: self.time,
            frame: self.frame,
            alive_cells: world.count_alive_cells(),
            alive_edges: world.count_alive_edges(),
            alive_faces: world.count_alive_faces(),
            alive_predators: world
                .predators
                .read()
                .iter()
                .filter(|p| p.is_alive())
                .count() as u32,
            free_cell_slots: world.cells.pool.count(),
            positions,
        };
        debug!(
            "snapshot at t={:.2}s: {} cells, {} free slots",
            snapshot.time, snapshot.alive_cells, snapshot.free_cell_slots
        );
        self.recorded_snapshots.push(snapshot);
    }

    pub fn get_recorded_snapshots(&self) -> &Vec<Snapshot> {
        &self.recorded_snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> GrowthConfig {
        let mut config = GrowthConfig::default();
        config.simulation.cell_capacity = 64;
        config.membrane.enabled = false;
        config.predator.enabled = false;
        config
    }

    #[test]
    fn seed_cell_starts_with_one_alive() {
        let sim = Simulation::new(base_config()).unwrap();
        assert_eq!(sim.current_cell_count(), 1);
        assert_eq!(sim.world.cells.pool.count(), 63);
        assert_eq!(sim.pool_counts().free_cells, 63);
        assert_eq!(sim.world.count_alive_edges(), 0);
    }

    #[test]
    fn seed_triangle_builds_mesh() {
        let mut config = base_config();
        config.simulation.seed = Seed::Triangle;
        let sim = Simulation::new(config).unwrap();
        assert_eq!(sim.current_cell_count(), 3);
        assert_eq!(sim.world.count_alive_edges(), 3);
        assert_eq!(sim.world.count_alive_faces(), 1);
        assert!(sim.world.cells.read()[..3].iter().all(|c| c.links == 2));
    }

    #[test]
    fn reset_restores_seed_state() {
        let mut config = base_config();
        config.division.trigger = DivisionTrigger::Frames(1);
        config.division.rate = 1.0;
        config.division.min_interval = 0.0;
        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..20 {
            sim.step().unwrap();
        }
        assert!(sim.current_cell_count() > 1);

        sim.reset();
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.current_cell_count(), 1);
        assert_eq!(sim.world.cells.pool.count(), 63);
        assert_eq!(sim.world.count_alive_edges(), 0);

        // Resetting an already-reset simulation lands in the same state.
        sim.reset();
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.current_cell_count(), 1);
        assert_eq!(sim.world.cells.pool.count(), 63);
        assert_eq!(sim.pool_counts().free_cells, 63);
    }

    #[test]
    fn dividable_toggle_pauses_and_resumes_growth() {
        let mut config = base_config();
        config.division.trigger = DivisionTrigger::Frames(1);
        config.division.rate = 1.0;
        config.division.min_interval = 0.0;
        let mut sim = Simulation::new(config).unwrap();

        sim.set_dividable(false);
        for _ in 0..10 {
            sim.step().unwrap();
        }
        assert_eq!(sim.current_cell_count(), 1);

        sim.set_dividable(true);
        sim.step().unwrap();
        assert_eq!(sim.current_cell_count(), 2);
    }

    #[test]
    fn division_disabled_keeps_population_fixed() {
        let mut config = base_config();
        config.division.enabled = false;
        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..60 {
            sim.step().unwrap();
        }
        assert_eq!(sim.current_cell_count(), 1);
    }

    #[test]
    fn render_view_counts_match_buffers() {
        let mut config = base_config();
        config.simulation.seed = Seed::Triangle;
        let sim = Simulation::new(config).unwrap();
        let view = sim.render_view();
        assert_eq!(view.counts.cells, 3);
        assert_eq!(view.counts.edges, 3);
        assert_eq!(view.counts.faces, 1);
        assert_eq!(
            view.cell_bytes().len(),
            view.cells.len() * std::mem::size_of::<Cell>()
        );
    }
}
