use crate::sim_params::SimParams;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed topology emitted at initialization and on every reset.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Seed {
    /// A single cell at the origin. Division buds a child with one new edge.
    Cell,
    /// Three cells, three edges, one face. Division splits an edge and keeps
    /// the manifold triangle invariant intact (the volumetric reference).
    Triangle,
}

/// How strongly the division pipeline guards against concurrent splits.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DivisionProtocol {
    /// Activate -> Check -> Divide. Two cells sharing an edge never divide
    /// in the same frame; the reference protocol.
    Checked,
    /// Activate -> Divide, no Check pass. Adjacent cells may divide in the
    /// same frame. The weaker guarantee is deliberate and only suitable for
    /// bud-style (faceless) topologies.
    Direct,
}

/// When the division pipeline is evaluated.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DivisionTrigger {
    /// Every n-th frame.
    Frames(u32),
    /// Whenever the elapsed-time accumulator passes this many seconds.
    Seconds(f32),
}

// Arena capacities and seeding, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationSection {
    /// Maximum number of cell slots; edge/face capacities are derived.
    pub cell_capacity: u32,
    pub seed: Seed,
    /// Base value for every deterministic per-slot RNG stream.
    pub random_seed: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        SimulationSection {
            cell_capacity: 4096,
            seed: Seed::Cell,
            random_seed: 7,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CellSection {
    pub radius: f32,
    /// Target radius a cell grows toward; inherited by offspring.
    pub threshold: f32,
    pub grow_speed: f32,
    /// Velocity magnitude clamp.
    pub limit: f32,
    /// Multiplicative velocity drag per step.
    pub drag: f32,
    pub repulsion: f32,
    /// Spring stiffness for connecting edges.
    pub stiffness: f32,
}

impl Default for CellSection {
    fn default() -> Self {
        CellSection {
            radius: 0.5,
            threshold: 1.0,
            grow_speed: 5.0,
            limit: 3.0,
            drag: 0.9,
            repulsion: 4.0,
            stiffness: 8.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DivisionSection {
    pub enabled: bool,
    pub protocol: DivisionProtocol,
    pub trigger: DivisionTrigger,
    /// Division stops once the alive population reaches this count.
    pub threshold: u32,
    /// Probability that an eligible cell activates, per evaluation.
    pub rate: f32,
    /// A cell with this many links never activates.
    pub max_link: u32,
    /// Minimum seconds since a cell last divided before it may activate.
    pub min_interval: f32,
}

impl Default for DivisionSection {
    fn default() -> Self {
        DivisionSection {
            enabled: true,
            protocol: DivisionProtocol::Checked,
            trigger: DivisionTrigger::Frames(30),
            threshold: 2000,
            rate: 0.5,
            max_link: 8,
            min_interval: 0.5,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MembraneSection {
    pub enabled: bool,
    pub nodes: u32,
    /// Resting ring radius the current radius eases toward.
    pub radius: f32,
    pub tension: f32,
    pub limit: f32,
    pub drag: f32,
    pub node_radius: f32,
}

impl Default for MembraneSection {
    fn default() -> Self {
        MembraneSection {
            enabled: true,
            nodes: 128,
            radius: 7.0,
            tension: 0.7,
            limit: 3.0,
            drag: 0.9,
            node_radius: 0.25,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PredatorSection {
    pub enabled: bool,
    pub count: u32,
    pub radius: f32,
    /// A cell inside `kill_radius` of any predator is removed by Hunt.
    pub kill_radius: f32,
    pub limit: f32,
    pub drag: f32,
    pub wander: f32,
}

impl Default for PredatorSection {
    fn default() -> Self {
        PredatorSection {
            enabled: false,
            count: 32,
            radius: 0.4,
            kill_radius: 0.8,
            limit: 3.0,
            drag: 0.9,
            wander: 2.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PointerSection {
    /// Force scale of the point attractor at full energy.
    pub strength: f32,
    /// Interaction falloff distance.
    pub distance: f32,
}

impl Default for PointerSection {
    fn default() -> Self {
        PointerSection { strength: 3.0, distance: 3.0 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingSection {
    /// Fixed physics step in seconds; the host loop clamps larger frames.
    pub dt: f32,
    pub total_time: f32,
    pub record_interval: f32,
}

impl Default for TimingSection {
    fn default() -> Self {
        TimingSection { dt: 1.0 / 60.0, total_time: 30.0, record_interval: 1.0 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputSection {
    pub base_filename: String,
    pub save_stats: bool,
    pub save_positions: bool,
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // "json", "bincode", "messagepack"
}

impl Default for OutputSection {
    fn default() -> Self {
        OutputSection {
            base_filename: "growth".to_string(),
            save_stats: true,
            save_positions: false,
            save_positions_in_snapshot: false,
            format: None,
        }
    }
}

// Main configuration structure, loaded from config.toml. Every section has
// defaults so a partial file (or a test-constructed value) works.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GrowthConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub cell: CellSection,
    #[serde(default)]
    pub division: DivisionSection,
    #[serde(default)]
    pub membrane: MembraneSection,
    #[serde(default)]
    pub predator: PredatorSection,
    #[serde(default)]
    pub pointer: PointerSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl GrowthConfig {
    /// Loads the configuration from a TOML file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let config_str = std::fs::read_to_string(path_ref).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e)
        })?;
        let config: GrowthConfig = toml::from_str(&config_str).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast precondition checks. Capacity under-provisioning is a setup
    /// error, never a runtime condition.
    pub fn validate(&self) -> Result<()> {
        let seed_cells = match self.simulation.seed {
            Seed::Cell => 1,
            Seed::Triangle => 3,
        };
        if self.simulation.cell_capacity < seed_cells {
            anyhow::bail!(
                "cell_capacity ({}) cannot hold the seed topology ({} cells)",
                self.simulation.cell_capacity,
                seed_cells
            );
        }
        if self.cell.radius <= 0.0 {
            anyhow::bail!("cell radius must be positive");
        }
        if self.timing.dt <= 0.0 {
            anyhow::bail!("timing.dt must be positive");
        }
        if !(0.0..=1.0).contains(&self.division.rate) {
            anyhow::bail!("division.rate must lie in [0, 1]");
        }
        match self.division.trigger {
            DivisionTrigger::Frames(0) => {
                anyhow::bail!("division trigger of 0 frames is invalid");
            }
            DivisionTrigger::Seconds(s) if s <= 0.0 => {
                anyhow::bail!("division trigger seconds must be positive");
            }
            _ => {}
        }
        if self.membrane.enabled && self.membrane.nodes < 3 {
            anyhow::bail!("membrane needs at least 3 nodes to form a ring");
        }
        if self.predator.enabled && self.predator.count == 0 {
            anyhow::bail!("predator.count must be positive when predators are enabled");
        }
        Ok(())
    }

    /// Flattens the configuration into the parameter block used on the hot
    /// path. Derived capacities: edges 3x / faces 2x cells for mesh seeds
    /// (Euler bound for a triangulated surface), edges 1x otherwise.
    pub fn get_sim_params(&self) -> SimParams {
        let mesh = self.simulation.seed == Seed::Triangle;
        let cells = self.simulation.cell_capacity;
        let edge_capacity = if mesh { cells.saturating_mul(3) } else { cells };
        let face_capacity = if mesh { cells.saturating_mul(2) } else { 0 };

        SimParams {
            cell_capacity: cells,
            edge_capacity,
            face_capacity,
            membrane_node_capacity: if self.membrane.enabled { self.membrane.nodes } else { 0 },
            predator_capacity: if self.predator.enabled { self.predator.count } else { 0 },
            mesh,
            random_seed: self.simulation.random_seed,

            radius: self.cell.radius,
            threshold: self.cell.threshold,
            grow_speed: self.cell.grow_speed,
            limit: self.cell.limit,
            drag: self.cell.drag,
            repulsion: self.cell.repulsion,
            stiffness: self.cell.stiffness,

            divide_rate: self.division.rate,
            divide_threshold: self.division.threshold,
            max_link: self.division.max_link,
            min_interval: self.division.min_interval,
            checked_protocol: self.division.protocol == DivisionProtocol::Checked,

            membrane_radius: self.membrane.radius,
            membrane_tension: self.membrane.tension,
            membrane_limit: self.membrane.limit,
            membrane_drag: self.membrane.drag,
            membrane_node_radius: self.membrane.node_radius,

            predator_radius: self.predator.radius,
            kill_radius: self.predator.kill_radius,
            predator_limit: self.predator.limit,
            predator_drag: self.predator.drag,
            predator_wander: self.predator.wander,

            pointer_strength: self.pointer.strength,
            pointer_distance: self.pointer.distance,
            inv_pointer_distance: if self.pointer.distance > 1e-9 {
                1.0 / self.pointer.distance
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        GrowthConfig::default().validate().unwrap();
    }

    #[test]
    fn undersized_capacity_fails_fast() {
        let mut config = GrowthConfig::default();
        config.simulation.seed = Seed::Triangle;
        config.simulation.cell_capacity = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn degenerate_trigger_intervals_fail_fast() {
        let mut config = GrowthConfig::default();
        config.division.trigger = DivisionTrigger::Frames(0);
        assert!(config.validate().is_err());
        config.division.trigger = DivisionTrigger::Seconds(0.0);
        assert!(config.validate().is_err());
        config.division.trigger = DivisionTrigger::Seconds(-1.0);
        assert!(config.validate().is_err());
        config.division.trigger = DivisionTrigger::Seconds(0.5);
        config.validate().unwrap();
    }

    #[test]
    fn mesh_seed_derives_edge_and_face_capacity() {
        let mut config = GrowthConfig::default();
        config.simulation.seed = Seed::Triangle;
        config.simulation.cell_capacity = 100;
        let params = config.get_sim_params();
        assert_eq!(params.edge_capacity, 300);
        assert_eq!(params.face_capacity, 200);
        assert!(params.mesh);
    }

    #[test]
    fn partial_toml_uses_section_defaults() {
        let config: GrowthConfig = toml::from_str(
            r#"
            [simulation]
            cell_capacity = 64
            seed = "cell"
            random_seed = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.cell_capacity, 64);
        assert_eq!(config.division.max_link, 8);
        let params = config.get_sim_params();
        assert_eq!(params.edge_capacity, 64);
        assert_eq!(params.face_capacity, 0);
    }
}
