use serde::{Deserialize, Serialize};

/// Runtime parameters derived from the configuration, consumed every phase.
/// Static for the lifetime of one simulation instance; changing a capacity
/// requires re-initialization, not a live resize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Capacities (fixed address spaces, one per arena)
    pub cell_capacity: u32,
    pub edge_capacity: u32,
    pub face_capacity: u32,
    pub membrane_node_capacity: u32,
    pub predator_capacity: u32,
    /// True when the seed built a face mesh; selects edge-split division.
    pub mesh: bool,
    pub random_seed: u64,

    // Cell properties
    pub radius: f32,
    pub threshold: f32,
    pub grow_speed: f32,
    pub limit: f32,
    pub drag: f32,
    pub repulsion: f32,
    pub stiffness: f32,

    // Division
    pub divide_rate: f32,
    pub divide_threshold: u32,
    pub max_link: u32,
    pub min_interval: f32,
    pub checked_protocol: bool,

    // Membrane
    pub membrane_radius: f32,
    pub membrane_tension: f32,
    pub membrane_limit: f32,
    pub membrane_drag: f32,
    pub membrane_node_radius: f32,

    // Predators
    pub predator_radius: f32,
    pub kill_radius: f32,
    pub predator_limit: f32,
    pub predator_drag: f32,
    pub predator_wander: f32,

    // Pointer
    pub pointer_strength: f32,
    pub pointer_distance: f32,
    pub inv_pointer_distance: f32,
}

impl Default for SimParams {
    /// Exactly what the default configuration flattens to, so tests can
    /// start from the same baseline the binary does.
    fn default() -> Self {
        crate::config::GrowthConfig::default().get_sim_params()
    }
}
