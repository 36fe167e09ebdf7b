pub mod config;
pub mod sim_params;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    CellSection, DivisionProtocol, DivisionSection, DivisionTrigger, GrowthConfig,
    MembraneSection, OutputSection, PointerSection, PredatorSection, Seed, SimulationSection,
    TimingSection,
};
pub use sim_params::SimParams;
pub use vecmath::{angle_to_vec, clamp, lerp, vec_to_angle, Vec2};
