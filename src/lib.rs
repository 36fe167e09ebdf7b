//! CPU-parallel cellular growth engine: fixed-capacity slot arenas,
//! generation-swapped buffers, and a phase pipeline that grows a cell
//! graph through stochastic division while a membrane ring contains it
//! and optional predators cull it.

pub mod arena;
pub mod cells;
pub mod division;
pub mod edges;
pub mod entity;
pub mod faces;
pub mod membrane;
pub mod phase;
pub mod pointer;
pub mod pool;
pub mod predators;
pub mod simulation;
pub mod state;

pub use pointer::ExternalInput;
pub use simulation::{DrawCounts, PoolCounts, RenderView, Simulation, Snapshot};
pub use state::{StepCtx, World};
