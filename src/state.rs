use crate::arena::Arena;
use crate::entity::{Cell, Edge, Face, Predator};
use crate::membrane::Membrane;
use crate::pointer::Pointer;
use growth_common::SimParams;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Per-step context handed to every kernel dispatch.
#[derive(Debug, Clone, Copy)]
pub struct StepCtx {
    pub dt: f32,
    pub time: f32,
    pub frame: u64,
}

/// The whole mutable simulation state: one arena per entity kind plus the
/// membrane sub-state and the pointer ramp. Fields are public so
/// integration tests and buffer consumers can inspect them directly.
#[derive(Debug)]
pub struct World {
    pub params: SimParams,
    pub cells: Arena<Cell>,
    pub edges: Arena<Edge>,
    pub faces: Arena<Face>,
    pub membrane: Membrane,
    pub predators: Arena<Predator>,
    pub pointer: Pointer,
}

impl World {
    pub fn new(params: SimParams) -> Self {
        let membrane = Membrane::new(params.membrane_node_capacity);
        World {
            cells: Arena::new(params.cell_capacity),
            edges: Arena::new(params.edge_capacity),
            faces: Arena::new(params.face_capacity),
            membrane,
            predators: Arena::new(params.predator_capacity),
            pointer: Pointer::new(),
            params,
        }
    }

    /// Number of alive cells, counted directly from the buffer.
    pub fn count_alive_cells(&self) -> u32 {
        self.cells.read().iter().filter(|c| c.is_alive()).count() as u32
    }

    pub fn count_alive_edges(&self) -> u32 {
        self.edges.read().iter().filter(|e| e.is_alive()).count() as u32
    }

    pub fn count_alive_faces(&self) -> u32 {
        self.faces.read().iter().filter(|f| f.is_alive()).count() as u32
    }
}

/// Deterministic per-slot RNG stream: every parallel unit seeds its own
/// generator from (base seed, slot, frame, kernel salt), the same scheme the
/// engine uses for physics and activation draws so results do not depend on
/// the parallel execution width.
#[inline]
pub fn slot_rng(base: u64, slot: u32, frame: u64, salt: u64) -> StdRng {
    let seed = base
        .wrapping_add((slot as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(frame.wrapping_mul(0xBF58_476D_1CE4_E5B9))
        .wrapping_add(salt);
    StdRng::seed_from_u64(seed)
}
