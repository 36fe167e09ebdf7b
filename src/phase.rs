//! Phase identifiers and the kernel registry. The host pipeline names
//! phases; the registry resolves each one to its kernel function once at
//! startup, so the per-step dispatch is a plain indexed call.

use crate::state::{StepCtx, World};
use crate::{cells, division, edges, faces, membrane, predators};

pub type Kernel = fn(&mut World, &StepCtx);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    UpdateEdges,
    InteractCells,
    UpdateCells,
    WrapCells,
    MembraneInteract,
    MembraneStretch,
    MembraneExpand,
    MembraneUpdate,
    MembraneRelax,
    PredatorInteract,
    PredatorUpdate,
    WrapPredators,
    Hunt,
    Activate,
    Check,
    Divide,
    RemoveEdges,
    RemoveFaces,
}

impl Phase {
    pub const ALL: [Phase; 18] = [
        Phase::UpdateEdges,
        Phase::InteractCells,
        Phase::UpdateCells,
        Phase::WrapCells,
        Phase::MembraneInteract,
        Phase::MembraneStretch,
        Phase::MembraneExpand,
        Phase::MembraneUpdate,
        Phase::MembraneRelax,
        Phase::PredatorInteract,
        Phase::PredatorUpdate,
        Phase::WrapPredators,
        Phase::Hunt,
        Phase::Activate,
        Phase::Check,
        Phase::Divide,
        Phase::RemoveEdges,
        Phase::RemoveFaces,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::UpdateEdges => "update_edges",
            Phase::InteractCells => "interact_cells",
            Phase::UpdateCells => "update_cells",
            Phase::WrapCells => "wrap_cells",
            Phase::MembraneInteract => "membrane_interact",
            Phase::MembraneStretch => "membrane_stretch",
            Phase::MembraneExpand => "membrane_expand",
            Phase::MembraneUpdate => "membrane_update",
            Phase::MembraneRelax => "membrane_relax",
            Phase::PredatorInteract => "predator_interact",
            Phase::PredatorUpdate => "predator_update",
            Phase::WrapPredators => "wrap_predators",
            Phase::Hunt => "hunt",
            Phase::Activate => "activate",
            Phase::Check => "check",
            Phase::Divide => "divide",
            Phase::RemoveEdges => "remove_edges",
            Phase::RemoveFaces => "remove_faces",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&p| p == self).unwrap_or(0)
    }
}

/// Phase-to-kernel table, built once per simulation instance.
pub struct KernelRegistry {
    table: [Kernel; Phase::ALL.len()],
}

impl KernelRegistry {
    pub fn resolve() -> Self {
        let mut table: [Kernel; Phase::ALL.len()] = [noop; Phase::ALL.len()];
        for phase in Phase::ALL {
            table[phase.index()] = match phase {
                Phase::UpdateEdges => edges::update_edges,
                Phase::InteractCells => cells::interact_cells,
                Phase::UpdateCells => cells::update_cells,
                Phase::WrapCells => membrane::wrap_cells,
                Phase::MembraneInteract => membrane::interact_nodes,
                Phase::MembraneStretch => membrane::stretch,
                Phase::MembraneExpand => membrane::expand,
                Phase::MembraneUpdate => membrane::update_nodes,
                Phase::MembraneRelax => membrane::relax,
                Phase::PredatorInteract => predators::interact_predators,
                Phase::PredatorUpdate => predators::update_predators,
                Phase::WrapPredators => membrane::wrap_predators,
                Phase::Hunt => predators::hunt,
                Phase::Activate => division::activate,
                Phase::Check => division::check,
                Phase::Divide => division::divide,
                Phase::RemoveEdges => edges::remove_edges,
                Phase::RemoveFaces => faces::remove_faces,
            };
        }
        KernelRegistry { table }
    }

    pub fn dispatch(&self, phase: Phase, world: &mut World, ctx: &StepCtx) {
        log::trace!("dispatch {}", phase.name());
        (self.table[phase.index()])(world, ctx);
    }
}

impl std::fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("phases", &Phase::ALL.len())
            .finish()
    }
}

fn noop(_: &mut World, _: &StepCtx) {}
