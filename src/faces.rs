//! Face bookkeeping for the mesh seed. Faces never move anything; they
//! exist so edge-split division can keep the triangulation closed.

use crate::entity::DEAD;
use crate::state::{StepCtx, World};
use rayon::prelude::*;

/// Reclaims faces that were flagged removable or that reference a dead
/// corner or edge. Runs after RemoveEdges so an edge death cascades into
/// its faces within the same step.
pub fn remove_faces(world: &mut World, _ctx: &StepCtx) {
    if world.faces.capacity() == 0 {
        return;
    }
    let cells = world.cells.read();
    let edges = world.edges.read();
    let invalid: Vec<bool> = world
        .faces
        .read()
        .iter()
        .map(|face| {
            if !face.is_alive() {
                return false;
            }
            let corner_dead = face
                .corners()
                .iter()
                .any(|&c| cells.get(c as usize).map_or(true, |cell| !cell.is_alive()));
            let edge_dead = face
                .edges()
                .iter()
                .any(|&e| edges.get(e as usize).map_or(true, |edge| !edge.is_alive()));
            corner_dead || edge_dead
        })
        .collect();

    let (faces, pool) = world.faces.read_mut_and_pool();
    faces.par_iter_mut().enumerate().for_each(|(slot, face)| {
        if !face.is_alive() {
            return;
        }
        if face.removable != 0 || invalid[slot] {
            face.alive = DEAD;
            face.removable = 0;
            pool.append(slot as u32);
        }
    });
}
