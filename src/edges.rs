//! Spring edges of the cell graph. UpdateEdges writes fresh per-endpoint
//! forces each step (overwrite, not accumulate); UpdateCells gathers them.

use crate::entity::DEAD;
use crate::state::{StepCtx, World};
use growth_common::Vec2;
use rayon::prelude::*;

/// Per-edge spring relaxation toward the endpoints' combined radii. Edges
/// with a dead or out-of-range endpoint are flagged removable instead.
pub fn update_edges(world: &mut World, ctx: &StepCtx) {
    let stiffness = world.params.stiffness;
    let cells = world.cells.read();
    let count = cells.len();
    world.edges.read_mut().par_iter_mut().for_each(|edge| {
        if !edge.is_alive() {
            return;
        }
        let (a, b) = (edge.a as usize, edge.b as usize);
        if a >= count || b >= count || !cells[a].is_alive() || !cells[b].is_alive() {
            edge.removable = 1;
            edge.fa = Vec2::zero();
            edge.fb = Vec2::zero();
            return;
        }
        let offset = cells[b].position.sub(cells[a].position);
        let rest = cells[a].radius + cells[b].radius;
        let dist = offset.length();
        if dist <= 1e-5 || rest <= 1e-5 {
            edge.fa = Vec2::zero();
            edge.fb = Vec2::zero();
            return;
        }
        let strain = (dist - rest) / rest;
        let f = offset.scale(1.0 / dist).scale(strain * stiffness * ctx.dt);
        edge.fa = f;
        edge.fb = f.scale(-1.0);
    });
}

/// Reclaims flagged edges and edges that lost an endpoint, then recounts
/// every cell's link degree from the surviving set. Counting from scratch
/// keeps the degree exact regardless of how many edges died this step.
pub fn remove_edges(world: &mut World, _ctx: &StepCtx) {
    let cells = world.cells.read();
    let cell_count = cells.len();
    let dead_endpoint: Vec<bool> = world
        .edges
        .read()
        .iter()
        .map(|edge| {
            let (a, b) = (edge.a as usize, edge.b as usize);
            a >= cell_count || b >= cell_count || !cells[a].is_alive() || !cells[b].is_alive()
        })
        .collect();

    let (edges, pool) = world.edges.read_mut_and_pool();
    edges.par_iter_mut().enumerate().for_each(|(slot, edge)| {
        if !edge.is_alive() {
            return;
        }
        if edge.removable != 0 || dead_endpoint[slot] {
            edge.alive = DEAD;
            edge.removable = 0;
            edge.fa = Vec2::zero();
            edge.fb = Vec2::zero();
            pool.append(slot as u32);
        }
    });

    recount_links(world);
}

/// Rebuilds `Cell::links` by scanning the alive edges.
pub fn recount_links(world: &mut World) {
    let mut degrees = vec![0u32; world.cells.read().len()];
    for edge in world.edges.read() {
        if !edge.is_alive() {
            continue;
        }
        if let Some(d) = degrees.get_mut(edge.a as usize) {
            *d += 1;
        }
        if let Some(d) = degrees.get_mut(edge.b as usize) {
            *d += 1;
        }
    }
    for (cell, degree) in world.cells.read_mut().iter_mut().zip(degrees) {
        cell.links = if cell.is_alive() { degree } else { 0 };
    }
}
