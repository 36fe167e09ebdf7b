//! Division pipeline: Activate flags candidates in parallel, Check
//! arbitrates neighboring candidates, Divide applies the survivors
//! serially in ascending slot order so daughter placement is deterministic.

use crate::entity::{Cell, Edge, Face, ALIVE};
use crate::pool::SlotPool;
use crate::state::{slot_rng, StepCtx, World};
use growth_common::{SimParams, Vec2};
use rand::Rng;
use rand_distr::{Distribution, UnitCircle};
use rayon::prelude::*;

const ACTIVATE_SALT: u64 = 0xAC71;
const DIVIDE_SALT: u64 = 0xD1_71DE;

/// Flags cells ready to divide. A cell qualifies when it has rested past
/// the minimum interval, still has link budget, and wins its rate draw.
pub fn activate(world: &mut World, ctx: &StepCtx) {
    let params = world.params.clone();
    let frame = ctx.frame;
    world.cells.read_mut().par_iter_mut().enumerate().for_each(|(slot, cell)| {
        if !cell.is_alive() {
            cell.dividable = 0;
            return;
        }
        if cell.stress < params.min_interval || cell.links >= params.max_link {
            cell.dividable = 0;
            return;
        }
        let mut rng = slot_rng(params.random_seed, slot as u32, frame, ACTIVATE_SALT);
        cell.dividable = u32::from(rng.random::<f32>() < params.divide_rate);
    });
}

/// Arbitration pass of the checked protocol: when both endpoints of an
/// alive edge are flagged, the higher-index endpoint yields. Staged so
/// every cell decides against the same flag snapshot.
pub fn check(world: &mut World, _ctx: &StepCtx) {
    let edges = world.edges.read();
    let (cur, next) = world.cells.split();
    next.par_iter_mut().enumerate().for_each(|(i, out)| {
        *out = cur[i];
        if !out.is_alive() || out.dividable == 0 {
            return;
        }
        let slot = i as u32;
        for edge in edges {
            if !edge.is_alive() || !edge.touches(slot) {
                continue;
            }
            let other = edge.opposite(slot) as usize;
            if other < i {
                if let Some(neighbor) = cur.get(other) {
                    if neighbor.is_alive() && neighbor.dividable != 0 {
                        out.dividable = 0;
                        return;
                    }
                }
            }
        }
    });
    world.cells.swap();
}

/// Applies every surviving flag, stopping at the population threshold.
/// Serial by design: slot allocation order and daughter placement must not
/// depend on thread scheduling.
pub fn divide(world: &mut World, ctx: &StepCtx) {
    let params = world.params.clone();
    let frame = ctx.frame;
    let (cells, cell_pool) = world.cells.read_mut_and_pool();
    let (edges, edge_pool) = world.edges.read_mut_and_pool();
    let (faces, face_pool) = world.faces.read_mut_and_pool();

    let mut alive = cells.iter().filter(|c| c.is_alive()).count() as u32;
    let candidates: Vec<u32> = cells
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_alive() && c.dividable != 0)
        .map(|(i, _)| i as u32)
        .collect();

    for parent in candidates {
        cells[parent as usize].dividable = 0;
        if alive >= params.divide_threshold {
            continue;
        }
        let applied = if params.mesh {
            split_edge(cells, edges, faces, cell_pool, edge_pool, face_pool, parent, &params)
        } else {
            bud(cells, edges, cell_pool, edge_pool, parent, &params, frame)
        };
        if applied {
            cells[parent as usize].stress = 0.0;
            alive += 1;
        }
    }
}

/// Free-graph division: one new cell budded off the parent, tethered by one
/// new edge. Consumed slots are returned untouched when either pool runs
/// dry; a division either happens fully or not at all.
fn bud(
    cells: &mut [Cell],
    edges: &mut [Edge],
    cell_pool: &SlotPool,
    edge_pool: &SlotPool,
    parent: u32,
    params: &SimParams,
    frame: u64,
) -> bool {
    let child = match cell_pool.consume() {
        Some(slot) => slot,
        None => return false,
    };
    let edge = match edge_pool.consume() {
        Some(slot) => slot,
        None => {
            cell_pool.append(child);
            return false;
        }
    };

    let mut rng = slot_rng(params.random_seed, parent, frame, DIVIDE_SALT);
    let dir: [f32; 2] = UnitCircle.sample(&mut rng);
    let snapshot = cells[parent as usize];
    let half = (snapshot.radius * 0.5).max(params.radius * 0.1);
    let offset = Vec2::new(dir[0], dir[1]).scale(snapshot.radius.max(1e-3));

    cells[child as usize] = Cell {
        position: snapshot.position.add(offset),
        velocity: snapshot.velocity,
        force: Vec2::zero(),
        radius: half,
        threshold: snapshot.threshold,
        stress: 0.0,
        kind: snapshot.kind,
        links: 1,
        dividable: 0,
        alive: ALIVE,
    };
    let p = &mut cells[parent as usize];
    p.radius = half;
    p.links += 1;
    edges[edge as usize] = Edge::link(parent, child);
    true
}

/// Mesh division: the parent's longest alive edge (P, Q) is split at its
/// midpoint by the new cell C. The old edge is rewired to (P, C), a new
/// edge (C, Q) is added, and every face on (P, Q) is split in two through
/// a new edge (C, R). The triangulation stays closed throughout.
fn split_edge(
    cells: &mut [Cell],
    edges: &mut [Edge],
    faces: &mut [Face],
    cell_pool: &SlotPool,
    edge_pool: &SlotPool,
    face_pool: &SlotPool,
    parent: u32,
    params: &SimParams,
) -> bool {
    let mut split: Option<(u32, f32)> = None;
    for (i, edge) in edges.iter().enumerate() {
        if !edge.is_alive() || !edge.touches(parent) {
            continue;
        }
        let other = edge.opposite(parent) as usize;
        if other >= cells.len() || !cells[other].is_alive() {
            continue;
        }
        // Splitting here gives the child 2 + sides links and raises each
        // opposite corner by one; candidates that would breach the link
        // budget are skipped, possibly leaving the flag unapplied this frame.
        let mut sides = 0u32;
        let mut fits = true;
        for face in faces.iter().filter(|f| f.is_alive() && f.has_edge(i as u32)) {
            sides += 1;
            let r = face.corner_opposite(parent, other as u32) as usize;
            if cells[r].links >= params.max_link {
                fits = false;
                break;
            }
        }
        if !fits || 2 + sides > params.max_link {
            continue;
        }
        let len = cells[parent as usize]
            .position
            .distance_squared(cells[other].position);
        if split.map_or(true, |(_, best)| len > best) {
            split = Some((i as u32, len));
        }
    }
    let Some((edge_slot, _)) = split else {
        return false;
    };
    let q = edges[edge_slot as usize].opposite(parent);

    let incident: Vec<u32> = faces
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_alive() && f.has_edge(edge_slot))
        .map(|(i, _)| i as u32)
        .collect();

    // All-or-nothing allocation: 1 cell, 1 edge for (C, Q), one edge and one
    // face per incident face.
    let mut claimed_edges = Vec::with_capacity(1 + incident.len());
    let mut claimed_faces = Vec::with_capacity(incident.len());
    let child = match cell_pool.consume() {
        Some(slot) => slot,
        None => return false,
    };
    let mut rollback = false;
    for _ in 0..1 + incident.len() {
        match edge_pool.consume() {
            Some(slot) => claimed_edges.push(slot),
            None => {
                rollback = true;
                break;
            }
        }
    }
    if !rollback {
        for _ in 0..incident.len() {
            match face_pool.consume() {
                Some(slot) => claimed_faces.push(slot),
                None => {
                    rollback = true;
                    break;
                }
            }
        }
    }
    if rollback {
        cell_pool.append(child);
        for slot in claimed_edges {
            edge_pool.append(slot);
        }
        for slot in claimed_faces {
            face_pool.append(slot);
        }
        return false;
    }

    let snapshot_p = cells[parent as usize];
    let snapshot_q = cells[q as usize];
    let half = snapshot_p.radius * 0.5;
    cells[child as usize] = Cell {
        position: snapshot_p.position.add(snapshot_q.position).scale(0.5),
        velocity: snapshot_p.velocity,
        force: Vec2::zero(),
        radius: half,
        threshold: snapshot_p.threshold,
        stress: 0.0,
        kind: snapshot_p.kind,
        links: (2 + incident.len()) as u32,
        dividable: 0,
        alive: ALIVE,
    };
    cells[parent as usize].radius = half;

    // (P, Q) becomes (P, C); (C, Q) takes a fresh slot. Degrees of P and Q
    // are unchanged by the rewire itself.
    let edge_cq = claimed_edges[0];
    if edges[edge_slot as usize].a == parent {
        edges[edge_slot as usize].b = child;
    } else {
        edges[edge_slot as usize].a = child;
    }
    edges[edge_cq as usize] = Edge::link(child, q);

    for (n, &face_slot) in incident.iter().enumerate() {
        let face = faces[face_slot as usize];
        let r = face.corner_opposite(parent, q);
        let edge_cr = claimed_edges[1 + n];
        edges[edge_cr as usize] = Edge::link(child, r);

        let find = |x: u32, y: u32| {
            face.edges()
                .into_iter()
                .find(|&e| edges[e as usize].connects(x, y))
                .unwrap_or(edge_slot)
        };
        let edge_pr = find(parent, r);
        let edge_qr = find(q, r);

        faces[face_slot as usize] = Face::triangle([parent, child, r], [edge_slot, edge_cr, edge_pr]);
        faces[claimed_faces[n] as usize] = Face::triangle([child, q, r], [edge_cq, edge_cr, edge_qr]);
        cells[r as usize].links += 1;
    }
    true
}
