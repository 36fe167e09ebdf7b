//! Cell motion: pairwise repulsion (staged), force gathering and
//! integration (in place), plus the host-side emit and area-removal ops.

use crate::entity::{Cell, ALIVE, DEAD};
use crate::state::{slot_rng, StepCtx, World};
use growth_common::{clamp, lerp, Vec2};
use rand::Rng;
use rand_distr::{Distribution, UnitCircle};
use rayon::prelude::*;

const EMIT_SALT: u64 = 0xE517;

/// Pairwise repulsion over the whole arena, staged through the next
/// generation so every unit reads one consistent snapshot. Overwrites the
/// transient force field; later passes in the same step add to it.
pub fn interact_cells(world: &mut World, _ctx: &StepCtx) {
    let repulsion = world.params.repulsion;
    let (cur, next) = world.cells.split();
    next.par_iter_mut().enumerate().for_each(|(i, out)| {
        *out = cur[i];
        if !out.is_alive() {
            return;
        }
        let mut force = Vec2::zero();
        for (j, other) in cur.iter().enumerate() {
            if i == j || !other.is_alive() {
                continue;
            }
            let offset = out.position.sub(other.position);
            let dist = offset.length();
            let reach = out.radius + other.radius;
            if dist < reach {
                let dir = offset.normalize_or(Vec2::new(1.0, 0.0));
                force = force.add(dir.scale((reach - dist) * repulsion));
            }
        }
        out.force = force;
    });
    world.cells.swap();
}

/// Gathers spring forces from incident edges and the pointer, grows the
/// radius toward its threshold, then integrates. Own-slot writes only.
pub fn update_cells(world: &mut World, ctx: &StepCtx) {
    let params = world.params.clone();
    let pointer = world.pointer;
    let edges = world.edges.read();
    let cells = world.cells.read_mut();
    cells.par_iter_mut().enumerate().for_each(|(i, cell)| {
        if !cell.is_alive() {
            return;
        }
        let slot = i as u32;
        let mut force = cell.force;
        for edge in edges {
            if !edge.is_alive() {
                continue;
            }
            if edge.a == slot {
                force = force.add(edge.fa);
            } else if edge.b == slot {
                force = force.add(edge.fb);
            }
        }
        force = force.add(pointer.force(
            cell.position,
            params.pointer_strength,
            params.pointer_distance,
            params.inv_pointer_distance,
        ));

        cell.radius = lerp(cell.radius, cell.threshold, clamp(ctx.dt * params.grow_speed, 0.0, 1.0));

        let mut velocity = cell.velocity.add(force.scale(ctx.dt));
        let speed = velocity.length();
        if speed > params.limit {
            velocity = velocity.scale(params.limit / speed);
        }
        velocity = velocity.scale(params.drag);
        let position = cell.position.add(velocity.scale(ctx.dt));
        if position.is_finite() && velocity.is_finite() {
            cell.position = position;
            cell.velocity = velocity;
        } else {
            cell.velocity = Vec2::zero();
        }
        cell.force = Vec2::zero();
        cell.stress += ctx.dt;
    });
}

/// Spawns up to `count` new cells scattered around `center`. Serial host
/// operation; returns the slots actually claimed (the pool may run dry).
pub fn emit_cells(world: &mut World, center: Vec2, count: u32, frame: u64) -> Vec<u32> {
    let params = world.params.clone();
    let mut emitted = Vec::new();
    for n in 0..count {
        let slot = match world.cells.pool.consume() {
            Some(slot) => slot,
            None => break,
        };
        let mut rng = slot_rng(params.random_seed, slot, frame, EMIT_SALT.wrapping_add(n as u64));
        let dir: [f32; 2] = UnitCircle.sample(&mut rng);
        let spread: f32 = rng.random_range(0.0..params.radius);
        world.cells.read_mut()[slot as usize] = Cell {
            position: center.add(Vec2::new(dir[0], dir[1]).scale(spread)),
            velocity: Vec2::zero(),
            force: Vec2::zero(),
            radius: params.radius * 0.5,
            threshold: params.threshold,
            stress: 0.0,
            kind: 0,
            links: 0,
            dividable: 0,
            alive: ALIVE,
        };
        emitted.push(slot);
    }
    emitted
}

/// Kills every alive cell inside the given circle and returns its slot to
/// the pool. Incident edges and faces fall out through the regular removal
/// passes of the same step.
pub fn remove_cells_circle(world: &mut World, center: Vec2, radius: f32) -> u32 {
    let r2 = radius * radius;
    let (cells, pool) = world.cells.read_mut_and_pool();
    let removed = cells
        .par_iter_mut()
        .enumerate()
        .filter(|(_, cell)| cell.is_alive() && cell.position.distance_squared(center) < r2)
        .map(|(slot, cell)| {
            cell.alive = DEAD;
            cell.dividable = 0;
            pool.append(slot as u32);
            1u32
        })
        .sum();
    removed
}

/// Kills every alive cell within `threshold` of the segment from `start`
/// to `end`. Same reclamation contract as the circle variant; a degenerate
/// segment collapses to a point test.
pub fn remove_cells_line(world: &mut World, start: Vec2, end: Vec2, threshold: f32) -> u32 {
    let seg = end.sub(start);
    let len2 = seg.length_squared();
    let t2 = threshold * threshold;
    let (cells, pool) = world.cells.read_mut_and_pool();
    cells
        .par_iter_mut()
        .enumerate()
        .filter(|(_, cell)| {
            if !cell.is_alive() {
                return false;
            }
            let t = if len2 > 0.0 {
                clamp(cell.position.sub(start).dot(seg) / len2, 0.0, 1.0)
            } else {
                0.0
            };
            let nearest = start.add(seg.scale(t));
            cell.position.distance_squared(nearest) < t2
        })
        .map(|(slot, cell)| {
            cell.alive = DEAD;
            cell.dividable = 0;
            pool.append(slot as u32);
            1u32
        })
        .sum()
}
