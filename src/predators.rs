//! Predator swarm: a small free-moving arena that culls cells on contact.
//! Dead cells drop their slot back to the pool here; the incident edges and
//! faces are reclaimed by the regular removal passes of the same step.

use crate::entity::{Predator, ALIVE, DEAD};
use crate::state::{slot_rng, StepCtx, World};
use growth_common::Vec2;
use rand::Rng;
use rand_distr::{Distribution, UnitCircle};
use rayon::prelude::*;

const EMIT_SALT: u64 = 0x9AED;
const WANDER_SALT: u64 = 0x3A2D;

/// Spawns up to `count` predators scattered inside the given radius.
pub fn emit_predators(world: &mut World, center: Vec2, radius: f32, count: u32, frame: u64) -> u32 {
    let params = world.params.clone();
    let mut emitted = 0;
    for _ in 0..count {
        let slot = match world.predators.pool.consume() {
            Some(slot) => slot,
            None => break,
        };
        let mut rng = slot_rng(params.random_seed, slot, frame, EMIT_SALT);
        let dir: [f32; 2] = UnitCircle.sample(&mut rng);
        let spread: f32 = rng.random_range(0.0..radius.max(1e-3));
        world.predators.read_mut()[slot as usize] = Predator {
            position: center.add(Vec2::new(dir[0], dir[1]).scale(spread)),
            velocity: Vec2::zero(),
            force: Vec2::zero(),
            radius: params.predator_radius,
            stress: 0.0,
            alive: ALIVE,
        };
        emitted += 1;
    }
    emitted
}

/// Pairwise separation between predators, staged like the cell pass.
pub fn interact_predators(world: &mut World, _ctx: &StepCtx) {
    let (cur, next) = world.predators.split();
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
                force = force.add(dir.scale(reach - dist));
            }
        }
        out.force = force;
    });
    world.predators.swap();
}

/// Wander plus pointer drift, then integration. Own-slot writes only.
pub fn update_predators(world: &mut World, ctx: &StepCtx) {
    let params = world.params.clone();
    let pointer = world.pointer;
    let frame = ctx.frame;
    world
        .predators
        .read_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(slot, predator)| {
            if !predator.is_alive() {
                return;
            }
            let mut rng = slot_rng(params.random_seed, slot as u32, frame, WANDER_SALT);
            let dir: [f32; 2] = UnitCircle.sample(&mut rng);
            let mut force = predator
                .force
                .add(Vec2::new(dir[0], dir[1]).scale(params.predator_wander));
            force = force.add(pointer.force(
                predator.position,
                params.pointer_strength,
                params.pointer_distance,
                params.inv_pointer_distance,
            ));

            let mut velocity = predator.velocity.add(force.scale(ctx.dt));
            let speed = velocity.length();
            if speed > params.predator_limit {
                velocity = velocity.scale(params.predator_limit / speed);
            }
            velocity = velocity.scale(params.predator_drag);
            let position = predator.position.add(velocity.scale(ctx.dt));
            if position.is_finite() && velocity.is_finite() {
                predator.position = position;
                predator.velocity = velocity;
            } else {
                predator.velocity = Vec2::zero();
            }
            predator.force = Vec2::zero();
            predator.stress += ctx.dt;
        });
}

/// Kills every alive cell within a predator's kill radius. Parallel over
/// cells; each unit writes only its own slot and appends it for reuse.
pub fn hunt(world: &mut World, _ctx: &StepCtx) {
    let kill_radius = world.params.kill_radius;
    let predators: Vec<Predator> = world
        .predators
        .read()
        .iter()
        .copied()
        .filter(|p| p.is_alive())
        .collect();
    if predators.is_empty() {
        return;
    }
    let (cells, pool) = world.cells.read_mut_and_pool();
    cells.par_iter_mut().enumerate().for_each(|(slot, cell)| {
        if !cell.is_alive() {
            return;
        }
        let reach = kill_radius + cell.radius;
        let caught = predators
            .iter()
            .any(|p| p.position.distance_squared(cell.position) < reach * reach);
        if caught {
            cell.alive = DEAD;
            cell.dividable = 0;
            pool.append(slot as u32);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::emit_cells;
    use growth_common::SimParams;

    fn hunting_world() -> World {
        let mut params = SimParams::default();
        params.cell_capacity = 4;
        params.edge_capacity = 12;
        params.predator_capacity = 2;
        let mut world = World::new(params);
        world.cells.pool.fill_reverse();
        world.edges.pool.fill_reverse();
        world.predators.pool.fill_reverse();
        world
    }

    #[test]
    fn hunt_reclaims_only_cells_in_reach() {
        let mut world = hunting_world();
        emit_cells(&mut world, Vec2::zero(), 2, 0);
        {
            let cells = world.cells.read_mut();
            cells[0].position = Vec2::new(0.0, 0.0);
            cells[1].position = Vec2::new(20.0, 0.0);
        }
        emit_predators(&mut world, Vec2::zero(), 0.1, 1, 0);

        let ctx = StepCtx { dt: 0.016, time: 0.0, frame: 0 };
        hunt(&mut world, &ctx);

        let cells = world.cells.read();
        assert!(!cells[0].is_alive(), "cell under the predator dies");
        assert!(cells[1].is_alive(), "distant cell untouched");
        assert_eq!(world.cells.pool.count(), 3);
    }

    #[test]
    fn wander_is_deterministic_per_slot_and_frame() {
        let mut a = hunting_world();
        let mut b = hunting_world();
        emit_predators(&mut a, Vec2::zero(), 1.0, 2, 0);
        emit_predators(&mut b, Vec2::zero(), 1.0, 2, 0);

        let ctx = StepCtx { dt: 0.016, time: 0.0, frame: 3 };
        update_predators(&mut a, &ctx);
        update_predators(&mut b, &ctx);

        for (pa, pb) in a.predators.read().iter().zip(b.predators.read()) {
            assert_eq!(pa.position, pb.position);
            assert_eq!(pa.velocity, pb.velocity);
        }
    }
}
