//! Boundary ring simulation. The membrane owns its own node/edge arenas,
//! disjoint from the cell graph; the only coupling back onto cells and
//! predators is the containment force applied by the wrap kernels.

use crate::arena::Arena;
use crate::entity::{MembraneEdge, MembraneNode, ALIVE};
use crate::state::{StepCtx, World};
use growth_common::{clamp, lerp, Vec2};
use rayon::prelude::*;
use std::f32::consts::PI;

#[derive(Debug)]
pub struct Membrane {
    pub nodes: Arena<MembraneNode>,
    pub edges: Arena<MembraneEdge>,
    /// Eased ring radius, interpolating toward the configured rest radius.
    pub current: f32,
}

impl Membrane {
    pub fn new(node_capacity: u32) -> Self {
        Membrane {
            nodes: Arena::new(node_capacity),
            edges: Arena::new(node_capacity),
            current: 0.0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.nodes.capacity() > 0
    }

    /// Builds the closed ring: every node on a circle of the given radius,
    /// every edge connecting consecutive nodes. Consumes the full pools.
    pub fn seed_ring(&mut self, radius: f32, node_radius: f32) {
        let count = self.nodes.capacity();
        if count == 0 {
            return;
        }
        self.current = radius;
        let inv = 1.0 / count as f32;

        let (nodes, node_pool) = self.nodes.read_mut_and_pool();
        for i in 0..count {
            let slot = match node_pool.consume() {
                Some(slot) => slot as usize,
                None => break,
            };
            let theta = 2.0 * PI * i as f32 * inv;
            nodes[slot] = MembraneNode {
                position: Vec2::new(theta.cos(), theta.sin()).scale(radius),
                velocity: Vec2::zero(),
                force: Vec2::zero(),
                radius: node_radius,
                alive: ALIVE,
            };
        }

        let (edges, edge_pool) = self.edges.read_mut_and_pool();
        for i in 0..count {
            let slot = match edge_pool.consume() {
                Some(slot) => slot as usize,
                None => break,
            };
            edges[slot] = MembraneEdge {
                a: i,
                b: (i + 1) % count,
                fa: Vec2::zero(),
                fb: Vec2::zero(),
                alive: ALIVE,
            };
        }
    }

    /// Eases the ring radius toward its resting value. Host-side, once per
    /// step before the stretch pass.
    pub fn ease(&mut self, rest_radius: f32, dt: f32) {
        self.current = lerp(self.current, rest_radius, clamp(dt * 10.0, 0.0, 1.0));
    }

    /// Target inter-node spring length for the current ring circumference.
    pub fn target_edge_length(&self) -> f32 {
        let count = self.nodes.capacity().max(1) as f32;
        ((2.0 * self.current * PI) / count).max(0.1)
    }

    /// Mean position of alive nodes; origin for a fully dead ring.
    pub fn centroid(&self) -> Vec2 {
        let mut sum = Vec2::zero();
        let mut n = 0u32;
        for node in self.nodes.read() {
            if node.is_alive() {
                sum = sum.add(node.position);
                n += 1;
            }
        }
        if n == 0 {
            Vec2::zero()
        } else {
            sum.scale(1.0 / n as f32)
        }
    }

    /// Containment test: given an element's position and radius, returns the
    /// inward correction direction and overshoot when the element sits
    /// outside the ring, measured against the nearest alive node.
    pub fn containment(&self, position: Vec2, radius: f32, centroid: Vec2) -> Option<(Vec2, f32)> {
        let mut nearest_r = f32::NAN;
        let mut best = f32::INFINITY;
        for node in self.nodes.read() {
            if !node.is_alive() {
                continue;
            }
            let d = node.position.distance_squared(position);
            if d < best {
                best = d;
                nearest_r = node.position.distance(centroid) - node.radius;
            }
        }
        if !nearest_r.is_finite() {
            return None;
        }
        let offset = position.sub(centroid);
        let dist = offset.length();
        let allowed = (nearest_r - radius).max(0.0);
        if dist <= allowed {
            return None;
        }
        let inward = offset.scale(-1.0).normalize_or(Vec2::new(-1.0, 0.0));
        Some((inward, dist - allowed))
    }
}

/// Pairwise node repulsion, staged: reads one generation, writes the next.
pub fn interact_nodes(world: &mut World, _ctx: &StepCtx) {
    let (cur, next) = world.membrane.nodes.split();
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
        out.force = out.force.add(force);
    });
    world.membrane.nodes.swap();
}

/// Per-edge spring toward the target ring edge length; forces accumulate on
/// the edge and decay in the relax pass.
pub fn stretch(world: &mut World, ctx: &StepCtx) {
    let rest = world.membrane.target_edge_length();
    let nodes = world.membrane.nodes.read();
    let count = nodes.len();
    world.membrane.edges.read_mut().par_iter_mut().for_each(|edge| {
        if !edge.is_alive() {
            return;
        }
        let (a, b) = (edge.a as usize, edge.b as usize);
        if a >= count || b >= count || !nodes[a].is_alive() || !nodes[b].is_alive() {
            return;
        }
        let offset = nodes[b].position.sub(nodes[a].position);
        let dist = offset.length().max(1e-5);
        let dir = offset.scale(1.0 / dist);
        let f = dir.scale((dist - rest) * ctx.dt);
        edge.fa = edge.fa.add(f);
        edge.fb = edge.fb.sub(f);
    });
}

/// Outward pressure from the enclosed cell population, scaled by tension.
pub fn expand(world: &mut World, ctx: &StepCtx) {
    let tension = world.params.membrane_tension;
    let capacity = world.params.membrane_node_capacity.max(1) as f32;
    let alive_cells = world
        .cells
        .read()
        .par_iter()
        .filter(|c| c.is_alive())
        .count() as f32;
    let pressure = alive_cells / capacity;
    let centroid = world.membrane.centroid();

    world.membrane.nodes.read_mut().par_iter_mut().for_each(|node| {
        if !node.is_alive() {
            return;
        }
        let outward = node.position.sub(centroid).normalize_or(Vec2::new(1.0, 0.0));
        node.force = node.force.add(outward.scale(tension * pressure * ctx.dt * 60.0));
    });
}

/// Applies accumulated node and edge forces, clamps, drags, integrates.
pub fn update_nodes(world: &mut World, ctx: &StepCtx) {
    let params = &world.params;
    let edges: Vec<MembraneEdge> = world.membrane.edges.read().to_vec();
    world
        .membrane
        .nodes
        .read_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, node)| {
            if !node.is_alive() {
                return;
            }
            let mut force = node.force;
            for edge in &edges {
                if !edge.is_alive() {
                    continue;
                }
                if edge.a as usize == i {
                    force = force.add(edge.fa);
                } else if edge.b as usize == i {
                    force = force.add(edge.fb);
                }
            }
            let mut velocity = node.velocity.add(force.scale(ctx.dt));
            let speed = velocity.length();
            if speed > params.membrane_limit {
                velocity = velocity.scale(params.membrane_limit / speed);
            }
            velocity = velocity.scale(params.membrane_drag);
            let position = node.position.add(velocity.scale(ctx.dt));
            if position.is_finite() && velocity.is_finite() {
                node.position = position;
                node.velocity = velocity;
            } else {
                node.velocity = Vec2::zero();
            }
            node.force = Vec2::zero();
        });
}

/// Decays accumulated per-edge forces back toward zero.
pub fn relax(world: &mut World, ctx: &StepCtx) {
    let decay = clamp(1.0 - 4.0 * ctx.dt, 0.0, 1.0);
    world.membrane.edges.read_mut().par_iter_mut().for_each(|edge| {
        if !edge.is_alive() {
            return;
        }
        edge.fa = edge.fa.scale(decay);
        edge.fb = edge.fb.scale(decay);
    });
}

/// Containment coupling onto cells: anything found outside the ring is
/// pulled back inside proportionally to tension.
pub fn wrap_cells(world: &mut World, ctx: &StepCtx) {
    if !world.membrane.enabled() {
        return;
    }
    let tension = world.params.membrane_tension;
    let membrane = &world.membrane;
    let centroid = membrane.centroid();
    world.cells.read_mut().par_iter_mut().for_each(|cell| {
        if !cell.is_alive() {
            return;
        }
        if let Some((inward, overshoot)) = membrane.containment(cell.position, cell.radius, centroid) {
            cell.velocity = cell.velocity.add(inward.scale(overshoot * tension * 8.0 * ctx.dt));
            cell.position = cell.position.add(inward.scale(overshoot * tension * ctx.dt));
        }
    });
}

/// Same containment relation, applied to the predator arena.
pub fn wrap_predators(world: &mut World, ctx: &StepCtx) {
    if !world.membrane.enabled() {
        return;
    }
    let tension = world.params.membrane_tension;
    let membrane = &world.membrane;
    let centroid = membrane.centroid();
    world.predators.read_mut().par_iter_mut().for_each(|predator| {
        if !predator.is_alive() {
            return;
        }
        if let Some((inward, overshoot)) =
            membrane.containment(predator.position, predator.radius, centroid)
        {
            predator.velocity = predator.velocity.add(inward.scale(overshoot * tension * 8.0 * ctx.dt));
            predator.position = predator.position.add(inward.scale(overshoot * tension * ctx.dt));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(nodes: u32, radius: f32) -> Membrane {
        let mut membrane = Membrane::new(nodes);
        membrane.nodes.pool.fill_reverse();
        membrane.edges.pool.fill_reverse();
        membrane.seed_ring(radius, 0.25);
        membrane
    }

    #[test]
    fn seed_ring_is_a_closed_cycle() {
        let membrane = ring(8, 5.0);
        assert_eq!(membrane.nodes.pool.count(), 0);
        assert_eq!(membrane.edges.pool.count(), 0);
        let edges = membrane.edges.read();
        for (i, edge) in edges.iter().enumerate() {
            assert!(edge.is_alive());
            assert_eq!(edge.a, i as u32);
            assert_eq!(edge.b, ((i + 1) % 8) as u32);
        }
        let centroid = membrane.centroid();
        assert!(centroid.length() < 1e-4);
    }

    #[test]
    fn containment_flags_outside_points_only() {
        let membrane = ring(32, 5.0);
        let centroid = membrane.centroid();
        assert!(membrane.containment(Vec2::new(1.0, 1.0), 0.5, centroid).is_none());

        let (inward, overshoot) = membrane
            .containment(Vec2::new(9.0, 0.0), 0.5, centroid)
            .expect("point outside the ring must be corrected");
        assert!(inward.x < 0.0);
        assert!(overshoot > 3.0);
    }

    #[test]
    fn target_edge_length_tracks_circumference() {
        let membrane = ring(8, 5.0);
        let expected = 2.0 * PI * 5.0 / 8.0;
        assert!((membrane.target_edge_length() - expected).abs() < 1e-5);
    }
}
