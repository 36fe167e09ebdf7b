use growth_common::Vec2;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

// Entity slots are plain-old-data with GPU-style u32 flags so a render
// consumer can view a whole arena buffer as raw bytes once per frame.

pub const ALIVE: u32 = 1;
pub const DEAD: u32 = 0;

#[derive(Copy, Clone, Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Cell {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub radius: f32,
    /// Target radius the cell grows toward.
    pub threshold: f32,
    /// Seconds since this cell last divided (or was born).
    pub stress: f32,
    pub kind: u32,
    /// Count of alive edges referencing this cell.
    pub links: u32,
    /// Set by Activate, possibly cleared by Check, consumed by Divide.
    pub dividable: u32,
    pub alive: u32,
}

impl Cell {
    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.alive != DEAD
    }
}

#[derive(Copy, Clone, Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Edge {
    pub a: u32,
    pub b: u32,
    /// Accumulated spring force on endpoint a / b, gathered by UpdateCells.
    pub fa: Vec2,
    pub fb: Vec2,
    /// Marks an edge that failed a validity check and must be reclaimed.
    pub removable: u32,
    pub alive: u32,
}

impl Edge {
    pub fn link(a: u32, b: u32) -> Self {
        Edge { a, b, fa: Vec2::zero(), fb: Vec2::zero(), removable: 0, alive: ALIVE }
    }

    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.alive != DEAD
    }

    /// True when the edge touches the given cell slot.
    #[inline(always)]
    pub fn touches(&self, cell: u32) -> bool {
        self.a == cell || self.b == cell
    }

    /// The endpoint opposite `cell`, assuming the edge touches it.
    #[inline(always)]
    pub fn opposite(&self, cell: u32) -> u32 {
        if self.a == cell {
            self.b
        } else {
            self.a
        }
    }

    /// True when the edge connects exactly the unordered pair (x, y).
    #[inline(always)]
    pub fn connects(&self, x: u32, y: u32) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

#[derive(Copy, Clone, Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Face {
    pub c0: u32,
    pub c1: u32,
    pub c2: u32,
    pub e0: u32,
    pub e1: u32,
    pub e2: u32,
    pub removable: u32,
    pub alive: u32,
}

impl Face {
    pub fn triangle(corners: [u32; 3], edges: [u32; 3]) -> Self {
        Face {
            c0: corners[0],
            c1: corners[1],
            c2: corners[2],
            e0: edges[0],
            e1: edges[1],
            e2: edges[2],
            removable: 0,
            alive: ALIVE,
        }
    }

    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.alive != DEAD
    }

    #[inline(always)]
    pub fn corners(&self) -> [u32; 3] {
        [self.c0, self.c1, self.c2]
    }

    #[inline(always)]
    pub fn edges(&self) -> [u32; 3] {
        [self.e0, self.e1, self.e2]
    }

    #[inline(always)]
    pub fn has_corner(&self, cell: u32) -> bool {
        self.c0 == cell || self.c1 == cell || self.c2 == cell
    }

    #[inline(always)]
    pub fn has_edge(&self, edge: u32) -> bool {
        self.e0 == edge || self.e1 == edge || self.e2 == edge
    }

    /// The corner that is neither `x` nor `y`. Valid for faces holding both.
    pub fn corner_opposite(&self, x: u32, y: u32) -> u32 {
        for c in self.corners() {
            if c != x && c != y {
                return c;
            }
        }
        self.c0
    }
}

#[derive(Copy, Clone, Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct MembraneNode {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub radius: f32,
    pub alive: u32,
}

impl MembraneNode {
    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.alive != DEAD
    }
}

#[derive(Copy, Clone, Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct MembraneEdge {
    pub a: u32,
    pub b: u32,
    pub fa: Vec2,
    pub fb: Vec2,
    pub alive: u32,
}

impl MembraneEdge {
    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.alive != DEAD
    }
}

#[derive(Copy, Clone, Debug, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Predator {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub radius: f32,
    pub stress: f32,
    pub alive: u32,
}

impl Predator {
    #[inline(always)]
    pub fn is_alive(&self) -> bool {
        self.alive != DEAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_orientation_helpers() {
        let e = Edge::link(3, 5);
        assert!(e.touches(3) && e.touches(5) && !e.touches(4));
        assert_eq!(e.opposite(3), 5);
        assert!(e.connects(5, 3));
    }

    #[test]
    fn face_corner_opposite() {
        let f = Face::triangle([1, 2, 3], [10, 11, 12]);
        assert_eq!(f.corner_opposite(1, 2), 3);
        assert!(f.has_edge(11));
        assert!(f.has_corner(2));
    }
}
