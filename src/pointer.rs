use growth_common::{clamp, Vec2};

/// External interaction signal supplied by the host once per frame.
/// Camera/projection math happens outside; the point arrives in world space.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalInput {
    pub point: Vec2,
    pub engaged: bool,
}

/// Point-source force state: a scalar energy ramping up while the engage
/// signal is held and decaying otherwise, plus the last known world point.
#[derive(Debug, Clone, Copy)]
pub struct Pointer {
    pub point: Vec2,
    energy: f32,
}

impl Pointer {
    pub fn new() -> Self {
        Pointer { point: Vec2::zero(), energy: 0.0 }
    }

    /// Advances the energy ramp and latches the interaction point.
    pub fn interact(&mut self, input: ExternalInput, dt: f32) {
        self.point = input.point;
        self.energy += dt * if input.engaged { 1.0 } else { -1.0 };
        self.energy = clamp(self.energy, 0.0, 1.0);
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Attractive force this pointer exerts on an element at `position`,
    /// falling off linearly to zero at `distance` and scaled by energy.
    pub fn force(&self, position: Vec2, strength: f32, distance: f32, inv_distance: f32) -> Vec2 {
        if self.energy <= 0.0 {
            return Vec2::zero();
        }
        let to_point = self.point.sub(position);
        let dist = to_point.length();
        if dist >= distance || dist <= 1e-6 {
            return Vec2::zero();
        }
        let falloff = 1.0 - dist * inv_distance;
        to_point.scale(1.0 / dist * falloff * strength * self.energy)
    }

    pub fn reset(&mut self) {
        self.energy = 0.0;
        self.point = Vec2::zero();
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_ramps_and_clamps() {
        let mut pointer = Pointer::new();
        let input = ExternalInput { point: Vec2::zero(), engaged: true };
        for _ in 0..200 {
            pointer.interact(input, 0.016);
        }
        assert_eq!(pointer.energy(), 1.0);

        let off = ExternalInput { point: Vec2::zero(), engaged: false };
        pointer.interact(off, 0.5);
        assert!((pointer.energy() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn force_vanishes_outside_range_and_without_energy()  {
        let mut pointer = Pointer::new();
        pointer.interact(ExternalInput { point: Vec2::new(1.0, 0.0), engaged: true }, 1.0);
        assert_eq!(pointer.energy(), 1.0);

        let near = pointer.force(Vec2::zero(), 2.0, 3.0, 1.0 / 3.0);
        assert!(near.x > 0.0);

        let far = pointer.force(Vec2::new(10.0, 0.0), 2.0, 3.0, 1.0 / 3.0);
        assert_eq!(far, Vec2::zero());

        let idle = Pointer::new().force(Vec2::zero(), 2.0, 3.0, 1.0 / 3.0);
        assert_eq!(idle, Vec2::zero());
    }
}
