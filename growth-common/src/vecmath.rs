use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

// Basic 2D vector type shared by the engine and any buffer consumer.
// Plain-old-data so entity structs embedding it stay byte-viewable.
#[derive(
    Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize, IntoBytes, FromBytes, Immutable,
    KnownLayout,
)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline(always)]
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }
    #[inline(always)]
    pub fn zero() -> Self { Self::new(0.0, 0.0) }
    #[inline(always)]
    pub fn length_squared(self) -> f32 { self.x * self.x + self.y * self.y }
    #[inline(always)]
    pub fn length(self) -> f32 { self.length_squared().sqrt() }
    #[inline(always)]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
    #[inline(always)]
    pub fn distance(self, other: Self) -> f32 { self.distance_squared(other).sqrt() }
    #[inline(always)]
    pub fn add(self, other: Self) -> Self { Self::new(self.x + other.x, self.y + other.y) }
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self { Self::new(self.x - other.x, self.y - other.y) }
    #[inline(always)]
    pub fn scale(self, scalar: f32) -> Self { Self::new(self.x * scalar, self.y * scalar) }
    #[inline(always)]
    pub fn dot(self, other: Self) -> f32 { self.x * other.x + self.y * other.y }

    /// Normalizes the vector, returning a zero vector if the length is zero or very small.
    pub fn normalize_or_zero(self) -> Vec2 {
        let len_sq = self.length_squared();
        if len_sq > 1e-12 {
            self.scale(1.0 / len_sq.sqrt())
        } else {
            Vec2::zero()
        }
    }

    /// Normalizes the vector, falling back to `fallback` for degenerate input.
    /// Used wherever two elements may be coincident (division offspring,
    /// overlapping predators) so no NaN ever enters a force field.
    pub fn normalize_or(self, fallback: Vec2) -> Vec2 {
        let len_sq = self.length_squared();
        if len_sq > 1e-12 {
            self.scale(1.0 / len_sq.sqrt())
        } else {
            fallback
        }
    }

    /// True when both components are finite. Integration skips the update
    /// for any element whose state would otherwise turn NaN/Inf.
    #[inline(always)]
    pub fn is_finite(self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

#[inline(always)]
pub fn angle_to_vec(theta: f32) -> Vec2 { Vec2::new(theta.cos(), theta.sin()) }

#[inline(always)]
pub fn vec_to_angle(v: Vec2) -> f32 { v.y.atan2(v.x) }

#[inline(always)]
pub fn clamp(val: f32, min: f32, max: f32) -> f32 { val.max(min).min(max) }

/// Linear interpolation, used for the membrane radius easing.
#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 { a + (b - a) * t }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_or_zero_handles_degenerate_input() {
        assert_eq!(Vec2::zero().normalize_or_zero(), Vec2::zero());
        let v = Vec2::new(3.0, 4.0).normalize_or_zero();
        assert!((v.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_or_uses_fallback() {
        let fallback = Vec2::new(1.0, 0.0);
        assert_eq!(Vec2::zero().normalize_or(fallback), fallback);
    }

    #[test]
    fn angle_round_trip() {
        let theta = 1.234f32;
        let v = angle_to_vec(theta);
        assert!((vec_to_angle(v) - theta).abs() < 1e-5);
    }
}
