//! Scalar and vector helpers shared by the simulation systems.

use glam::Vec3;

/// Guard added to lengths before dividing so near-zero vectors stay finite.
pub const NORMALIZE_EPSILON: f32 = 1e-5;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]: where `val` sits between `a` and `b`.
pub fn unlerp(val: f32, a: f32, b: f32) -> f32 {
    (val - a) / (b - a)
}

/// Map `val` from the range `[from_a, from_b]` onto `[to_a, to_b]`.
pub fn rescale(val: f32, from_a: f32, from_b: f32, to_a: f32, to_b: f32) -> f32 {
    lerp(to_a, to_b, unlerp(val, from_a, from_b))
}

/// Move `current` toward `target` by at most `delta`, never overshooting.
pub fn approach(current: f32, target: f32, delta: f32) -> f32 {
    if current < target {
        (current + delta).min(target)
    } else {
        (current - delta).max(target)
    }
}

/// Normalize without producing NaN for zero-length input.
///
/// The result is slightly shorter than unit length; zero stays zero.
pub fn safe_normalize(v: Vec3) -> Vec3 {
    v / (v.length() + NORMALIZE_EPSILON)
}

/// -1, 0 or 1.
pub fn sign(val: f32) -> f32 {
    if val > 0.0 {
        1.0
    } else if val < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_and_unlerp_are_inverse() {
        let v = lerp(2.0, 6.0, 0.25);
        assert_eq!(v, 3.0);
        assert_eq!(unlerp(v, 2.0, 6.0), 0.25);
    }

    #[test]
    fn rescale_maps_ranges() {
        assert_eq!(rescale(5.0, 0.0, 10.0, 100.0, 200.0), 150.0);
    }

    #[test]
    fn approach_clamps_at_target() {
        assert_eq!(approach(0.0, 1.0, 0.3), 0.3);
        assert_eq!(approach(0.9, 1.0, 0.3), 1.0);
        assert_eq!(approach(1.0, -1.0, 0.5), 0.5);
        assert_eq!(approach(-0.8, -1.0, 0.5), -1.0);
    }

    #[test]
    fn safe_normalize_handles_zero() {
        assert_eq!(safe_normalize(Vec3::ZERO), Vec3::ZERO);
        let n = safe_normalize(Vec3::new(3.0, 0.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn sign_of_values() {
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(7.5), 1.0);
    }
}
