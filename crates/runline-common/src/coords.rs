//! World-space point helpers.
//!
//! Track geometry uses plain `glam` vectors. Anchors are compared with a
//! tolerance that scales with their magnitude, since segments placed far
//! down the track accumulate `f32` rounding.

use glam::Vec3;

/// A world-space position.
pub type Point3 = Vec3;

/// Absolute tolerance used when comparing anchor positions near the origin.
pub const ANCHOR_TOLERANCE: f32 = 1e-3;

/// Returns true if two anchors coincide within [`ANCHOR_TOLERANCE`],
/// relative to their magnitude.
#[must_use]
pub fn anchors_coincide(a: Point3, b: Point3) -> bool {
    let scale = 1.0 + a.length().max(b.length());
    a.distance(b) <= ANCHOR_TOLERANCE * scale
}

/// Signed distance of `point` behind `agent`, projected onto `forward`.
///
/// Positive values mean the point lies behind the agent. `forward` is
/// expected to be normalized; a zero vector yields zero.
#[must_use]
pub fn distance_behind(agent: Point3, point: Point3, forward: Vec3) -> f32 {
    (agent - point).dot(forward)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchors_coincide_exact() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(anchors_coincide(p, p));
    }

    #[test]
    fn test_anchors_coincide_far_from_origin() {
        let a = Point3::new(0.0, 0.0, 100_000.0);
        let b = Point3::new(0.0, 0.0, 100_000.01);
        assert!(anchors_coincide(a, b));
    }

    #[test]
    fn test_anchors_apart() {
        let a = Point3::ZERO;
        let b = Point3::new(0.0, 0.0, 0.5);
        assert!(!anchors_coincide(a, b));
    }

    #[test]
    fn test_distance_ahead_is_negative() {
        let agent = Point3::ZERO;
        let ahead = Point3::new(0.0, 0.0, 12.0);
        assert!(distance_behind(agent, ahead, Vec3::Z) < 0.0);
    }

    #[test]
    fn test_lateral_offset_ignored() {
        let agent = Point3::new(0.0, 0.0, 10.0);
        let left = Point3::new(-4.0, 0.0, 0.0);
        let right = Point3::new(4.0, 0.0, 0.0);
        assert_eq!(
            distance_behind(agent, left, Vec3::Z),
            distance_behind(agent, right, Vec3::Z)
        );
    }
}
