//! Eye aspect ratio (EAR) estimation
//!
//! EAR is the core openness signal: low when the eye is closed, high when
//! open. For the standard 6-point contour the raw geometric ratio is
//! `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)` — vertical lid distances over the
//! horizontal corner distance.

use crate::geometry::{distance, Point2D};
use crate::types::EYE_LANDMARK_COUNT;

/// Gain applied on top of the raw geometric ratio.
///
/// Amplifies sensitivity to vertical closure; every downstream threshold is
/// tuned against the amplified value, so this constant must move in lockstep
/// with them.
pub const EAR_GAIN: f64 = 1.5;

/// Compute the amplified EAR for a single 6-point eye contour.
///
/// Degenerate input degrades to 0 rather than erroring: a contour with fewer
/// than [`EYE_LANDMARK_COUNT`] points, or one whose horizontal corners
/// coincide, yields an EAR of 0 so a single bad frame never aborts a session.
pub fn ear(eye: &[Point2D]) -> f64 {
    if eye.len() < EYE_LANDMARK_COUNT {
        return 0.0;
    }

    let v1 = distance(&eye[1], &eye[5]);
    let v2 = distance(&eye[2], &eye[4]);
    let h = distance(&eye[0], &eye[3]);

    if h > 0.0 {
        ((v1 + v2) / (2.0 * h)) * EAR_GAIN
    } else {
        0.0
    }
}

/// Mean EAR across both eyes
pub fn both_eyes_ear(left: &[Point2D], right: &[Point2D]) -> f64 {
    (ear(left) + ear(right)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// An open eye: corners 4 units apart, lids 2 units apart.
    fn open_eye() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),  // left corner
            Point2D::new(1.0, 1.0),  // upper lid
            Point2D::new(3.0, 1.0),  // upper lid
            Point2D::new(4.0, 0.0),  // right corner
            Point2D::new(3.0, -1.0), // lower lid
            Point2D::new(1.0, -1.0), // lower lid
        ]
    }

    fn scaled(eye: &[Point2D], factor: f64) -> Vec<Point2D> {
        eye.iter()
            .map(|p| Point2D::new(p.x * factor, p.y * factor))
            .collect()
    }

    #[test]
    fn test_open_eye_value() {
        // v1 = v2 = 2, h = 4 -> raw 0.5, amplified 0.75
        let value = ear(&open_eye());
        assert!((value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_horizontal_axis_yields_zero() {
        let mut eye = open_eye();
        eye[3] = eye[0]; // corners coincide, h == 0
        assert_eq!(ear(&eye), 0.0);
    }

    #[test]
    fn test_short_contour_yields_zero() {
        let eye = open_eye()[..5].to_vec();
        assert_eq!(ear(&eye), 0.0);
    }

    #[test]
    fn test_empty_contour_yields_zero() {
        assert_eq!(ear(&[]), 0.0);
    }

    #[test]
    fn test_scale_invariance() {
        // The ratio cancels uniform scaling: doubling all coordinates
        // doubles v1, v2, and h, leaving the EAR unchanged.
        let eye = open_eye();
        let base = ear(&eye);
        for factor in [0.5, 2.0, 10.0, 137.0] {
            let value = ear(&scaled(&eye, factor));
            assert!(
                (value - base).abs() < 1e-9,
                "EAR changed under scale {factor}: {value} vs {base}"
            );
        }
    }

    #[test]
    fn test_both_eyes_mean() {
        let left = open_eye();
        let right = scaled(&open_eye(), 2.0); // same EAR as left
        let value = both_eyes_ear(&left, &right);
        assert!((value - 0.75).abs() < 1e-9);

        // One degenerate eye halves the combined value
        let mut closed = open_eye();
        closed[3] = closed[0];
        let value = both_eyes_ear(&left, &closed);
        assert!((value - 0.375).abs() < 1e-9);
    }
}
