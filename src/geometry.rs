//! Planar geometry primitives
//!
//! Landmark positions arrive from the external detector in image-pixel
//! coordinates. Everything downstream (EAR, jitter estimation) reduces to
//! point distances, so this is the only geometry the engine needs.

use serde::{Deserialize, Serialize};

/// A single landmark position in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Create a point from pixel coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2D) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Manhattan distance to another point, used for jitter accumulation
    pub fn manhattan_distance(&self, other: &Point2D) -> f64 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }
}

/// Euclidean distance between two points
pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    a.distance(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_distance_known_triangle() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_coincident_points() {
        let a = Point2D::new(7.5, -2.0);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(-4.0, 6.0);
        assert_eq!(distance(&a, &b), distance(&b, &a));
    }

    #[test]
    fn test_manhattan_distance() {
        let a = Point2D::new(1.0, 1.0);
        let b = Point2D::new(4.0, -1.0);
        assert!((a.manhattan_distance(&b) - 5.0).abs() < 1e-12);
    }
}
