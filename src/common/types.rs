//! Common types used throughout tl_rrt_star

use nalgebra::{DVector, Vector2};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Joint configuration of the robot team, one position per robot.
///
/// This is the nested form used by per-robot geometric and label checks.
/// The flattened form (all coordinates concatenated into one vector) is
/// used wherever Euclidean distance or steering is computed; [`flatten`]
/// and [`unflatten`] convert between the two.
pub type JointConfig = Vec<Point2D>;

/// Concatenate all robot coordinates into a single vector of length 2R.
pub fn flatten(config: &JointConfig) -> DVector<f64> {
    let mut flat = Vec::with_capacity(config.len() * 2);
    for p in config {
        flat.push(p.x);
        flat.push(p.y);
    }
    DVector::from_vec(flat)
}

/// Rebuild the per-robot nested form from a flattened coordinate slice.
pub fn unflatten(flat: &[f64]) -> JointConfig {
    flat.chunks(2).map(|c| Point2D::new(c[0], c[1])).collect()
}

/// Euclidean distance between two joint configurations in the flattened
/// configuration space.
pub fn joint_distance(a: &JointConfig, b: &JointConfig) -> f64 {
    (flatten(a) - flatten(b)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_flatten_unflatten_roundtrip() {
        let config = vec![Point2D::new(1.0, 2.0), Point2D::new(3.0, 4.0)];
        let flat = flatten(&config);
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[2], 3.0);
        let back = unflatten(flat.as_slice());
        assert_eq!(back, config);
    }

    #[test]
    fn test_joint_distance_sums_over_robots() {
        let a = vec![Point2D::new(0.0, 0.0), Point2D::new(0.0, 0.0)];
        let b = vec![Point2D::new(3.0, 0.0), Point2D::new(0.0, 4.0)];
        assert!((joint_distance(&a, &b) - 5.0).abs() < 1e-10);
    }
}
