//! Domain rectangle types and operations.

use serde::{Deserialize, Serialize};

/// Coordinate tolerance for the boundary test: a coordinate within this
/// distance of a domain limit counts as lying on that limit.
pub const BOUNDARY_EPSILON: f64 = 1e-6;

/// The rectangular domain over which a field is contoured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Limits {
    /// Create a new domain rectangle from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the rectangle in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// A rectangle is valid when both axes are finite and strictly min < max.
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    /// Check if a point is contained within this rectangle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Limits) -> Limits {
        Limits {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow the rectangle by the given margins on every side.
    ///
    /// Negative margins shrink it; the caller is responsible for keeping
    /// the result valid.
    pub fn expand(&self, margin_x: f64, margin_y: f64) -> Limits {
        Limits {
            min_x: self.min_x - margin_x,
            min_y: self.min_y - margin_y,
            max_x: self.max_x + margin_x,
            max_y: self.max_y + margin_y,
        }
    }

    /// Check whether a point lies on the rectangle boundary.
    ///
    /// A coordinate equal to one of the four limits within
    /// [`BOUNDARY_EPSILON`] counts as on-boundary.
    pub fn on_boundary(&self, x: f64, y: f64) -> bool {
        (x - self.min_x).abs() < BOUNDARY_EPSILON
            || (x - self.max_x).abs() < BOUNDARY_EPSILON
            || (y - self.min_y).abs() < BOUNDARY_EPSILON
            || (y - self.max_y).abs() < BOUNDARY_EPSILON
    }

    /// Largest absolute difference between the corresponding edges of two
    /// rectangles. Used to decide when iterative limit refitting has
    /// stabilized.
    pub fn max_edge_delta(&self, other: &Limits) -> f64 {
        (self.min_x - other.min_x)
            .abs()
            .max((self.min_y - other.min_y).abs())
            .max((self.max_x - other.max_x).abs())
            .max((self.max_y - other.max_y).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_height() {
        let limits = Limits::new(-2.0, -1.0, 2.0, 3.0);
        assert_eq!(limits.width(), 4.0);
        assert_eq!(limits.height(), 4.0);
        assert_eq!(limits.center(), (0.0, 1.0));
    }

    #[test]
    fn test_validity() {
        assert!(Limits::new(-1.0, -1.0, 1.0, 1.0).is_valid());
        assert!(!Limits::new(1.0, -1.0, -1.0, 1.0).is_valid());
        assert!(!Limits::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!Limits::new(f64::NAN, -1.0, 1.0, 1.0).is_valid());
        assert!(!Limits::new(f64::NEG_INFINITY, -1.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_contains() {
        let limits = Limits::new(0.0, 0.0, 10.0, 10.0);
        assert!(limits.contains(5.0, 5.0));
        assert!(limits.contains(0.0, 10.0));
        assert!(!limits.contains(-0.1, 5.0));
        assert!(!limits.contains(5.0, 10.1));
    }

    #[test]
    fn test_union_expand() {
        let a = Limits::new(0.0, 0.0, 1.0, 1.0);
        let b = Limits::new(-1.0, 0.5, 0.5, 2.0);
        let u = a.union(&b);
        assert_eq!(u, Limits::new(-1.0, 0.0, 1.0, 2.0));

        let e = a.expand(0.5, 0.25);
        assert_eq!(e, Limits::new(-0.5, -0.25, 1.5, 1.25));
    }

    #[test]
    fn test_on_boundary() {
        let limits = Limits::new(-1.0, -1.0, 1.0, 1.0);
        assert!(limits.on_boundary(-1.0, 0.3));
        assert!(limits.on_boundary(0.3, 1.0));
        assert!(limits.on_boundary(-1.0 + 1e-7, 0.0));
        assert!(!limits.on_boundary(0.0, 0.0));
        assert!(!limits.on_boundary(0.999, 0.0));
    }

    #[test]
    fn test_max_edge_delta() {
        let a = Limits::new(0.0, 0.0, 1.0, 1.0);
        let b = Limits::new(0.1, 0.0, 1.0, 1.3);
        assert!((a.max_edge_delta(&b) - 0.3).abs() < 1e-12);
        assert_eq!(a.max_edge_delta(&a), 0.0);
    }
}
