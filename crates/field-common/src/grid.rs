//! Grid partitions and the node-index coordinate mapping.
//!
//! The contour engine works on two nested partitions of the domain
//! rectangle: a coarse *primary* grid that drives adaptive subdivision and
//! memory windowing, and a fine *secondary* grid whose nodes are the only
//! positions a contour vertex can occupy. Strips store linear secondary
//! node indices; [`NodeMap`] is the single authority for converting those
//! indices to grid positions and physical coordinates.

use crate::Limits;
use serde::{Deserialize, Serialize};

/// Dimensions of one rectangular partition, counted in cells.
///
/// A partition of `cols × rows` cells has `(cols + 1) × (rows + 1)` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub cols: usize,
    pub rows: usize,
}

impl GridSpec {
    /// Create a new partition spec.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        (self.cols + 1) * (self.rows + 1)
    }
}

/// Mapping between linear secondary node indices, (column, row) positions
/// and physical coordinates.
///
/// Indices are column-major: `index = col * (rows + 1) + row`. Column 0 is
/// at `min_x`, row 0 at `min_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeMap {
    limits: Limits,
    cols: usize,
    rows: usize,
}

impl NodeMap {
    /// Create a mapping for a secondary partition over the given limits.
    pub fn new(limits: Limits, secondary: GridSpec) -> Self {
        Self {
            limits,
            cols: secondary.cols,
            rows: secondary.rows,
        }
    }

    /// The domain rectangle this mapping covers.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Number of secondary columns (cells along x).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of secondary rows (cells along y).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of addressable nodes.
    pub fn node_count(&self) -> usize {
        (self.cols + 1) * (self.rows + 1)
    }

    /// Node spacing along x.
    pub fn delta_x(&self) -> f64 {
        self.limits.width() / self.cols as f64
    }

    /// Node spacing along y.
    pub fn delta_y(&self) -> f64 {
        self.limits.height() / self.rows as f64
    }

    /// Linear index of the node at (col, row).
    pub fn index(&self, col: usize, row: usize) -> usize {
        debug_assert!(col <= self.cols && row <= self.rows);
        col * (self.rows + 1) + row
    }

    /// Column of a linear node index.
    pub fn col(&self, index: usize) -> usize {
        index / (self.rows + 1)
    }

    /// Row of a linear node index.
    pub fn row(&self, index: usize) -> usize {
        index % (self.rows + 1)
    }

    /// X coordinate of a node column.
    pub fn x_at(&self, col: usize) -> f64 {
        self.limits.min_x + col as f64 * self.delta_x()
    }

    /// Y coordinate of a node row.
    pub fn y_at(&self, row: usize) -> f64 {
        self.limits.min_y + row as f64 * self.delta_y()
    }

    /// X coordinate of a linear node index.
    pub fn x(&self, index: usize) -> f64 {
        self.x_at(self.col(index))
    }

    /// Y coordinate of a linear node index.
    pub fn y(&self, index: usize) -> f64 {
        self.y_at(self.row(index))
    }

    /// Physical coordinates of a linear node index.
    pub fn point(&self, index: usize) -> (f64, f64) {
        (self.x(index), self.y(index))
    }

    /// Euclidean distance between two nodes.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        let (ax, ay) = self.point(a);
        let (bx, by) = self.point(b);
        (ax - bx).hypot(ay - by)
    }

    /// Nearest node column for an x coordinate, clamped to the partition.
    pub fn nearest_col(&self, x: f64) -> usize {
        let c = ((x - self.limits.min_x) / self.delta_x()).round();
        (c.max(0.0) as usize).min(self.cols)
    }

    /// Nearest node row for a y coordinate, clamped to the partition.
    pub fn nearest_row(&self, y: f64) -> usize {
        let r = ((y - self.limits.min_y) / self.delta_y()).round();
        (r.max(0.0) as usize).min(self.rows)
    }

    /// Linear index of the node nearest to a physical point.
    pub fn nearest_index(&self, x: f64, y: f64) -> usize {
        self.index(self.nearest_col(x), self.nearest_row(y))
    }

    /// Check whether a node lies on the domain boundary.
    pub fn on_boundary(&self, index: usize) -> bool {
        let (x, y) = self.point(index);
        self.limits.on_boundary(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_map(cols: usize, rows: usize) -> NodeMap {
        NodeMap::new(Limits::new(0.0, 0.0, 1.0, 1.0), GridSpec::new(cols, rows))
    }

    #[test]
    fn test_index_round_trip() {
        let map = unit_map(8, 4);
        for col in 0..=8 {
            for row in 0..=4 {
                let idx = map.index(col, row);
                assert!(idx < map.node_count());
                assert_eq!(map.col(idx), col);
                assert_eq!(map.row(idx), row);
            }
        }
    }

    #[test]
    fn test_column_major_order() {
        let map = unit_map(4, 4);
        // Walking one column stays contiguous in index space.
        assert_eq!(map.index(0, 0), 0);
        assert_eq!(map.index(0, 4), 4);
        assert_eq!(map.index(1, 0), 5);
        assert_eq!(map.index(2, 3), 13);
    }

    #[test]
    fn test_coordinates() {
        let map = NodeMap::new(Limits::new(-2.0, -2.0, 2.0, 2.0), GridSpec::new(4, 8));
        assert_eq!(map.delta_x(), 1.0);
        assert_eq!(map.delta_y(), 0.5);
        assert_eq!(map.x_at(0), -2.0);
        assert_eq!(map.x_at(4), 2.0);
        assert_eq!(map.y_at(4), 0.0);

        let idx = map.index(2, 4);
        assert_eq!(map.point(idx), (0.0, 0.0));
        assert_eq!(map.distance(idx, map.index(2, 6)), 1.0);
        assert_eq!(map.distance(idx, idx), 0.0);
    }

    #[test]
    fn test_nearest() {
        let map = NodeMap::new(Limits::new(0.0, 0.0, 10.0, 10.0), GridSpec::new(10, 10));
        assert_eq!(map.nearest_col(3.4), 3);
        assert_eq!(map.nearest_col(3.6), 4);
        // Out-of-range coordinates clamp to the edge nodes.
        assert_eq!(map.nearest_col(-5.0), 0);
        assert_eq!(map.nearest_col(25.0), 10);
        assert_eq!(map.nearest_index(0.1, 9.9), map.index(0, 10));
    }

    #[test]
    fn test_boundary_nodes() {
        let map = unit_map(4, 4);
        assert!(map.on_boundary(map.index(0, 2)));
        assert!(map.on_boundary(map.index(4, 4)));
        assert!(!map.on_boundary(map.index(2, 2)));
    }
}
