//! Strips: node-index polylines and the per-level collections built from
//! them.
//!
//! A strip stores linear secondary node indices rather than coordinates so
//! that every downstream geometric lookup goes through the same
//! [`NodeMap`] and stays consistent with the grid. Strips are owned
//! growable sequences; merging mutates one strip and empties the other, so
//! no two handles ever alias the same node storage.

use crate::{Limits, NodeMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// One polyline (open or closed) approximating part of a level's contour.
///
/// Consecutive indices correspond to endpoints of an emitted segment (or a
/// welded join). A strip is closed iff its first and last index are equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strip {
    nodes: Vec<usize>,
}

impl Strip {
    /// Create an empty strip.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Create a strip from an existing node sequence.
    pub fn from_nodes(nodes: Vec<usize>) -> Self {
        Self { nodes }
    }

    /// Create a two-node strip for a single emitted segment.
    pub fn segment(a: usize, b: usize) -> Self {
        Self { nodes: vec![a, b] }
    }

    /// Number of nodes in the strip.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the strip has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node index, if any.
    pub fn first(&self) -> Option<usize> {
        self.nodes.first().copied()
    }

    /// Last node index, if any.
    pub fn last(&self) -> Option<usize> {
        self.nodes.last().copied()
    }

    /// The node sequence.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Consume the strip, returning its node sequence.
    pub fn into_nodes(self) -> Vec<usize> {
        self.nodes
    }

    /// Append a node at the tail.
    pub fn push_back(&mut self, node: usize) {
        self.nodes.push(node);
    }

    /// Insert a node at the head.
    pub fn push_front(&mut self, node: usize) {
        self.nodes.insert(0, node);
    }

    /// Reverse the node order in place.
    pub fn reverse(&mut self) {
        self.nodes.reverse();
    }

    /// Append all nodes of `other`, leaving `other` empty.
    ///
    /// When the sequences meet exactly (`self` ends on the node `other`
    /// starts with), the shared junction node is kept once.
    pub fn append(&mut self, other: &mut Strip) {
        if !self.nodes.is_empty() && self.nodes.last() == other.nodes.first() {
            other.nodes.remove(0);
        }
        self.nodes.append(&mut other.nodes);
    }

    /// A strip is closed iff its first and last index are equal and it has
    /// at least one real segment in between.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 2 && self.nodes.first() == self.nodes.last()
    }

    /// Close the strip by repeating its first node at the tail.
    pub fn close(&mut self) {
        if self.nodes.len() >= 2 && self.nodes.first() != self.nodes.last() {
            self.nodes.push(self.nodes[0]);
        }
    }

    /// Check whether a node index occurs in the strip.
    pub fn contains(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// Position of the first occurrence of a node index.
    pub fn position_of(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// All node indices that occur more than once, each reported once.
    ///
    /// The closing duplicate of a closed strip is not a repeat.
    pub fn repeated_nodes(&self) -> Vec<usize> {
        let interior = if self.is_closed() {
            &self.nodes[..self.nodes.len() - 1]
        } else {
            &self.nodes[..]
        };

        let mut seen = HashSet::new();
        let mut repeats = Vec::new();
        for &node in interior {
            if !seen.insert(node) && !repeats.contains(&node) {
                repeats.push(node);
            }
        }
        repeats
    }

    /// First node index that occurs more than once, if any.
    ///
    /// A repeated interior node means the polyline crosses itself.
    pub fn repeated_node(&self) -> Option<usize> {
        self.repeated_nodes().into_iter().next()
    }

    /// Extract the sub-path running from node `a` to node `b`, inclusive.
    ///
    /// Both nodes must occur in the strip. The result always starts at `a`;
    /// the slice is reversed when `b` occurs first.
    pub fn sub_path(&self, a: usize, b: usize) -> Option<Strip> {
        let pa = self.position_of(a)?;
        let pb = self.position_of(b)?;

        let (lo, hi) = if pa <= pb { (pa, pb) } else { (pb, pa) };
        let mut nodes: Vec<usize> = self.nodes[lo..=hi].to_vec();
        if pa > pb {
            nodes.reverse();
        }
        Some(Strip::from_nodes(nodes))
    }
}

/// All strips for one level.
pub type StripList = Vec<Strip>;

/// A pair of node indices considered coincident within tolerance across
/// two strips (or a strip and the boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionRecord {
    /// Node index on the first strip.
    pub index: usize,
    /// Matching node index on the second strip.
    pub j_index: usize,
}

impl IntersectionRecord {
    pub fn new(index: usize, j_index: usize) -> Self {
        Self { index, j_index }
    }
}

/// The complete output of one contour generation: one strip list per
/// level, the node-to-coordinate mapping, and the discontinuities seen
/// while sampling.
///
/// When a generation self-healed, `levels` carries the two sentinel fence
/// levels appended after the configured ones, and `lists` has matching
/// entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoCurveSet {
    pub levels: Vec<f64>,
    pub lists: Vec<StripList>,
    pub map: NodeMap,
    pub discontinuities: BTreeSet<usize>,
}

impl IsoCurveSet {
    /// Create a set; one strip list per level.
    pub fn new(
        levels: Vec<f64>,
        lists: Vec<StripList>,
        map: NodeMap,
        discontinuities: BTreeSet<usize>,
    ) -> Self {
        debug_assert_eq!(levels.len(), lists.len());
        Self {
            levels,
            lists,
            map,
            discontinuities,
        }
    }

    /// Number of levels (including any appended sentinel levels).
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Strip list for one level position.
    pub fn list(&self, level_idx: usize) -> &StripList {
        &self.lists[level_idx]
    }

    /// Total number of strips across all levels.
    pub fn total_strips(&self) -> usize {
        self.lists.iter().map(|l| l.len()).sum()
    }

    /// Total number of strip nodes across all levels.
    pub fn total_nodes(&self) -> usize {
        self.lists
            .iter()
            .flat_map(|l| l.iter())
            .map(|s| s.len())
            .sum()
    }

    /// Convert one strip to physical coordinates for rendering.
    pub fn strip_points(&self, strip: &Strip) -> Vec<(f64, f64)> {
        strip.nodes().iter().map(|&n| self.map.point(n)).collect()
    }

    /// Bounding box of every strip node in the set, if any nodes exist.
    pub fn bounding_box(&self) -> Option<Limits> {
        let mut bbox: Option<Limits> = None;
        for strip in self.lists.iter().flat_map(|l| l.iter()) {
            for &node in strip.nodes() {
                let (x, y) = self.map.point(node);
                let point = Limits::new(x, y, x, y);
                bbox = Some(match bbox {
                    Some(b) => b.union(&point),
                    None => point,
                });
            }
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridSpec;

    #[test]
    fn test_chaining_ops() {
        let mut strip = Strip::segment(3, 4);
        strip.push_back(5);
        strip.push_front(2);
        assert_eq!(strip.nodes(), &[2, 3, 4, 5]);
        assert_eq!(strip.first(), Some(2));
        assert_eq!(strip.last(), Some(5));

        strip.reverse();
        assert_eq!(strip.nodes(), &[5, 4, 3, 2]);
    }

    #[test]
    fn test_append_empties_other() {
        let mut a = Strip::from_nodes(vec![1, 2, 3]);
        let mut b = Strip::from_nodes(vec![4, 5]);
        a.append(&mut b);
        assert_eq!(a.nodes(), &[1, 2, 3, 4, 5]);
        assert!(b.is_empty());
    }

    #[test]
    fn test_append_welds_shared_junction() {
        let mut a = Strip::from_nodes(vec![1, 2, 3]);
        let mut b = Strip::from_nodes(vec![3, 4, 5]);
        a.append(&mut b);
        assert_eq!(a.nodes(), &[1, 2, 3, 4, 5]);

        // Distinct junction nodes are both kept (a welded jump).
        let mut c = Strip::from_nodes(vec![1, 2]);
        let mut d = Strip::from_nodes(vec![9, 8]);
        c.append(&mut d);
        assert_eq!(c.nodes(), &[1, 2, 9, 8]);
    }

    #[test]
    fn test_closed() {
        let mut strip = Strip::from_nodes(vec![1, 2, 3]);
        assert!(!strip.is_closed());
        strip.close();
        assert_eq!(strip.nodes(), &[1, 2, 3, 1]);
        assert!(strip.is_closed());

        // Closing twice is a no-op.
        strip.close();
        assert_eq!(strip.len(), 4);

        // A two-node strip never counts as closed.
        let tiny = Strip::from_nodes(vec![7, 7]);
        assert!(!tiny.is_closed());
    }

    #[test]
    fn test_repeated_nodes() {
        let strip = Strip::from_nodes(vec![1, 2, 3, 2, 4, 1]);
        assert_eq!(strip.repeated_nodes(), vec![2, 1]);
        assert_eq!(strip.repeated_node(), Some(2));

        // The closing duplicate is not a self-crossing.
        let closed = Strip::from_nodes(vec![1, 2, 3, 1]);
        assert!(closed.repeated_node().is_none());

        let simple = Strip::from_nodes(vec![1, 2, 3]);
        assert!(simple.repeated_node().is_none());
    }

    #[test]
    fn test_sub_path() {
        let strip = Strip::from_nodes(vec![10, 11, 12, 13, 14]);
        let forward = strip.sub_path(11, 13).unwrap();
        assert_eq!(forward.nodes(), &[11, 12, 13]);

        let backward = strip.sub_path(13, 10).unwrap();
        assert_eq!(backward.nodes(), &[13, 12, 11, 10]);

        assert!(strip.sub_path(11, 99).is_none());
    }

    #[test]
    fn test_set_accessors() {
        let map = NodeMap::new(Limits::new(0.0, 0.0, 1.0, 1.0), GridSpec::new(2, 2));
        let lists = vec![vec![Strip::from_nodes(vec![0, 1])], vec![]];
        let set = IsoCurveSet::new(vec![0.5, 0.7], lists, map, BTreeSet::new());

        assert_eq!(set.level_count(), 2);
        assert_eq!(set.total_strips(), 1);
        assert_eq!(set.total_nodes(), 2);

        let points = set.strip_points(&set.lists[0][0]);
        assert_eq!(points, vec![(0.0, 0.0), (0.0, 0.5)]);
    }

    #[test]
    fn test_bounding_box() {
        let map = NodeMap::new(Limits::new(0.0, 0.0, 2.0, 2.0), GridSpec::new(2, 2));
        // Nodes (1,1) and (2,0): indices 4 and 6 in column-major order.
        let lists = vec![vec![Strip::from_nodes(vec![4, 6])]];
        let set = IsoCurveSet::new(vec![0.0], lists, map, BTreeSet::new());

        let bbox = set.bounding_box().unwrap();
        assert_eq!(bbox, Limits::new(1.0, 0.0, 2.0, 1.0));

        let empty = IsoCurveSet::new(vec![0.0], vec![vec![]], map, BTreeSet::new());
        assert!(empty.bounding_box().is_none());
    }
}
