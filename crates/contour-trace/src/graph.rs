//! Node adjacency graph over strips, with an indirect-path search used
//! when rerouting strips around discontinuity fences.

use field_common::Strip;
use std::collections::{BTreeMap, HashMap};

/// Undirected graph over node indices.
///
/// Built from the strips of one or more levels, it answers one
/// question: is there a way from one node to another that does not use
/// their direct edge? Adjacency is kept in a [`BTreeMap`] so iteration
/// order, and therefore search results, are deterministic.
#[derive(Debug, Default, Clone)]
pub struct BoundaryGraph {
    adjacency: BTreeMap<usize, Vec<usize>>,
}

impl BoundaryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an undirected edge. Self loops and duplicates are ignored.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let forward = self.adjacency.entry(a).or_default();
        if !forward.contains(&b) {
            forward.push(b);
        }
        let backward = self.adjacency.entry(b).or_default();
        if !backward.contains(&a) {
            backward.push(a);
        }
    }

    /// Add every consecutive node pair of the strip as an edge.
    pub fn add_strip(&mut self, strip: &Strip) {
        for pair in strip.nodes().windows(2) {
            self.add_edge(pair[0], pair[1]);
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find an indirect route from `source` to `target`.
    ///
    /// The search runs breadth-first from both ends at once, advancing
    /// the smaller frontier one layer per step. The direct
    /// `source`-`target` edge is never taken, since the caller is
    /// looking for a replacement for exactly that hop, and any route
    /// without an intermediate node is rejected.
    pub fn bidirectional_search(&self, source: usize, target: usize) -> Option<Vec<usize>> {
        if source == target {
            return None;
        }
        if !self.adjacency.contains_key(&source) || !self.adjacency.contains_key(&target) {
            return None;
        }

        let mut parent_fwd: HashMap<usize, usize> = HashMap::new();
        let mut parent_bwd: HashMap<usize, usize> = HashMap::new();
        parent_fwd.insert(source, source);
        parent_bwd.insert(target, target);
        let mut frontier_fwd = vec![source];
        let mut frontier_bwd = vec![target];

        while !frontier_fwd.is_empty() && !frontier_bwd.is_empty() {
            let forward = frontier_fwd.len() <= frontier_bwd.len();
            let (frontier, parents, other) = if forward {
                (&mut frontier_fwd, &mut parent_fwd, &parent_bwd)
            } else {
                (&mut frontier_bwd, &mut parent_bwd, &parent_fwd)
            };

            let mut next = Vec::new();
            let mut meet = None;
            'layer: for &node in frontier.iter() {
                for &neighbor in self.adjacency[&node].iter() {
                    let direct = (node == source && neighbor == target)
                        || (node == target && neighbor == source);
                    if direct || parents.contains_key(&neighbor) {
                        continue;
                    }
                    parents.insert(neighbor, node);
                    if other.contains_key(&neighbor) {
                        meet = Some(neighbor);
                        break 'layer;
                    }
                    next.push(neighbor);
                }
            }

            if let Some(meet) = meet {
                let path = reconstruct(meet, &parent_fwd, &parent_bwd);
                if path.len() > 2 {
                    return Some(path);
                }
                return None;
            }
            *frontier = next;
        }
        None
    }
}

/// Stitch the two half-paths that met at `meet` into one source-to-target
/// node list. Both parent maps mark their root with a self edge.
fn reconstruct(
    meet: usize,
    parent_fwd: &HashMap<usize, usize>,
    parent_bwd: &HashMap<usize, usize>,
) -> Vec<usize> {
    let mut path = vec![meet];
    let mut node = meet;
    while let Some(&parent) = parent_fwd.get(&node) {
        if parent == node {
            break;
        }
        path.push(parent);
        node = parent;
    }
    path.reverse();

    let mut node = meet;
    while let Some(&parent) = parent_bwd.get(&node) {
        if parent == node {
            break;
        }
        path.push(parent);
        node = parent;
    }
    path
}

/// True when both strips trace the same node sequence, treating closed
/// strips as cycles: any rotation of the loop, in either direction,
/// counts as equal.
pub fn rotation_equal(a: &Strip, b: &Strip) -> bool {
    if a.is_closed() != b.is_closed() {
        return false;
    }
    if !a.is_closed() {
        return a.nodes() == b.nodes() || a.nodes().iter().rev().eq(b.nodes().iter());
    }

    // Strip the duplicated closing node before comparing cycles.
    let cycle_a = &a.nodes()[..a.len() - 1];
    let cycle_b = &b.nodes()[..b.len() - 1];
    if cycle_a.len() != cycle_b.len() {
        return false;
    }
    let n = cycle_a.len();
    (0..n).any(|rot| {
        (0..n).all(|i| cycle_a[i] == cycle_b[(rot + i) % n])
            || (0..n).all(|i| cycle_a[i] == cycle_b[(rot + n - i) % n])
    })
}

/// Add `candidate` to `accepted` unless an equivalent strip is already
/// present. Returns whether the candidate was kept.
pub fn accept_path(accepted: &mut Vec<Strip>, candidate: Strip) -> bool {
    if accepted.iter().any(|s| rotation_equal(s, &candidate)) {
        return false;
    }
    accepted.push(candidate);
    true
}
