//! Lazy field sampling over the node window.
//!
//! All field access during a sweep goes through [`FieldSample`]: it
//! evaluates the caller's field at node coordinates at most once, swaps
//! NaN and infinite results for finite sentinel values, and records where
//! that happened. NaN and infinities are expected data here, never errors.

use crate::node::{Dir, GridNode};
use crate::window::NodeWindow;
use field_common::NodeMap;
use std::collections::BTreeSet;

/// Magnitude used for sentinel substitution and fence levels: ten times
/// the largest absolute level, with a floor for all-zero level sets.
///
/// On a self-heal pass the level list already carries the fence levels,
/// so substituted values land another factor of ten beyond the fences and
/// every fence level separates real data from substituted nodes.
pub fn sentinel_magnitude(levels: &[f64]) -> f64 {
    let max_abs = levels.iter().fold(0.0_f64, |acc, l| acc.max(l.abs()));
    if max_abs > 0.0 {
        max_abs * 10.0
    } else {
        10.0
    }
}

/// One sweep's cached view of the field.
pub(crate) struct FieldSample<'a, F> {
    field: &'a F,
    map: NodeMap,
    sentinel: f64,
    window: NodeWindow,
    discontinuities: BTreeSet<usize>,
    evaluations: u64,
    cache_hits: u64,
}

impl<'a, F> FieldSample<'a, F>
where
    F: Fn(f64, f64) -> f64,
{
    /// Create a sampler whose window holds `window_rows` rows per column.
    pub fn new(field: &'a F, map: NodeMap, sentinel: f64, window_rows: usize) -> Self {
        Self {
            field,
            map,
            sentinel,
            window: NodeWindow::new(map.cols() + 1, window_rows),
            discontinuities: BTreeSet::new(),
            evaluations: 0,
            cache_hits: 0,
        }
    }

    pub fn map(&self) -> &NodeMap {
        &self.map
    }

    /// Begin the first band.
    pub fn reset_band(&mut self, lo: usize, hi: usize) {
        self.window.reset(lo, hi);
    }

    /// Move to the next band, keeping the shared boundary row.
    pub fn advance_band(&mut self, lo: usize, hi: usize) {
        self.window.advance(lo, hi);
    }

    /// Field value at a node, evaluating and caching on first access.
    pub fn value_at(&mut self, col: usize, row: usize) -> f64 {
        if let Some(node) = self.window.get(col, row) {
            self.cache_hits += 1;
            return node.value;
        }

        let raw = (self.field)(self.map.x_at(col), self.map.y_at(row));
        self.evaluations += 1;
        let value = if raw.is_finite() {
            raw
        } else {
            self.discontinuities.insert(self.map.index(col, row));
            substitute(raw, self.sentinel)
        };
        self.window.insert(col, row, GridNode::new(value));
        value
    }

    /// Cached value at a node, without evaluating.
    pub fn try_value(&self, col: usize, row: usize) -> Option<f64> {
        self.window.get(col, row).map(|n| n.value)
    }

    /// Known gap at a node, if the node is evaluated and the gap recorded.
    pub fn gap(&self, col: usize, row: usize, dir: Dir) -> Option<i16> {
        self.window.get(col, row).and_then(|n| n.gap(dir))
    }

    /// Record a gap at an evaluated node, keeping the nearest neighbor.
    pub fn set_gap_min(&mut self, col: usize, row: usize, dir: Dir, gap: i16) {
        if let Some(node) = self.window.get_mut(col, row) {
            node.set_gap_min(dir, gap);
        } else {
            debug_assert!(false, "gap recorded at unevaluated node ({col}, {row})");
        }
    }

    /// Direct field evaluation at arbitrary coordinates, used for saddle
    /// disambiguation at cell midpoints. Not cached. A non-finite result
    /// is substituted like any other and charged to the nearest node.
    pub fn sample_raw(&mut self, x: f64, y: f64) -> f64 {
        let raw = (self.field)(x, y);
        self.evaluations += 1;
        if raw.is_finite() {
            raw
        } else {
            self.discontinuities.insert(self.map.nearest_index(x, y));
            substitute(raw, self.sentinel)
        }
    }

    /// Finish the sweep: discontinuities plus evaluation statistics.
    pub fn finish(self) -> (BTreeSet<usize>, u64, u64) {
        (self.discontinuities, self.evaluations, self.cache_hits)
    }
}

/// Sentinel replacement for a non-finite field value. Positive infinity
/// lands above every level, NaN and negative infinity below.
fn substitute(raw: f64, sentinel: f64) -> f64 {
    if raw == f64::INFINITY {
        sentinel
    } else {
        -sentinel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_common::{GridSpec, Limits};

    fn sampler<F: Fn(f64, f64) -> f64>(field: &F) -> FieldSample<'_, F> {
        let map = NodeMap::new(Limits::new(0.0, 0.0, 4.0, 4.0), GridSpec::new(4, 4));
        let mut sample = FieldSample::new(field, map, 10.0, 5);
        sample.reset_band(0, 4);
        sample
    }

    #[test]
    fn test_sentinel_magnitude() {
        assert_eq!(sentinel_magnitude(&[0.1, 1.0]), 10.0);
        assert_eq!(sentinel_magnitude(&[-3.0, 2.0]), 30.0);
        assert_eq!(sentinel_magnitude(&[0.0]), 10.0);
        // A healed level list pushes substitution beyond the fences.
        assert_eq!(sentinel_magnitude(&[0.1, 1.0, -10.0, 10.0]), 100.0);
    }

    #[test]
    fn test_lazy_evaluation_caches() {
        use std::cell::Cell;
        let calls = Cell::new(0u32);
        let field = |x: f64, y: f64| {
            calls.set(calls.get() + 1);
            x + y
        };
        let mut sample = sampler(&field);

        assert_eq!(sample.value_at(1, 2), 3.0);
        assert_eq!(sample.value_at(1, 2), 3.0);
        assert_eq!(calls.get(), 1);
        assert_eq!(sample.try_value(1, 2), Some(3.0));
        assert_eq!(sample.try_value(0, 0), None);

        let (disc, evals, hits) = sample.finish();
        assert!(disc.is_empty());
        assert_eq!(evals, 1);
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_substitution_records_discontinuity() {
        let field = |x: f64, _y: f64| {
            if x < 1.5 {
                f64::NAN
            } else if x < 2.5 {
                f64::INFINITY
            } else {
                1.0
            }
        };
        let mut sample = sampler(&field);

        assert_eq!(sample.value_at(0, 0), -10.0); // NaN -> below
        assert_eq!(sample.value_at(2, 0), 10.0); // +Inf -> above
        assert_eq!(sample.value_at(3, 0), 1.0);

        let map = NodeMap::new(Limits::new(0.0, 0.0, 4.0, 4.0), GridSpec::new(4, 4));
        let (disc, _, _) = sample.finish();
        assert!(disc.contains(&map.index(0, 0)));
        assert!(disc.contains(&map.index(2, 0)));
        assert_eq!(disc.len(), 2);
    }

    #[test]
    fn test_sample_raw_charges_nearest_node() {
        let field = |x: f64, _y: f64| if x > 2.0 { f64::NEG_INFINITY } else { x };
        let mut sample = sampler(&field);

        assert_eq!(sample.sample_raw(1.2, 0.0), 1.2);
        assert_eq!(sample.sample_raw(2.9, 1.1), -10.0);

        let map = NodeMap::new(Limits::new(0.0, 0.0, 4.0, 4.0), GridSpec::new(4, 4));
        let (disc, _, _) = sample.finish();
        assert_eq!(disc.len(), 1);
        assert!(disc.contains(&map.index(3, 1)));
    }

    #[test]
    fn test_gap_passthrough() {
        let field = |_: f64, _: f64| 0.0;
        let mut sample = sampler(&field);
        sample.value_at(0, 0);

        assert_eq!(sample.gap(0, 0, Dir::Right), None);
        sample.set_gap_min(0, 0, Dir::Right, 3);
        assert_eq!(sample.gap(0, 0, Dir::Right), Some(3));
        // Unevaluated nodes report no gap.
        assert_eq!(sample.gap(1, 1, Dir::Left), None);
    }
}
