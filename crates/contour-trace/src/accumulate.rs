//! Strip accumulation: chaining raw sweep segments into polylines and
//! compacting them into per-level strip lists.

use contour_engine::{EngineConfig, SegmentSink, SweepReport};
use field_common::{IsoCurveSet, NodeMap, Strip, StripList};
use tracing::{debug, warn};

/// Collects the engine's raw segments and chains them greedily into
/// strips, one list per level.
///
/// Chaining matches each incoming segment endpoint against the heads and
/// tails of the live strips for its level; a segment that matches nothing
/// starts a new strip. The geometric cleanup happens once at the end, in
/// [`StripAccumulator::compact`].
#[derive(Debug, Clone, Default)]
pub struct StripAccumulator {
    levels: Vec<f64>,
    lists: Vec<StripList>,
}

impl StripAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels of the sweep currently being collected.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// The raw, uncompacted strip lists.
    pub fn lists(&self) -> &[StripList] {
        &self.lists
    }

    /// Fold the collected strips into an [`IsoCurveSet`].
    ///
    /// Per level this runs, in order: exact endpoint merging to a
    /// fixpoint, tolerance welding of nearby open endpoints, closure of
    /// near-closed interior strips, and boundary classification. Open
    /// strips that exit through the domain boundary are legitimate; any
    /// other open strip is kept but logged, unless the weld override is
    /// set.
    pub fn compact(self, report: SweepReport, config: &EngineConfig) -> IsoCurveSet {
        debug_assert_eq!(self.levels, report.levels);

        let weld = config.weld_distance(report.healed);
        let map = report.map;
        let mut lists = self.lists;
        let mut unresolved = 0usize;

        for (level_idx, list) in lists.iter_mut().enumerate() {
            merge_exact(list);
            weld_merge(list, &map, weld);
            normalize_closure(list, &map, weld);

            for strip in list.iter() {
                if strip.is_closed() || exits_through_boundary(strip, &map) {
                    continue;
                }
                unresolved += 1;
                if !config.weld_override {
                    warn!(
                        level = report.levels[level_idx],
                        nodes = strip.len(),
                        "open strip does not reach the domain boundary; keeping it"
                    );
                }
            }
        }

        debug!(
            levels = lists.len(),
            strips = lists.iter().map(|l| l.len()).sum::<usize>(),
            unresolved,
            healed = report.healed,
            "strip compaction complete"
        );

        IsoCurveSet::new(self.levels, lists, map, report.discontinuities)
    }
}

impl SegmentSink for StripAccumulator {
    fn begin(&mut self, levels: &[f64]) {
        self.levels = levels.to_vec();
        self.lists = vec![StripList::new(); levels.len()];
    }

    fn segment(&mut self, level_idx: usize, a: usize, b: usize) {
        chain(&mut self.lists[level_idx], a, b);
    }
}

/// Attach one segment to the strip list: extend the first strip whose
/// head or tail matches either endpoint, or start a new strip.
fn chain(strips: &mut StripList, a: usize, b: usize) {
    for strip in strips.iter_mut() {
        if strip.is_closed() {
            continue;
        }
        if strip.first() == Some(a) {
            strip.push_front(b);
            return;
        }
        if strip.last() == Some(a) {
            strip.push_back(b);
            return;
        }
        if strip.first() == Some(b) {
            strip.push_front(a);
            return;
        }
        if strip.last() == Some(b) {
            strip.push_back(a);
            return;
        }
    }
    strips.push(Strip::segment(a, b));
}

/// Merge strips that share an exact endpoint until no merge applies,
/// dropping degenerate fragments.
fn merge_exact(strips: &mut StripList) {
    strips.retain(|s| s.len() >= 2);
    loop {
        let mut merged = false;
        'scan: for i in 0..strips.len() {
            for j in (i + 1)..strips.len() {
                if try_merge_exact(strips, i, j) {
                    strips.remove(j);
                    merged = true;
                    break 'scan;
                }
            }
        }
        if !merged {
            break;
        }
    }
    strips.retain(|s| s.len() >= 2);
}

/// Join strip `j` onto strip `i` if they share an endpoint, emptying `j`.
fn try_merge_exact(strips: &mut StripList, i: usize, j: usize) -> bool {
    let (head, tail) = strips.split_at_mut(j);
    let a = &mut head[i];
    let b = &mut tail[0];
    if a.is_closed() || b.is_closed() {
        return false;
    }

    if a.last() == b.first() {
        a.append(b);
    } else if a.last() == b.last() {
        b.reverse();
        a.append(b);
    } else if a.first() == b.first() {
        a.reverse();
        a.append(b);
    } else if a.first() == b.last() {
        a.reverse();
        b.reverse();
        a.append(b);
    } else {
        return false;
    }
    true
}

/// How two open strips can be joined end to end.
#[derive(Clone, Copy)]
enum Join {
    TailHead,
    TailTail,
    HeadHead,
    HeadTail,
}

/// Weld open strips whose endpoints sit within the tolerance, nearest
/// pair first, until nothing is close enough.
fn weld_merge(strips: &mut StripList, map: &NodeMap, weld: f64) {
    loop {
        let mut best: Option<(usize, usize, Join, f64)> = None;

        for i in 0..strips.len() {
            if strips[i].is_closed() {
                continue;
            }
            for j in (i + 1)..strips.len() {
                if strips[j].is_closed() {
                    continue;
                }
                let candidates = endpoint_candidates(&strips[i], &strips[j], map);
                for (join, dist) in candidates {
                    if dist <= weld && best.map_or(true, |(_, _, _, d)| dist < d) {
                        best = Some((i, j, join, dist));
                    }
                }
            }
        }

        let Some((i, j, join, _)) = best else {
            break;
        };
        apply_join(strips, i, j, join);
        strips.remove(j);
    }
}

fn endpoint_candidates(a: &Strip, b: &Strip, map: &NodeMap) -> Vec<(Join, f64)> {
    let mut out = Vec::with_capacity(4);
    if let (Some(at), Some(ah), Some(bt), Some(bh)) = (a.last(), a.first(), b.last(), b.first()) {
        out.push((Join::TailHead, map.distance(at, bh)));
        out.push((Join::TailTail, map.distance(at, bt)));
        out.push((Join::HeadHead, map.distance(ah, bh)));
        out.push((Join::HeadTail, map.distance(ah, bt)));
    }
    out
}

fn apply_join(strips: &mut StripList, i: usize, j: usize, join: Join) {
    let (head, tail) = strips.split_at_mut(j);
    let a = &mut head[i];
    let b = &mut tail[0];
    match join {
        Join::TailHead => a.append(b),
        Join::TailTail => {
            b.reverse();
            a.append(b);
        }
        Join::HeadHead => {
            a.reverse();
            a.append(b);
        }
        Join::HeadTail => {
            a.reverse();
            b.reverse();
            a.append(b);
        }
    }
}

/// Close interior strips whose loose ends already sit within the weld
/// tolerance, so "closed" always means first index equals last index.
fn normalize_closure(strips: &mut StripList, map: &NodeMap, weld: f64) {
    for strip in strips.iter_mut() {
        if strip.is_closed() || strip.len() < 3 {
            continue;
        }
        if exits_through_boundary(strip, map) {
            continue;
        }
        let (Some(first), Some(last)) = (strip.first(), strip.last()) else {
            continue;
        };
        if map.distance(first, last) <= weld {
            strip.close();
        }
    }
}

/// An open strip legitimately exits the domain when both loose ends lie
/// on the boundary rectangle.
pub(crate) fn exits_through_boundary(strip: &Strip, map: &NodeMap) -> bool {
    match (strip.first(), strip.last()) {
        (Some(first), Some(last)) => map.on_boundary(first) && map.on_boundary(last),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_common::{GridSpec, Limits};
    use std::collections::BTreeSet;

    fn test_map() -> NodeMap {
        // 4x4 cells over [0,4]^2: dx = dy = 1, column stride 5.
        NodeMap::new(Limits::new(0.0, 0.0, 4.0, 4.0), GridSpec::new(4, 4))
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            levels: vec![0.0],
            limits: Limits::new(0.0, 0.0, 4.0, 4.0),
            primary: GridSpec::new(2, 2),
            secondary: GridSpec::new(4, 4),
            ..EngineConfig::default()
        }
    }

    fn report(map: NodeMap) -> SweepReport {
        SweepReport {
            levels: vec![0.0],
            discontinuities: BTreeSet::new(),
            map,
            healed: false,
        }
    }

    #[test]
    fn test_chain_appends_and_prepends() {
        let mut strips = StripList::new();
        chain(&mut strips, 2, 3);
        chain(&mut strips, 3, 4);
        chain(&mut strips, 1, 2);
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].nodes(), &[1, 2, 3, 4]);

        chain(&mut strips, 10, 11);
        assert_eq!(strips.len(), 2);
        assert_eq!(strips[1].nodes(), &[10, 11]);
    }

    #[test]
    fn test_chain_closes_loop() {
        let mut strips = StripList::new();
        chain(&mut strips, 1, 2);
        chain(&mut strips, 2, 3);
        chain(&mut strips, 3, 1);
        assert_eq!(strips.len(), 1);
        assert!(strips[0].is_closed());
        assert_eq!(strips[0].nodes(), &[1, 2, 3, 1]);

        // A closed strip no longer accepts segments.
        chain(&mut strips, 1, 7);
        assert_eq!(strips.len(), 2);
    }

    #[test]
    fn test_merge_exact_joins_shared_endpoints() {
        let mut strips = vec![
            Strip::from_nodes(vec![1, 2, 3]),
            Strip::from_nodes(vec![5, 4, 3]),
        ];
        merge_exact(&mut strips);
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].nodes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_merge_exact_chains_through_middle_strip() {
        let mut strips = vec![
            Strip::from_nodes(vec![1, 2]),
            Strip::from_nodes(vec![5, 6]),
            Strip::from_nodes(vec![2, 5]),
        ];
        merge_exact(&mut strips);
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].nodes(), &[1, 2, 5, 6]);
    }

    #[test]
    fn test_compact_welds_nearby_endpoints() {
        let map = test_map();
        let mut acc = StripAccumulator::new();
        acc.begin(&[0.0]);
        // Two fragments along row 0 with a two-cell gap between them.
        acc.segment(0, map.index(0, 0), map.index(1, 0));
        acc.segment(0, map.index(3, 0), map.index(4, 0));

        let set = acc.compact(report(map), &test_config());
        assert_eq!(set.lists[0].len(), 1);
        assert_eq!(
            set.lists[0][0].nodes(),
            &[
                map.index(0, 0),
                map.index(1, 0),
                map.index(3, 0),
                map.index(4, 0)
            ]
        );
        // Both loose ends are on the boundary, so the strip stays open.
        assert!(!set.lists[0][0].is_closed());
    }

    #[test]
    fn test_compact_closes_interior_ring() {
        let map = test_map();
        let mut acc = StripAccumulator::new();
        acc.begin(&[0.0]);
        // A three-sided interior ring whose loose ends are one cell apart.
        acc.segment(0, map.index(1, 1), map.index(2, 1));
        acc.segment(0, map.index(2, 1), map.index(2, 2));
        acc.segment(0, map.index(2, 2), map.index(1, 2));

        let set = acc.compact(report(map), &test_config());
        assert_eq!(set.lists[0].len(), 1);
        let strip = &set.lists[0][0];
        assert!(strip.is_closed());
        assert_eq!(strip.first(), strip.last());
    }

    #[test]
    fn test_compact_keeps_unresolved_open_strip() {
        let map = test_map();
        let mut acc = StripAccumulator::new();
        acc.begin(&[0.0]);
        // Interior fragment with nothing to weld to and too long a gap
        // to self-close exactly, but within weld distance of closure.
        acc.segment(0, map.index(1, 1), map.index(3, 1));

        let set = acc.compact(report(map), &test_config());
        // The fragment is retained rather than dropped.
        assert_eq!(set.lists[0].len(), 1);
    }
}
