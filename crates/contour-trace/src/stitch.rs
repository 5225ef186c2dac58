//! Contour set orchestration: repeated generation passes, the strip
//! cache, intersection detection between strips, and synthesis of the
//! extra closed strips the marching sweep cannot produce on its own near
//! field discontinuities.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use contour_engine::{EngineConfig, GridContourEngine};
use field_common::{
    ContourError, ContourResult, IntersectionRecord, IsoCurveSet, Limits, NodeMap, Strip,
    BOUNDARY_EPSILON,
};

use crate::accumulate::{exits_through_boundary, StripAccumulator};
use crate::cache;
use crate::graph::{accept_path, BoundaryGraph};

/// Maximum generation passes when refitting to scattered data.
const MAX_REFIT_PASSES: usize = 3;

/// Drives contour generation for one field and configuration, and holds
/// the produced set.
///
/// The engine emits segments, the accumulator chains and compacts them;
/// this type composes the two, reruns them while the working rectangle
/// is still settling in scattered-data mode, closes strips around
/// discontinuity fences, and moves finished sets in and out of the
/// binary cache.
pub struct ContourSet<F> {
    config: EngineConfig,
    field: F,
    set: Option<IsoCurveSet>,
}

impl<F> ContourSet<F>
where
    F: Fn(f64, f64) -> f64,
{
    /// Create a contour set driver, validating the configuration up
    /// front.
    pub fn new(config: EngineConfig, field: F) -> ContourResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            field,
            set: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The most recently generated or loaded set, if any.
    pub fn set(&self) -> Option<&IsoCurveSet> {
        self.set.as_ref()
    }

    /// Generate the contour set.
    ///
    /// With `extrapolate` set, one engine pass covers the configured
    /// rectangle. In scattered-data mode the working limits are refitted
    /// to the extent of the produced contours and the generation reruns,
    /// up to three passes, until the rectangle stops moving by more than
    /// half a secondary cell. Afterwards, open strips that stop at
    /// discontinuity fences are completed into closed polygons.
    pub fn run(&mut self) -> ContourResult<&IsoCurveSet> {
        let mut working = self.config.clone();
        let mut set = self.generate_once(&working)?;

        if !working.extrapolate {
            for pass in 1..MAX_REFIT_PASSES {
                let Some(refit) = refit_limits(&working, &set) else {
                    break;
                };
                let threshold = set.map.delta_x().min(set.map.delta_y()) / 2.0;
                if working.limits.max_edge_delta(&refit) < threshold {
                    break;
                }
                debug!(
                    pass,
                    min_x = refit.min_x,
                    min_y = refit.min_y,
                    max_x = refit.max_x,
                    max_y = refit.max_y,
                    "refitting working limits to the contour extent"
                );
                working.limits = refit;
                set = self.generate_once(&working)?;
            }
        }

        if !set.discontinuities.is_empty() {
            close_discontinuity_strips(&mut set, &working);
        }

        Ok(self.set.insert(set))
    }

    fn generate_once(&self, config: &EngineConfig) -> ContourResult<IsoCurveSet> {
        let engine = GridContourEngine::new(config.clone(), &self.field)?;
        let mut sink = StripAccumulator::new();
        let report = engine.generate(&mut sink);
        Ok(sink.compact(report, config))
    }

    /// Write the generated set to the binary cache at `path`.
    pub fn persist(&self, path: &Path) -> ContourResult<()> {
        match &self.set {
            Some(set) => cache::persist(set, path),
            None => Err(ContourError::invalid_config(
                "nothing to persist: run() has not produced a contour set",
            )),
        }
    }

    /// Adopt a cached set for this configuration, if one is usable.
    ///
    /// Returns whether a set was adopted; any mismatch or read failure
    /// leaves the driver unchanged so the caller can fall back to
    /// [`ContourSet::run`].
    pub fn load(&mut self, path: &Path) -> bool {
        match cache::load(path, &self.config) {
            Some(set) => {
                self.set = Some(set);
                true
            }
            None => false,
        }
    }
}

/// Next working rectangle for a scattered-data pass, or `None` when no
/// contour nodes exist to fit to.
///
/// The contour bounding box, padded by one primary cell, becomes the new
/// rectangle; each side that an open strip currently exits through grows
/// by a quarter of the present span so the next pass can follow the
/// contour outward.
fn refit_limits(config: &EngineConfig, set: &IsoCurveSet) -> Option<Limits> {
    let bbox = set.bounding_box()?;
    let pad_x = set.map.delta_x() * config.block_cols() as f64;
    let pad_y = set.map.delta_y() * config.block_rows() as f64;
    let mut limits = bbox.expand(pad_x, pad_y);

    let grow_x = config.limits.width() / 4.0;
    let grow_y = config.limits.height() / 4.0;
    let [left, right, bottom, top] = boundary_sides_touched(set);
    if left {
        limits.min_x -= grow_x;
    }
    if right {
        limits.max_x += grow_x;
    }
    if bottom {
        limits.min_y -= grow_y;
    }
    if top {
        limits.max_y += grow_y;
    }
    Some(limits)
}

/// Which sides of the working rectangle open strips exit through,
/// as `[left, right, bottom, top]`.
fn boundary_sides_touched(set: &IsoCurveSet) -> [bool; 4] {
    let limits = *set.map.limits();
    let mut sides = [false; 4];
    for strip in set.lists.iter().flat_map(|list| list.iter()) {
        if strip.is_closed() {
            continue;
        }
        for node in [strip.first(), strip.last()].into_iter().flatten() {
            let (x, y) = set.map.point(node);
            if (x - limits.min_x).abs() < BOUNDARY_EPSILON {
                sides[0] = true;
            }
            if (x - limits.max_x).abs() < BOUNDARY_EPSILON {
                sides[1] = true;
            }
            if (y - limits.min_y).abs() < BOUNDARY_EPSILON {
                sides[2] = true;
            }
            if (y - limits.max_y).abs() < BOUNDARY_EPSILON {
                sides[3] = true;
            }
        }
    }
    sides
}

/// Node pairs where a strip crosses itself.
///
/// Each node index the strip visits more than once yields one record
/// pairing the node with itself. The closing duplicate of a closed
/// strip is not a revisit.
pub fn find_self_intersections(strip: &Strip) -> Vec<IntersectionRecord> {
    strip
        .repeated_nodes()
        .into_iter()
        .map(|n| IntersectionRecord::new(n, n))
        .collect()
}

/// Find node pairs of two strips that coincide within `weld`.
///
/// The same strip passed twice, whether aliased or a value-equal clone,
/// is a self-intersection query and delegates to
/// [`find_self_intersections`]. Otherwise every node of `a` searches
/// outward over the grid in square rings until it finds a node of `b`
/// within the weld distance; at most one record per node of `a`.
pub fn find_intersections(
    map: &NodeMap,
    a: &Strip,
    b: &Strip,
    weld: f64,
) -> Vec<IntersectionRecord> {
    if std::ptr::eq(a, b) || a == b {
        return find_self_intersections(a);
    }

    let targets: HashSet<usize> = b.nodes().iter().copied().collect();
    let spacing = map.delta_x().min(map.delta_y());
    let max_ring = (weld / spacing).ceil() as isize + 1;

    let mut records = Vec::new();
    let mut matched = HashSet::new();
    for &node in a.nodes() {
        let col = map.col(node) as isize;
        let row = map.row(node) as isize;
        'rings: for ring in 0..=max_ring {
            for (dc, dr) in ring_offsets(ring) {
                let c = col + dc;
                let r = row + dr;
                if c < 0 || r < 0 || c > map.cols() as isize || r > map.rows() as isize {
                    continue;
                }
                let candidate = map.index(c as usize, r as usize);
                if !targets.contains(&candidate) || map.distance(node, candidate) > weld {
                    continue;
                }
                if matched.insert((node, candidate)) {
                    records.push(IntersectionRecord::new(node, candidate));
                }
                break 'rings;
            }
        }
    }
    records
}

/// Offsets forming the square ring at Chebyshev radius `ring`.
fn ring_offsets(ring: isize) -> Vec<(isize, isize)> {
    if ring == 0 {
        return vec![(0, 0)];
    }
    let mut offsets = Vec::with_capacity(ring as usize * 8);
    for dc in -ring..=ring {
        for dr in -ring..=ring {
            if dc.abs().max(dr.abs()) == ring {
                offsets.push((dc, dr));
            }
        }
    }
    offsets
}

/// Concatenate intersection-bounded legs into one closed strip.
///
/// `records` pair nodes of the `family_a` strips (`index`) with nodes of
/// the `family_b` strips (`j_index`), ordered around the candidate
/// polygon. The leg between consecutive records comes from whichever
/// family has a strip containing both of its endpoints, preferring
/// `family_a`; legs that cross themselves or revisit nodes the polygon
/// already owns are rejected, which forces the closing leg onto the
/// other family instead of doubling back. Returns `None` when any leg
/// cannot be resolved cleanly.
pub fn synthesize_strip(
    family_a: &[Strip],
    family_b: &[Strip],
    records: &[IntersectionRecord],
) -> Option<Strip> {
    if records.len() < 2 {
        return None;
    }

    let mut out = Strip::new();
    for k in 0..records.len() {
        let from = records[k];
        let to = records[(k + 1) % records.len()];
        let closing = k + 1 == records.len();
        let mut leg = pick_leg(family_a, family_b, from, to, &out, closing)?;
        if out.is_empty() {
            out = leg;
        } else {
            out.append(&mut leg);
        }
    }

    out.close();
    if out.len() < 4 || !out.is_closed() {
        return None;
    }
    Some(out)
}

fn pick_leg(
    family_a: &[Strip],
    family_b: &[Strip],
    from: IntersectionRecord,
    to: IntersectionRecord,
    out: &Strip,
    closing: bool,
) -> Option<Strip> {
    let candidates = [
        (family_a, from.index, to.index),
        (family_b, from.j_index, to.j_index),
    ];
    for (family, start, end) in candidates {
        for strip in family {
            if !strip.contains(start) || !strip.contains(end) {
                continue;
            }
            let Some(leg) = strip.sub_path(start, end) else {
                continue;
            };
            if leg_is_clean(&leg, out, closing) {
                return Some(leg);
            }
        }
    }
    None
}

/// A leg may touch the polygon only at its junctions: its first node may
/// sit on the polygon tail, and the last node of the closing leg may land
/// back on the polygon start. Everything else is an accidental crossing.
fn leg_is_clean(leg: &Strip, out: &Strip, closing: bool) -> bool {
    if leg.repeated_node().is_some() {
        return false;
    }
    for (i, &node) in leg.nodes().iter().enumerate() {
        if !out.contains(node) {
            continue;
        }
        let joins_tail = i == 0 && out.last() == Some(node);
        let lands_on_start = closing && i + 1 == leg.len() && out.first() == Some(node);
        if !(joins_tail || lands_on_start) {
            return false;
        }
    }
    true
}

/// Complete real-level strips that were cut short by discontinuity
/// fences.
///
/// A healed generation carries two sentinel levels whose strips outline
/// the invalid region. For each configured level, every open strip that
/// stops in the interior gets its loose ends matched against the fence
/// outlines; the strip plus the connecting fence arc form a closed
/// polygon that replaces it. When no single fence strip connects the two
/// ends, an indirect route is searched across the graph of all fence
/// strips. A polygon equivalent to one already accepted for the level
/// drops its fragment instead of duplicating the loop.
fn close_discontinuity_strips(set: &mut IsoCurveSet, config: &EngineConfig) {
    let configured = config.levels.len();
    if set.level_count() <= configured {
        return;
    }
    let fences: Vec<Strip> = set.lists[configured..]
        .iter()
        .flat_map(|list| list.iter().cloned())
        .collect();
    if fences.is_empty() {
        return;
    }

    let weld = config.weld_distance(true);
    let map = set.map;
    let mut synthesized = 0usize;

    for level_idx in 0..configured {
        let mut accepted: Vec<Strip> = Vec::new();
        let mut outcomes: Vec<(usize, Option<Strip>)> = Vec::new();

        for (strip_idx, strip) in set.lists[level_idx].iter().enumerate() {
            if strip.is_closed() || exits_through_boundary(strip, &map) {
                continue;
            }
            let Some(polygon) = reroute_around_fences(&map, strip, &fences, weld) else {
                continue;
            };
            if accept_path(&mut accepted, polygon.clone()) {
                outcomes.push((strip_idx, Some(polygon)));
            } else {
                outcomes.push((strip_idx, None));
            }
        }

        let list = &mut set.lists[level_idx];
        for (strip_idx, outcome) in outcomes.into_iter().rev() {
            match outcome {
                Some(polygon) => {
                    list[strip_idx] = polygon;
                    synthesized += 1;
                }
                None => {
                    list.remove(strip_idx);
                }
            }
        }
    }

    if synthesized > 0 {
        debug!(synthesized, "completed open strips around discontinuity fences");
    }
}

/// Close one open strip against the fence outlines, directly via a
/// single fence strip or indirectly via a graph search, or give up and
/// leave the strip as it is.
fn reroute_around_fences(
    map: &NodeMap,
    strip: &Strip,
    fences: &[Strip],
    weld: f64,
) -> Option<Strip> {
    let first = strip.first()?;
    let last = strip.last()?;

    let mut head: Option<IntersectionRecord> = None;
    let mut tail: Option<IntersectionRecord> = None;
    for fence in fences {
        for record in find_intersections(map, strip, fence, weld) {
            if head.is_none() && record.index == first {
                head = Some(record);
            }
            if tail.is_none() && record.index == last {
                tail = Some(record);
            }
        }
        if head.is_some() && tail.is_some() {
            break;
        }
    }
    let (head, tail) = (head?, tail?);

    let records = [head, tail];
    if let Some(polygon) = synthesize_strip(std::slice::from_ref(strip), fences, &records) {
        return Some(polygon);
    }

    let mut graph = BoundaryGraph::new();
    for fence in fences {
        graph.add_strip(fence);
    }
    let path = graph.bidirectional_search(tail.j_index, head.j_index)?;

    let mut polygon = strip.clone();
    for node in path {
        polygon.push_back(node);
    }
    polygon.close();
    if polygon.repeated_node().is_some() {
        return None;
    }
    Some(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_common::GridSpec;

    fn test_map() -> NodeMap {
        NodeMap::new(Limits::new(0.0, 0.0, 8.0, 8.0), GridSpec::new(8, 8))
    }

    // ========================================================================
    // Intersection detection
    // ========================================================================

    #[test]
    fn test_find_intersections_same_strip_reports_repeats() {
        let map = test_map();
        let strip = Strip::from_nodes(vec![1, 2, 3, 2, 5]);
        let records = find_intersections(&map, &strip, &strip, 1.0);
        assert_eq!(records, vec![IntersectionRecord::new(2, 2)]);
    }

    #[test]
    fn test_find_intersections_closed_strip_has_no_self_repeats() {
        let map = test_map();
        let strip = Strip::from_nodes(vec![1, 2, 3, 1]);
        assert!(find_intersections(&map, &strip, &strip, 1.0).is_empty());
    }

    #[test]
    fn test_find_intersections_cloned_strip_reports_repeats() {
        let map = test_map();
        let strip = Strip::from_nodes(vec![1, 2, 3, 2, 5]);
        // A value-equal clone is still a self-intersection query; the
        // ring search would pair every node with itself instead.
        let records = find_intersections(&map, &strip, &strip.clone(), 1.0);
        assert_eq!(records, vec![IntersectionRecord::new(2, 2)]);
    }

    #[test]
    fn test_find_self_intersections_lists_each_revisited_node() {
        let strip = Strip::from_nodes(vec![1, 2, 3, 2, 5, 3]);
        let records = find_self_intersections(&strip);
        assert_eq!(
            records,
            vec![IntersectionRecord::new(2, 2), IntersectionRecord::new(3, 3)]
        );
    }

    #[test]
    fn test_find_intersections_matches_nearby_nodes() {
        let map = test_map();
        // Both nodes of `a` sit within 1.5 of (2, 3); the far node of `b`
        // matches nothing.
        let a = Strip::from_nodes(vec![map.index(2, 2), map.index(3, 2)]);
        let b = Strip::from_nodes(vec![map.index(2, 3), map.index(6, 6)]);

        let records = find_intersections(&map, &a, &b, 1.5);
        assert_eq!(
            records,
            vec![
                IntersectionRecord::new(map.index(2, 2), map.index(2, 3)),
                IntersectionRecord::new(map.index(3, 2), map.index(2, 3)),
            ]
        );
    }

    #[test]
    fn test_find_intersections_respects_weld_distance() {
        let map = test_map();
        let a = Strip::from_nodes(vec![map.index(2, 2)]);
        let b = Strip::from_nodes(vec![map.index(2, 5)]);
        assert!(find_intersections(&map, &a, &b, 1.0).is_empty());
        assert_eq!(find_intersections(&map, &a, &b, 3.0).len(), 1);
    }

    #[test]
    fn test_ring_offsets_cover_the_square_ring() {
        assert_eq!(ring_offsets(0), vec![(0, 0)]);
        let ring = ring_offsets(2);
        assert_eq!(ring.len(), 16);
        assert!(ring.iter().all(|&(dc, dr)| dc.abs().max(dr.abs()) == 2));
    }

    // ========================================================================
    // Strip synthesis
    // ========================================================================

    #[test]
    fn test_synthesize_closes_fragment_against_fence_arc() {
        // Fragment 1-2-3 with both ends near a fence arc 10-11-12-13.
        let family_a = vec![Strip::from_nodes(vec![1, 2, 3])];
        let family_b = vec![Strip::from_nodes(vec![10, 11, 12, 13])];
        let records = [
            IntersectionRecord::new(1, 10),
            IntersectionRecord::new(3, 13),
        ];

        let polygon = synthesize_strip(&family_a, &family_b, &records).unwrap();
        assert!(polygon.is_closed());
        assert_eq!(polygon.nodes(), &[1, 2, 3, 13, 12, 11, 10, 1]);
    }

    #[test]
    fn test_synthesize_rejects_unconnected_families() {
        // The two fence nodes sit on different strips, so no family
        // provides the closing leg.
        let family_a = vec![Strip::from_nodes(vec![1, 2, 3])];
        let family_b = vec![
            Strip::from_nodes(vec![10, 11]),
            Strip::from_nodes(vec![12, 13]),
        ];
        let records = [
            IntersectionRecord::new(1, 10),
            IntersectionRecord::new(3, 13),
        ];
        assert_eq!(synthesize_strip(&family_a, &family_b, &records), None);
    }

    #[test]
    fn test_synthesize_rejects_self_crossing_leg() {
        let family_a = vec![Strip::from_nodes(vec![1, 2, 4, 2, 3])];
        let family_b = vec![Strip::from_nodes(vec![10, 11, 13])];
        let records = [
            IntersectionRecord::new(1, 10),
            IntersectionRecord::new(3, 13),
        ];
        assert_eq!(synthesize_strip(&family_a, &family_b, &records), None);
    }

    #[test]
    fn test_synthesize_requires_two_records() {
        let family = vec![Strip::from_nodes(vec![1, 2, 3])];
        assert_eq!(
            synthesize_strip(&family, &family, &[IntersectionRecord::new(1, 1)]),
            None
        );
    }

    // ========================================================================
    // Driver composition
    // ========================================================================

    fn circle_config() -> EngineConfig {
        EngineConfig {
            levels: vec![0.0],
            limits: Limits::new(-2.0, -2.0, 2.0, 2.0),
            primary: GridSpec::new(8, 8),
            secondary: GridSpec::new(64, 64),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_run_produces_closed_circle() {
        let mut contours = ContourSet::new(circle_config(), |x, y| x * x + y * y - 1.0).unwrap();
        let set = contours.run().unwrap();

        assert_eq!(set.level_count(), 1);
        assert_eq!(set.lists[0].len(), 1);
        assert!(set.lists[0][0].is_closed());
    }

    #[test]
    fn test_run_is_deterministic() {
        let field = |x: f64, y: f64| (x * 1.7).sin() - y;
        let first = {
            let mut c = ContourSet::new(circle_config(), field).unwrap();
            c.run().unwrap().clone()
        };
        let second = {
            let mut c = ContourSet::new(circle_config(), field).unwrap();
            c.run().unwrap().clone()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            levels: vec![],
            ..circle_config()
        };
        assert!(ContourSet::new(config, |x, _| x).is_err());
    }

    #[test]
    fn test_persist_before_run_is_an_error() {
        let contours = ContourSet::new(circle_config(), |x, _| x).unwrap();
        let dir = test_utils::scratch_dir();
        assert!(contours.persist(&dir.path().join("strips.bin")).is_err());
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let mut contours = ContourSet::new(circle_config(), |x, y| x * x + y * y - 1.0).unwrap();
        let expected = contours.run().unwrap().clone();

        let dir = test_utils::scratch_dir();
        let path = dir.path().join("strips.bin");
        contours.persist(&path).unwrap();

        let mut reloaded = ContourSet::new(circle_config(), |x, y| x * x + y * y - 1.0).unwrap();
        assert!(reloaded.load(&path));
        assert_eq!(reloaded.set(), Some(&expected));

        // A different level set refuses the cache.
        let other = EngineConfig {
            levels: vec![0.0, 0.5],
            ..circle_config()
        };
        let mut mismatched = ContourSet::new(other, |x, y| x * x + y * y - 1.0).unwrap();
        assert!(!mismatched.load(&path));
        assert_eq!(mismatched.set(), None);
    }

    #[test]
    fn test_refit_limits_tightens_to_contour() {
        let mut contours = ContourSet::new(circle_config(), |x, y| x * x + y * y - 1.0).unwrap();
        let set = contours.run().unwrap().clone();
        let refit = refit_limits(contours.config(), &set).unwrap();

        // The unit circle plus one primary cell of padding sits well
        // inside the [-2, 2] square.
        assert!(refit.min_x > -2.0 && refit.min_x < -1.0);
        assert!(refit.max_x < 2.0 && refit.max_x > 1.0);
        assert!(refit.min_y > -2.0 && refit.min_y < -1.0);
        assert!(refit.max_y < 2.0 && refit.max_y > 1.0);
    }

    #[test]
    fn test_boundary_sides_touched_flags_exits() {
        let mut contours = ContourSet::new(circle_config(), |_, y| y).unwrap();
        let set = contours.run().unwrap();
        // A horizontal isoline exits left and right only.
        assert_eq!(boundary_sides_touched(set), [true, true, false, false]);
    }
}
