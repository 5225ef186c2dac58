//! Per-cell crossing resolution, pass two of the sweep.
//!
//! Replays the subdivision walk over cached values and classifies every
//! indivisible cell against each level with the usual sixteen-case corner
//! table. Crossings are quantized to the nearest secondary node, so a
//! segment is a pair of node indices.

use crate::engine::SegmentSink;
use crate::node::Dir;
use crate::sample::FieldSample;
use crate::subdivide::{walk_blocks, Block};

/// Values closer than this are treated as equal when interpolating.
const INTERP_EPSILON: f64 = 1e-6;

/// Pass two over a primary block: emit the crossing segments of every
/// indivisible cell for every level.
pub(crate) fn resolve_block<F, S>(
    sample: &mut FieldSample<'_, F>,
    block: Block,
    levels: &[f64],
    sink: &mut S,
) where
    F: Fn(f64, f64) -> f64,
    S: SegmentSink,
{
    walk_blocks(sample, block, |sample, cell| {
        resolve_cell(sample, cell, levels, sink)
    });
}

fn resolve_cell<F, S>(sample: &mut FieldSample<'_, F>, cell: Block, levels: &[f64], sink: &mut S)
where
    F: Fn(f64, f64) -> f64,
    S: SegmentSink,
{
    let v00 = sample.value_at(cell.i1, cell.j1);
    let v10 = sample.value_at(cell.i2, cell.j1);
    let v01 = sample.value_at(cell.i1, cell.j2);
    let v11 = sample.value_at(cell.i2, cell.j2);

    for (level_idx, &level) in levels.iter().enumerate() {
        let s00 = v00 >= level;
        let s10 = v10 >= level;
        let s11 = v11 >= level;
        let s01 = v01 >= level;

        let case =
            s00 as usize | (s10 as usize) << 1 | (s11 as usize) << 2 | (s01 as usize) << 3;

        match case {
            // Single corner below or above: one segment clips it off.
            1 | 14 => {
                let b = bottom(sample, &cell, v00, v10, level);
                let l = left(sample, &cell, v00, v01, level);
                emit(sink, level_idx, b, l);
            }
            2 | 13 => {
                let b = bottom(sample, &cell, v00, v10, level);
                let r = right(sample, &cell, v10, v11, level);
                emit(sink, level_idx, b, r);
            }
            4 | 11 => {
                let r = right(sample, &cell, v10, v11, level);
                let t = top(sample, &cell, v01, v11, level);
                emit(sink, level_idx, r, t);
            }
            7 | 8 => {
                let t = top(sample, &cell, v01, v11, level);
                let l = left(sample, &cell, v00, v01, level);
                emit(sink, level_idx, t, l);
            }
            // Opposite sides split: the contour runs straight through.
            3 | 12 => {
                let l = left(sample, &cell, v00, v01, level);
                let r = right(sample, &cell, v10, v11, level);
                emit(sink, level_idx, l, r);
            }
            6 | 9 => {
                let b = bottom(sample, &cell, v00, v10, level);
                let t = top(sample, &cell, v01, v11, level);
                emit(sink, level_idx, b, t);
            }
            // Both diagonals alternate: sample the cell midpoint to pick
            // which pair of corners the contour separates.
            5 | 10 => {
                let b = bottom(sample, &cell, v00, v10, level);
                let r = right(sample, &cell, v10, v11, level);
                let t = top(sample, &cell, v01, v11, level);
                let l = left(sample, &cell, v00, v01, level);

                let mid_x = (sample.map().x_at(cell.i1) + sample.map().x_at(cell.i2)) / 2.0;
                let mid_y = (sample.map().y_at(cell.j1) + sample.map().y_at(cell.j2)) / 2.0;
                let mid = sample.sample_raw(mid_x, mid_y);

                if (mid >= level) == s00 {
                    emit(sink, level_idx, b, r);
                    emit(sink, level_idx, t, l);
                } else {
                    emit(sink, level_idx, b, l);
                    emit(sink, level_idx, r, t);
                }
            }
            // 0 and 15: all corners on one side, nothing to draw.
            _ => {}
        }
    }
}

/// Forward degenerate-free segments to the sink. Crossings that quantize
/// to the same node carry no geometry and are dropped here.
fn emit<S: SegmentSink>(sink: &mut S, level_idx: usize, a: usize, b: usize) {
    if a != b {
        sink.segment(level_idx, a, b);
    }
}

fn bottom<F>(sample: &FieldSample<'_, F>, cell: &Block, v00: f64, v10: f64, level: f64) -> usize
where
    F: Fn(f64, f64) -> f64,
{
    horizontal_crossing(sample, cell.i1, v00, cell.i2, v10, cell.j1, level)
}

fn top<F>(sample: &FieldSample<'_, F>, cell: &Block, v01: f64, v11: f64, level: f64) -> usize
where
    F: Fn(f64, f64) -> f64,
{
    horizontal_crossing(sample, cell.i1, v01, cell.i2, v11, cell.j2, level)
}

fn left<F>(sample: &FieldSample<'_, F>, cell: &Block, v00: f64, v01: f64, level: f64) -> usize
where
    F: Fn(f64, f64) -> f64,
{
    vertical_crossing(sample, cell.j1, v00, cell.j2, v01, cell.i1, level)
}

fn right<F>(sample: &FieldSample<'_, F>, cell: &Block, v10: f64, v11: f64, level: f64) -> usize
where
    F: Fn(f64, f64) -> f64,
{
    vertical_crossing(sample, cell.j1, v10, cell.j2, v11, cell.i2, level)
}

/// Locate the crossing on a horizontal edge and return its node index.
///
/// When subdivision evaluated nodes between the corners, walk the
/// rightward gap chain to the first span whose endpoints straddle the
/// level and interpolate inside it. A broken chain (unknown gap, a step
/// past the far corner, or an unevaluated node) falls back to
/// interpolating across the whole edge.
fn horizontal_crossing<F>(
    sample: &FieldSample<'_, F>,
    c1: usize,
    v1: f64,
    c2: usize,
    v2: f64,
    row: usize,
    level: f64,
) -> usize
where
    F: Fn(f64, f64) -> f64,
{
    let side = v1 >= level;
    let mut col = c1;
    let mut value = v1;

    while col < c2 {
        let Some(gap) = sample.gap(col, row, Dir::Right) else {
            break;
        };
        let next = col + gap as usize + 1;
        if next > c2 {
            break;
        }
        let Some(next_value) = sample.try_value(next, row) else {
            break;
        };
        if (next_value >= level) != side {
            let cross = interpolate_span(col as f64, value, next as f64, next_value, level);
            return sample.map().index(cross.round() as usize, row);
        }
        col = next;
        value = next_value;
    }

    let cross = interpolate_span(c1 as f64, v1, c2 as f64, v2, level);
    sample.map().index(cross.round() as usize, row)
}

/// Vertical twin of [`horizontal_crossing`], walking the upward chain.
fn vertical_crossing<F>(
    sample: &FieldSample<'_, F>,
    r1: usize,
    v1: f64,
    r2: usize,
    v2: f64,
    col: usize,
    level: f64,
) -> usize
where
    F: Fn(f64, f64) -> f64,
{
    let side = v1 >= level;
    let mut row = r1;
    let mut value = v1;

    while row < r2 {
        let Some(gap) = sample.gap(col, row, Dir::Up) else {
            break;
        };
        let next = row + gap as usize + 1;
        if next > r2 {
            break;
        }
        let Some(next_value) = sample.try_value(col, next) else {
            break;
        };
        if (next_value >= level) != side {
            let cross = interpolate_span(row as f64, value, next as f64, next_value, level);
            return sample.map().index(col, cross.round() as usize);
        }
        row = next;
        value = next_value;
    }

    let cross = interpolate_span(r1 as f64, v1, r2 as f64, v2, level);
    sample.map().index(col, cross.round() as usize)
}

/// Linear interpolation of the level crossing between two nodes, in node
/// units. Near-equal endpoint values degrade to the span midpoint, and
/// the parameter is clamped so the crossing never leaves the span.
fn interpolate_span(p1: f64, v1: f64, p2: f64, v2: f64, level: f64) -> f64 {
    if (v2 - v1).abs() < INTERP_EPSILON {
        return (p1 + p2) / 2.0;
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    p1 + t * (p2 - p1)
}
