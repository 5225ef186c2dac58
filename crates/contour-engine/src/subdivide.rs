//! Adaptive block subdivision, pass one of the sweep.
//!
//! The primary partition cuts the secondary grid into blocks. Each block
//! either splits toward finer blocks where the field looks non-monotone,
//! or settles as an indivisible cell whose corner gaps tell pass two how
//! far apart its evaluated corners sit.

use crate::node::Dir;
use crate::sample::FieldSample;

/// A rectangular block of secondary cells, named by corner node columns
/// `[i1, i2]` and rows `[j1, j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

impl Block {
    pub fn new(i1: usize, i2: usize, j1: usize, j2: usize) -> Self {
        debug_assert!(i2 > i1 && j2 > j1);
        Self { i1, i2, j1, j2 }
    }

    /// Width in secondary cells.
    pub fn span_x(&self) -> usize {
        self.i2 - self.i1
    }

    /// Height in secondary cells.
    pub fn span_y(&self) -> usize {
        self.j2 - self.j1
    }
}

/// How a block continues: split along one or both axes, or stop.
enum Disposition {
    Quad(usize, usize),
    SplitX(usize),
    SplitY(usize),
    Cell,
}

/// Evaluate a block's corners (and center when splittable) and apply the
/// four-corner majority test: a block subdivides when more than two
/// corners sit strictly on the same side of the center estimate, an early
/// hint of saddle or non-monotone topology inside the block.
fn classify<F>(sample: &mut FieldSample<'_, F>, b: Block) -> Disposition
where
    F: Fn(f64, f64) -> f64,
{
    let corners = [
        sample.value_at(b.i1, b.j1),
        sample.value_at(b.i2, b.j1),
        sample.value_at(b.i1, b.j2),
        sample.value_at(b.i2, b.j2),
    ];

    let split_x = b.span_x() >= 2;
    let split_y = b.span_y() >= 2;
    if !split_x && !split_y {
        return Disposition::Cell;
    }

    let ic = (b.i1 + b.i2) / 2;
    let jc = (b.j1 + b.j2) / 2;
    let center = sample.value_at(ic, jc);

    let above = corners.iter().filter(|&&v| v > center).count();
    let below = corners.iter().filter(|&&v| v < center).count();
    if above <= 2 && below <= 2 {
        return Disposition::Cell;
    }

    match (split_x, split_y) {
        (true, true) => Disposition::Quad(ic, jc),
        (true, false) => Disposition::SplitX(ic),
        (false, true) => Disposition::SplitY(jc),
        (false, false) => Disposition::Cell,
    }
}

/// Walk a block's adaptive subdivision with an explicit work stack,
/// invoking `on_cell` for every indivisible cell.
///
/// Every split decision is a function of cached node values, so replaying
/// the walk in pass two visits exactly the cells pass one settled on.
pub(crate) fn walk_blocks<F, G>(sample: &mut FieldSample<'_, F>, root: Block, mut on_cell: G)
where
    F: Fn(f64, f64) -> f64,
    G: FnMut(&mut FieldSample<'_, F>, Block),
{
    let mut stack = vec![root];
    while let Some(b) = stack.pop() {
        match classify(sample, b) {
            Disposition::Quad(ic, jc) => {
                stack.push(Block::new(b.i1, ic, b.j1, jc));
                stack.push(Block::new(ic, b.i2, b.j1, jc));
                stack.push(Block::new(b.i1, ic, jc, b.j2));
                stack.push(Block::new(ic, b.i2, jc, b.j2));
            }
            Disposition::SplitX(ic) => {
                stack.push(Block::new(b.i1, ic, b.j1, b.j2));
                stack.push(Block::new(ic, b.i2, b.j1, b.j2));
            }
            Disposition::SplitY(jc) => {
                stack.push(Block::new(b.i1, b.i2, b.j1, jc));
                stack.push(Block::new(b.i1, b.i2, jc, b.j2));
            }
            Disposition::Cell => on_cell(sample, b),
        }
    }
}

/// Pass one over a primary block: subdivide and record the skip gaps at
/// each indivisible cell's corners.
pub(crate) fn subdivide_block<F>(sample: &mut FieldSample<'_, F>, block: Block)
where
    F: Fn(f64, f64) -> f64,
{
    walk_blocks(sample, block, record_cell_gaps);
}

/// Record the cell's width and height as gaps on all four corners so the
/// crossing walk can skip-interpolate along its edges.
fn record_cell_gaps<F>(sample: &mut FieldSample<'_, F>, cell: Block)
where
    F: Fn(f64, f64) -> f64,
{
    let gx = (cell.span_x() - 1) as i16;
    let gy = (cell.span_y() - 1) as i16;

    sample.set_gap_min(cell.i1, cell.j1, Dir::Right, gx);
    sample.set_gap_min(cell.i1, cell.j1, Dir::Up, gy);
    sample.set_gap_min(cell.i2, cell.j1, Dir::Left, gx);
    sample.set_gap_min(cell.i2, cell.j1, Dir::Up, gy);
    sample.set_gap_min(cell.i1, cell.j2, Dir::Right, gx);
    sample.set_gap_min(cell.i1, cell.j2, Dir::Down, gy);
    sample.set_gap_min(cell.i2, cell.j2, Dir::Left, gx);
    sample.set_gap_min(cell.i2, cell.j2, Dir::Down, gy);
}
