//! Sliding window of secondary-grid node storage.
//!
//! A full secondary partition can reach 4097 x 4097 nodes, far too much to
//! materialize densely. The sweep only ever touches one primary row band
//! at a time, so node storage is a ring buffer per column: each column
//! holds `band rows + 1` slots and a node's slot is its row modulo that
//! capacity. Advancing to the next band clears exactly the slots whose
//! rows fall out of the band; the shared boundary row survives in place.

use crate::node::GridNode;

/// Bounded node storage for the current sweep band.
pub struct NodeWindow {
    /// One ring buffer per node column.
    columns: Vec<Vec<Option<GridNode>>>,
    /// Slots per column.
    capacity: usize,
    /// Inclusive row range currently addressable.
    lo: usize,
    hi: usize,
}

impl NodeWindow {
    /// Create a window over `node_cols` columns holding `capacity` rows
    /// each. The band starts empty at rows `[0, capacity - 1]`.
    pub fn new(node_cols: usize, capacity: usize) -> Self {
        assert!(capacity >= 2);
        Self {
            columns: vec![vec![None; capacity]; node_cols],
            capacity,
            lo: 0,
            hi: capacity - 1,
        }
    }

    /// Rows currently addressable, inclusive.
    pub fn band(&self) -> (usize, usize) {
        (self.lo, self.hi)
    }

    /// Clear everything and address rows `[lo, hi]`.
    pub fn reset(&mut self, lo: usize, hi: usize) {
        debug_assert!(hi >= lo && hi - lo + 1 <= self.capacity);
        for column in &mut self.columns {
            column.fill(None);
        }
        self.lo = lo;
        self.hi = hi;
    }

    /// Advance the band, recycling the slots of rows that dropped out.
    ///
    /// Rows shared between the old and new band keep their nodes, which is
    /// what carries the boundary row of one primary band into the next.
    pub fn advance(&mut self, lo: usize, hi: usize) {
        debug_assert!(lo >= self.lo && hi >= self.hi);
        debug_assert!(hi >= lo && hi - lo + 1 <= self.capacity);

        for row in self.lo..lo.min(self.hi + 1) {
            let slot = row % self.capacity;
            for column in &mut self.columns {
                column[slot] = None;
            }
        }
        // A jump past the old band leaves no surviving rows.
        if lo > self.hi {
            for column in &mut self.columns {
                column.fill(None);
            }
        }

        self.lo = lo;
        self.hi = hi;
    }

    fn slot(&self, col: usize, row: usize) -> usize {
        debug_assert!(
            row >= self.lo && row <= self.hi,
            "node read outside the sweep window: row {} not in [{}, {}]",
            row,
            self.lo,
            self.hi
        );
        debug_assert!(col < self.columns.len());
        row % self.capacity
    }

    /// Node at (col, row), if evaluated.
    pub fn get(&self, col: usize, row: usize) -> Option<&GridNode> {
        let slot = self.slot(col, row);
        self.columns[col][slot].as_ref()
    }

    /// Mutable node at (col, row), if evaluated.
    pub fn get_mut(&mut self, col: usize, row: usize) -> Option<&mut GridNode> {
        let slot = self.slot(col, row);
        self.columns[col][slot].as_mut()
    }

    /// Store a node at (col, row).
    pub fn insert(&mut self, col: usize, row: usize, node: GridNode) {
        let slot = self.slot(col, row);
        self.columns[col][slot] = Some(node);
    }

    /// Number of evaluated nodes currently held.
    pub fn occupied(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.iter().filter(|n| n.is_some()).count())
            .sum()
    }
}
