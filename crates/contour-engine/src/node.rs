//! Cached secondary-grid nodes and their gap fields.

/// Axis direction for a gap field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Left,
    Right,
    Down,
    Up,
}

impl Dir {
    fn slot(self) -> usize {
        match self {
            Dir::Left => 0,
            Dir::Right => 1,
            Dir::Down => 2,
            Dir::Up => 3,
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Up => Dir::Down,
        }
    }
}

const GAP_UNKNOWN: i16 = -1;

/// One cached field evaluation on the secondary grid.
///
/// The four gap fields record how many unevaluated nodes sit between this
/// node and its nearest evaluated neighbor in each axis direction: 0 means
/// the adjacent node is evaluated, larger values span an indivisible cell
/// edge. An unknown gap reads as `None`.
#[derive(Debug, Clone, Copy)]
pub struct GridNode {
    pub value: f64,
    gaps: [i16; 4],
}

impl GridNode {
    /// Create a node with its cached value and no known gaps.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            gaps: [GAP_UNKNOWN; 4],
        }
    }

    /// Gap toward the nearest evaluated neighbor in `dir`, if known.
    pub fn gap(&self, dir: Dir) -> Option<i16> {
        let gap = self.gaps[dir.slot()];
        if gap == GAP_UNKNOWN {
            None
        } else {
            Some(gap)
        }
    }

    /// Record a gap, keeping the smaller of the stored and supplied span.
    ///
    /// Neighboring cells of different sizes can both claim an edge from
    /// this node; the nearest evaluated neighbor wins.
    pub fn set_gap_min(&mut self, dir: Dir, gap: i16) {
        debug_assert!(gap >= 0);
        let slot = dir.slot();
        if self.gaps[slot] == GAP_UNKNOWN || gap < self.gaps[slot] {
            self.gaps[slot] = gap;
        }
    }
}
