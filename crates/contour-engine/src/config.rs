//! Configuration for the grid contour engine.

use field_common::{ContourError, ContourResult, GridSpec, Limits, NodeMap};
use serde::{Deserialize, Serialize};

/// Largest supported secondary partition per axis (4097 nodes).
pub const MAX_SECONDARY_CELLS: usize = 4096;

/// Configuration for one contour generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target iso-values, in the order the caller wants them reported.
    pub levels: Vec<f64>,

    /// The rectangle to contour over.
    pub limits: Limits,

    /// Coarse partition: drives adaptive subdivision granularity and the
    /// size of the sliding node window.
    pub primary: GridSpec,

    /// Fine partition: bounds the geometric precision of crossings. Each
    /// axis must be a multiple of the primary partition.
    pub secondary: GridSpec,

    /// When true, the field is trusted across the whole rectangle and a
    /// single generation pass suffices. When false (scattered data mode)
    /// the stitcher refits the working limits over repeated passes.
    pub extrapolate: bool,

    /// Retain unpaired open strips silently instead of logging them.
    pub weld_override: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels: vec![0.0],
            limits: Limits::new(-1.0, -1.0, 1.0, 1.0),
            primary: GridSpec::new(16, 16),
            secondary: GridSpec::new(256, 256),
            extrapolate: true,
            weld_override: false,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    ///
    /// Invalid configurations are caller programming errors; nothing here
    /// is silently corrected.
    pub fn validate(&self) -> ContourResult<()> {
        if self.levels.is_empty() {
            return Err(ContourError::invalid_config("levels must not be empty"));
        }
        if self.levels.iter().any(|l| !l.is_finite()) {
            return Err(ContourError::invalid_config("levels must be finite"));
        }

        if !self.limits.is_valid() {
            return Err(ContourError::invalid_limits(format!(
                "limits must satisfy min < max on both axes, got [{}, {}] x [{}, {}]",
                self.limits.min_x, self.limits.max_x, self.limits.min_y, self.limits.max_y
            )));
        }

        for (name, spec) in [("primary", self.primary), ("secondary", self.secondary)] {
            if spec.cols < 2 || spec.rows < 2 {
                return Err(ContourError::invalid_grid(format!(
                    "{} partition must be at least 2x2, got {}x{}",
                    name, spec.cols, spec.rows
                )));
            }
        }

        if self.secondary.cols > MAX_SECONDARY_CELLS || self.secondary.rows > MAX_SECONDARY_CELLS {
            return Err(ContourError::invalid_grid(format!(
                "secondary partition exceeds {} cells per axis",
                MAX_SECONDARY_CELLS
            )));
        }

        if self.secondary.cols % self.primary.cols != 0
            || self.secondary.rows % self.primary.rows != 0
        {
            return Err(ContourError::invalid_grid(format!(
                "secondary partition {}x{} must be a multiple of primary {}x{}",
                self.secondary.cols, self.secondary.rows, self.primary.cols, self.primary.rows
            )));
        }

        Ok(())
    }

    /// Node-index mapping for the secondary partition over these limits.
    pub fn node_map(&self) -> NodeMap {
        NodeMap::new(self.limits, self.secondary)
    }

    /// Secondary cells per primary block along x.
    pub fn block_cols(&self) -> usize {
        self.secondary.cols / self.primary.cols
    }

    /// Secondary cells per primary block along y.
    pub fn block_rows(&self) -> usize {
        self.secondary.rows / self.primary.rows
    }

    /// Endpoint weld distance: the secondary node diagonal scaled by the
    /// secondary-to-primary resolution ratio, doubled when the generation
    /// recorded discontinuities.
    pub fn weld_distance(&self, healed: bool) -> f64 {
        let map = self.node_map();
        let diagonal = map.delta_x().hypot(map.delta_y());
        let ratio = self.block_cols().max(self.block_rows()) as f64;
        let weld = diagonal * ratio;
        if healed {
            weld * 2.0
        } else {
            weld
        }
    }
}
