//! The contour engine: a banded two-pass sweep over the secondary grid
//! with sentinel-based self-healing around field discontinuities.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use field_common::{ContourResult, NodeMap};

use crate::config::EngineConfig;
use crate::crossings;
use crate::sample::{sentinel_magnitude, FieldSample};
use crate::subdivide::{self, Block};

/// Receiver for the raw segments of a sweep.
///
/// `begin` is called once per sweep before any segment, carrying the full
/// level list for that sweep. A healing retry starts a fresh sweep, so a
/// sink must drop everything it collected when `begin` arrives again.
pub trait SegmentSink {
    /// A sweep is starting over `levels`.
    fn begin(&mut self, levels: &[f64]);

    /// One crossing segment between two node indices at `levels[level_idx]`.
    fn segment(&mut self, level_idx: usize, a: usize, b: usize);
}

/// Outcome of [`GridContourEngine::generate`].
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Levels of the final sweep: the configured levels, plus two fence
    /// levels when a healing pass ran.
    pub levels: Vec<f64>,
    /// Node indices where the field came back NaN or infinite.
    pub discontinuities: BTreeSet<usize>,
    /// Node map of the secondary grid the segments are indexed against.
    pub map: NodeMap,
    /// Whether a healing retry ran.
    pub healed: bool,
}

/// Marching engine over a lazily evaluated scalar field.
///
/// The field is any `Fn(f64, f64) -> f64`; it is consulted only at the
/// nodes the adaptive subdivision actually needs.
pub struct GridContourEngine<F> {
    config: EngineConfig,
    field: F,
}

impl<F> GridContourEngine<F>
where
    F: Fn(f64, f64) -> f64,
{
    /// Build an engine over a scalar field, validating the configuration
    /// up front.
    pub fn new(config: EngineConfig, field: F) -> ContourResult<Self> {
        config.validate()?;
        Ok(Self { config, field })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a sweep with the default single healing retry.
    pub fn generate<S: SegmentSink>(&self, sink: &mut S) -> SweepReport {
        self.generate_with_retries(sink, 1)
    }

    /// Run up to `1 + retries` sweeps. After a sweep that hit
    /// discontinuities, the level list grows by a pair of fence levels
    /// bracketing every real level, and the whole sweep reruns so the
    /// fences can outline the invalid region.
    pub fn generate_with_retries<S: SegmentSink>(&self, sink: &mut S, retries: usize) -> SweepReport {
        let mut levels = self.config.levels.clone();
        let mut remaining = retries;
        let mut healed = false;

        loop {
            let discontinuities = self.sweep(&levels, sink);
            if discontinuities.is_empty() || remaining == 0 {
                return SweepReport {
                    levels,
                    discontinuities,
                    map: self.config.node_map(),
                    healed,
                };
            }

            let fence = sentinel_magnitude(&levels);
            warn!(
                discontinuities = discontinuities.len(),
                fence, "field discontinuities found, regenerating with fence levels"
            );
            levels.push(-fence);
            levels.push(fence);
            remaining -= 1;
            healed = true;
        }
    }

    /// One full sweep: for each primary row band, subdivide every block,
    /// then resolve every block against the cached values, then slide the
    /// node window up to the next band.
    fn sweep<S: SegmentSink>(&self, levels: &[f64], sink: &mut S) -> BTreeSet<usize> {
        sink.begin(levels);

        let map = self.config.node_map();
        let block_cols = self.config.block_cols();
        let block_rows = self.config.block_rows();
        let mut sample =
            FieldSample::new(&self.field, map, sentinel_magnitude(levels), block_rows + 1);

        for band in 0..self.config.primary.rows {
            let j1 = band * block_rows;
            let j2 = j1 + block_rows;
            if band == 0 {
                sample.reset_band(j1, j2);
            } else {
                sample.advance_band(j1, j2);
            }

            for pc in 0..self.config.primary.cols {
                let block = Block::new(pc * block_cols, (pc + 1) * block_cols, j1, j2);
                subdivide::subdivide_block(&mut sample, block);
            }
            for pc in 0..self.config.primary.cols {
                let block = Block::new(pc * block_cols, (pc + 1) * block_cols, j1, j2);
                crossings::resolve_block(&mut sample, block, levels, sink);
            }
        }

        let (discontinuities, evaluations, cache_hits) = sample.finish();
        debug!(
            levels = levels.len(),
            evaluations,
            cache_hits,
            discontinuities = discontinuities.len(),
            "contour sweep complete"
        );
        discontinuities
    }
}
