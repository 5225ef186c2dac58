//! Adaptive contour extraction over lazily evaluated scalar fields.
//!
//! The engine marches a two-resolution grid: a coarse primary partition
//! fixes the sweep bands and a fine secondary partition carries the node
//! indices that segments refer to. Within each band, blocks subdivide
//! only where the field looks non-monotone, so smooth regions cost four
//! corner evaluations instead of a full scan. Fields may return NaN or
//! infinities; the engine substitutes sentinels and can regenerate behind
//! fence levels that outline the invalid region.

pub mod config;
pub mod engine;

mod crossings;
mod node;
mod sample;
mod subdivide;
mod window;

pub use config::{EngineConfig, MAX_SECONDARY_CELLS};
pub use engine::{GridContourEngine, SegmentSink, SweepReport};
pub use sample::sentinel_magnitude;
