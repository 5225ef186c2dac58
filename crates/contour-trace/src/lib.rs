//! Iso-contour tracing over scalar fields.
//!
//! This crate turns the raw segments of the marching engine into
//! finished contour sets: [`StripAccumulator`] chains segments into
//! per-level polylines, [`ContourSet`] drives generation passes and
//! closes strips around field discontinuities, and the [`cache`] module
//! moves finished sets in and out of a binary cache file.
//!
//! ```
//! use contour_engine::EngineConfig;
//! use contour_trace::ContourSet;
//! use field_common::{GridSpec, Limits};
//!
//! let config = EngineConfig {
//!     levels: vec![0.0],
//!     limits: Limits::new(-2.0, -2.0, 2.0, 2.0),
//!     primary: GridSpec::new(8, 8),
//!     secondary: GridSpec::new(64, 64),
//!     ..EngineConfig::default()
//! };
//! let mut contours = ContourSet::new(config, |x, y| x * x + y * y - 1.0).unwrap();
//! let set = contours.run().unwrap();
//! assert!(set.lists[0][0].is_closed());
//! ```

pub mod accumulate;
pub mod cache;
pub mod graph;
pub mod levels;
pub mod stitch;

pub use accumulate::StripAccumulator;
pub use graph::{accept_path, rotation_equal, BoundaryGraph};
pub use levels::level_steps;
pub use stitch::{find_intersections, find_self_intersections, synthesize_strip, ContourSet};
