//! Common types shared across the iso-contour workspace.

pub mod error;
pub mod grid;
pub mod limits;
pub mod strip;

pub use error::{ContourError, ContourResult};
pub use grid::{GridSpec, NodeMap};
pub use limits::{Limits, BOUNDARY_EPSILON};
pub use strip::{IntersectionRecord, IsoCurveSet, Strip, StripList};
