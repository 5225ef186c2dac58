//! Error types for the iso-contour workspace.

use thiserror::Error;

/// Result type alias using ContourError.
pub type ContourResult<T> = Result<T, ContourError>;

/// Primary error type for contour operations.
///
/// Field evaluation anomalies (NaN, infinities) are deliberately absent:
/// they are expected data, handled by sentinel substitution and the
/// discontinuity self-heal pass, and never surface as errors.
#[derive(Debug, Error)]
pub enum ContourError {
    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid limits: {0}")]
    InvalidLimits(String),

    #[error("Invalid grid dimensions: {0}")]
    InvalidGrid(String),

    // === Strip Cache Errors ===
    #[error("Malformed strip cache: {0}")]
    CacheFormat(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),
}

impl ContourError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ContourError::InvalidConfig(msg.into())
    }

    /// Create an InvalidLimits error.
    pub fn invalid_limits(msg: impl Into<String>) -> Self {
        ContourError::InvalidLimits(msg.into())
    }

    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        ContourError::InvalidGrid(msg.into())
    }

    /// Create a CacheFormat error.
    pub fn cache_format(msg: impl Into<String>) -> Self {
        ContourError::CacheFormat(msg.into())
    }
}

// Conversion from common error types
impl From<std::io::Error> for ContourError {
    fn from(err: std::io::Error) -> Self {
        ContourError::Io(err.to_string())
    }
}
