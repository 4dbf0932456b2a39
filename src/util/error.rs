//! Error types for the point-based GI library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for point cloud, settings and cache operations.
///
/// The rasterizer itself never fails: degenerate geometry is skipped and
/// contract violations are debug assertions.
#[derive(Error, Debug)]
pub enum Error {
    /// Point cloud file does not exist or cannot be accessed
    #[error("Point cloud not found: {0}")]
    FileNotFound(PathBuf),

    /// Stride is smaller than the seven floats every surfel carries
    #[error("Surfel stride {0} is too small (need at least 7 floats: P, N, radius)")]
    StrideTooSmall(usize),

    /// Flat array length is not a whole number of surfels
    #[error("Surfel array of {len} floats is not a multiple of stride {stride}")]
    InvalidStride { stride: usize, len: usize },

    /// No surfels to build a hierarchy from
    #[error("Point cloud contains no surfels")]
    EmptyPointCloud,

    /// Query settings out of range
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Unrecognized shadeop parameter name
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Settings JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid settings error.
    pub fn invalid_settings(msg: impl Into<String>) -> Self {
        Self::InvalidSettings(msg.into())
    }
}

/// Result type alias for point-based GI operations.
pub type Result<T> = std::result::Result<T, Error>;
