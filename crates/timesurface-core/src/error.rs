//! Error type shared by the measurement pipeline.
//!
//! The core degrades silently wherever it can (calibration falls back to a
//! default frequency). The variants below are the few conditions a caller
//! actually has to handle.

use crate::sampler::Phase;

/// Errors surfaced by `timesurface-core`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A spin loop ran past its configured iteration limit without the cycle
    /// counter reaching the tick threshold.
    #[error("cycle counter stalled during {phase} phase after {iterations} spin iterations")]
    ClockStalled { phase: Phase, iterations: u64 },

    /// Statistics were requested for a sample set with no samples.
    #[error("cannot analyze an empty sample set")]
    EmptySampleSet,

    /// The target band cannot yield three ordered, non-zero tick thresholds.
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    /// A load table entry violates the transform buffer constraints.
    #[error("invalid load table: {0}")]
    InvalidLoadTable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
