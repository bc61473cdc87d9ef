//! Error types for harmonic analysis.

use thiserror::Error;

/// Failures raised while locating and refining spectral peaks.
///
/// None of these abort an analysis outright: the tracker turns them into an
/// empty profile (fundamental stage) or a skipped harmonic (harmonic stage).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The smoothed envelope never crossed its threshold.
    #[error("can't find peak")]
    PeakNotFound,

    /// The local search window is empty or leaves the spectrum.
    #[error("search window {center}±{radius} does not fit a {len}-bin spectrum")]
    WindowOutOfRange {
        center: usize,
        radius: usize,
        len: usize,
    },

    /// The approximate bin is too close to an edge for the sinc window.
    #[error("bin {bin} is too close to the edge of a {len}-bin spectrum to interpolate")]
    OutOfRange { bin: usize, len: usize },

    /// No scanned position reached the tracked maximum.
    #[error("can't find frequency near bin {bin}")]
    NoArgmax { bin: usize },

    /// A configuration value is outside its usable range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
