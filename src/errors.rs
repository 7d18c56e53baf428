// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the correction pipeline

use std::fmt;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Per-frame pipeline error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Frame size differs from the configured pipeline geometry
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// Filter-stage errors
    Filter(FilterError),
    /// Optics-stage errors
    Optics(OpticsError),
    /// Configuration rejected at pipeline construction
    Config(String),
}

/// Median filter errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Window dimensions incompatible with the median filters.
    ///
    /// Both window dimensions must be odd, at least 1, and no larger than
    /// the frame. Odd-only windows are the fixed policy that keeps the sort
    /// and histogram medians bit-identical: both select the sample of
    /// one-based rank `(area + 1) / 2`.
    InvalidWindowSize { window_w: usize, window_h: usize },
}

/// Optics configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpticsError {
    /// The medium stack needs at least an inner medium and an immersion medium
    MediumStackTooShort(usize),
    /// Refractive indices must be positive
    InvalidRefractiveIndex(String),
    /// Bounded layer thicknesses must be non-negative
    InvalidThickness(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::DimensionMismatch { expected, actual } => write!(
                f,
                "Frame is {}x{} but the pipeline was configured for {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            PipelineError::Filter(e) => write!(f, "Filter error: {}", e),
            PipelineError::Optics(e) => write!(f, "Optics error: {}", e),
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::InvalidWindowSize { window_w, window_h } => write!(
                f,
                "Invalid median window {}x{}: dimensions must be odd, at least 1, and fit the frame",
                window_w, window_h
            ),
        }
    }
}

impl fmt::Display for OpticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpticsError::MediumStackTooShort(n) => write!(
                f,
                "Medium stack has {} layer(s); need at least the sensor-side gap and the immersion medium",
                n
            ),
            OpticsError::InvalidRefractiveIndex(msg) => {
                write!(f, "Invalid refractive index: {}", msg)
            }
            OpticsError::InvalidThickness(msg) => write!(f, "Invalid layer thickness: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
impl std::error::Error for FilterError {}
impl std::error::Error for OpticsError {}

impl From<FilterError> for PipelineError {
    fn from(err: FilterError) -> Self {
        PipelineError::Filter(err)
    }
}

impl From<OpticsError> for PipelineError {
    fn from(err: OpticsError) -> Self {
        PipelineError::Optics(err)
    }
}
