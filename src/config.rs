// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline configuration
//!
//! `PipelineConfig` is the recognized-options record handed to
//! [`crate::pipeline::CorrectionPipeline`]. It serializes to JSON so batch
//! jobs can keep their correction settings next to the captured frames.

use crate::constants::{
    DEFAULT_CLIP_MAX_MM, DEFAULT_CLIP_MIN_MM, DEFAULT_MEDIAN_WINDOW,
};
use crate::optics::refraction::MediumStack;
use serde::{Deserialize, Serialize};

/// Median denoising variant selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedianMode {
    /// No median filtering
    #[default]
    None,
    /// Sort-based reference filter, parallel but slow
    Sort,
    /// Huang histogram filter, sequential but fast
    Fast,
}

impl MedianMode {
    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            MedianMode::None => "none",
            MedianMode::Sort => "sort",
            MedianMode::Fast => "fast",
        }
    }
}

/// Correction pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Zero out-of-range depth samples before any other stage
    pub clip_enabled: bool,
    /// Lower clip bound in millimeters (inclusive)
    pub clip_min_mm: u16,
    /// Upper clip bound in millimeters (inclusive)
    pub clip_max_mm: u16,
    /// Which median filter to run, if any
    pub median_mode: MedianMode,
    /// Median window width in pixels (must be odd)
    pub median_window_w: usize,
    /// Median window height in pixels (must be odd)
    pub median_window_h: usize,
    /// Apply the radial lens undistortion to the depth frame
    pub lens_undistort_enabled: bool,
    /// Apply refraction and time-of-flight recalibration
    pub refraction_enabled: bool,
    /// Media the ray crosses outward from the sensor
    pub media: MediumStack,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clip_enabled: false,
            clip_min_mm: DEFAULT_CLIP_MIN_MM,
            clip_max_mm: DEFAULT_CLIP_MAX_MM,
            median_mode: MedianMode::default(),
            median_window_w: DEFAULT_MEDIAN_WINDOW,
            median_window_h: DEFAULT_MEDIAN_WINDOW,
            lens_undistort_enabled: false,
            refraction_enabled: false,
            media: MediumStack::underwater_housing(),
        }
    }
}

impl PipelineConfig {
    /// Settings for a full underwater capture run: clip, fast median,
    /// lens undistortion, and refraction correction all enabled.
    pub fn underwater() -> Self {
        Self {
            clip_enabled: true,
            median_mode: MedianMode::Fast,
            lens_undistort_enabled: true,
            refraction_enabled: true,
            ..Self::default()
        }
    }
}
