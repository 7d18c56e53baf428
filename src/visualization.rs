// SPDX-License-Identifier: GPL-3.0-only

//! Depth frame visualization
//!
//! Renders 16-bit depth buffers to RGBA for eyeballing correction results.
//! Not part of the correction math; the CLI uses it to write inspection
//! PNGs next to the corrected raw frames.

use crate::constants::{DEFAULT_CLIP_MAX_MM, DEFAULT_CLIP_MIN_MM, DEPTH_INVALID_MM};
use crate::frame::DepthFrame;

/// Depth rendering options
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Use grayscale instead of the colormap (near=bright, far=dark)
    pub grayscale: bool,
    /// Minimum depth in mm; values below are clamped
    pub min_depth_mm: u16,
    /// Maximum depth in mm; values above are clamped. 0 = auto-range
    pub max_depth_mm: u16,
    /// Sample value rendered as black
    pub invalid_value: u16,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::housing_range()
    }
}

impl RenderOptions {
    /// Options for the housed sensor's usable range
    pub fn housing_range() -> Self {
        Self {
            grayscale: false,
            min_depth_mm: DEFAULT_CLIP_MIN_MM,
            max_depth_mm: DEFAULT_CLIP_MAX_MM,
            invalid_value: DEPTH_INVALID_MM,
        }
    }

    /// Grayscale with the range detected from the frame content
    pub fn auto_range() -> Self {
        Self {
            grayscale: true,
            min_depth_mm: 0,
            max_depth_mm: 0,
            invalid_value: DEPTH_INVALID_MM,
        }
    }
}

/// Turbo colormap: perceptually uniform rainbow (blue=near, red=far)
fn turbo(t: f32) -> [u8; 3] {
    let r = (0.13572138
        + t * (4.6153926 + t * (-42.66032 + t * (132.13108 + t * (-152.54825 + t * 59.28144)))))
        .clamp(0.0, 1.0);
    let g = (0.09140261
        + t * (2.19418 + t * (4.84296 + t * (-14.18503 + t * (4.27805 + t * 2.53377)))))
        .clamp(0.0, 1.0);
    let b = (0.1066733
        + t * (12.64194 + t * (-60.58204 + t * (109.99648 + t * (-82.52904 + t * 20.43388)))))
        .clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

/// Render a depth frame to an RGBA byte buffer (4 bytes per pixel).
///
/// Invalid samples come out black; everything else is normalized into the
/// configured (or auto-detected) range and mapped through grayscale or the
/// turbo colormap.
pub fn depth_to_rgba(frame: &DepthFrame, options: &RenderOptions) -> Vec<u8> {
    let samples = frame.samples();
    let mut rgba = Vec::with_capacity(samples.len() * 4);

    // Auto-range from the data when no maximum is configured
    let (min_depth, max_depth) = if options.max_depth_mm == 0 {
        let mut min_d = u16::MAX;
        let mut max_d = 0u16;
        for &d in samples {
            if d != options.invalid_value {
                min_d = min_d.min(d);
                max_d = max_d.max(d);
            }
        }
        if max_d <= min_d {
            (0, 4000)
        } else {
            (min_d, max_d)
        }
    } else {
        (options.min_depth_mm, options.max_depth_mm)
    };

    let range = (max_depth - min_depth) as f32;

    for &d in samples {
        if d == options.invalid_value {
            rgba.extend_from_slice(&[0, 0, 0, 255]);
            continue;
        }
        let t = (d.saturating_sub(min_depth) as f32 / range).clamp(0.0, 1.0);
        if options.grayscale {
            let gray = ((1.0 - t) * 255.0) as u8;
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        } else {
            let [r, g, b] = turbo(t);
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    rgba
}
