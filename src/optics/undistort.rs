// SPDX-License-Identifier: GPL-3.0-only

//! Radial lens undistortion
//!
//! Two remap variants with deliberately different mapping directions:
//!
//! - [`undistort_color`] warps forward: every source pixel is pushed to a
//!   computed destination, uncovered destinations keep the background color.
//! - [`undistort_depth`] maps backward: every destination pixel pulls its
//!   nearest source sample through a cubic radial polynomial.
//!
//! The two are not numerically interchangeable; the color path favors a
//! viewable image while the depth path must not invent samples that the
//! sensor never measured.

use std::f64::consts::PI;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use rayon::prelude::*;
use tracing::debug;

use crate::constants::undistort::{PARAM_A, PARAM_B, PARAM_C, PARAM_D};
use crate::frame::{ColorFrame, DepthFrame};

/// Bicubic resample of a packed BGRA frame.
///
/// The resampler is channel-order agnostic, so the BGRA bytes ride through
/// the RGBA container untouched.
fn resample(frame: &ColorFrame, width: u32, height: u32) -> ColorFrame {
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }
    let img = RgbaImage::from_raw(frame.width(), frame.height(), frame.as_bytes().to_vec())
        .expect("frame buffer length matches dimensions");
    let resized = imageops::resize(&img, width, height, FilterType::CatmullRom);
    ColorFrame::from_bytes(width, height, resized.as_raw()).expect("resize output length")
}

/// Maximum warp amplitude that keeps the half-sine sweep inside the frame,
/// scaled by the user factor clamped to [-1, 1].
fn max_amplitude(height: u32, factor: f64) -> f64 {
    let half = height as f64 / 2.0;
    let mut amp = 0.0;
    for a in 0..height {
        let y = half - amp;
        if y < 0.0 || y > height as f64 {
            break;
        }
        amp = a as f64;
    }
    (amp - 2.0) * factor.clamp(-1.0, 1.0)
}

/// Forward-warped destination of the working-canvas pixel `(x, y)`.
fn warp_point(
    x: usize,
    y: usize,
    width: u32,
    height: u32,
    amplitude: f64,
    inverse: bool,
) -> (i64, i64) {
    let w = width as f64;
    let h = height as f64;

    let ang_x = PI * x as f64 / w;
    let ca_x = amplitude * ((h / 2.0 - y as f64) / (h / 2.0));
    let ang_y = PI * y as f64 / h;
    let ca_y = amplitude * ((w / 2.0 - x as f64) / (w / 2.0));

    // Negative factors pull instead of push: quarter-turn phase shift,
    // sin(-pi/2) = -1
    let (a_x, a_y) = if inverse { (-ca_x, -ca_y) } else { (0.0, 0.0) };

    let py = (y as f64 + a_x + ca_x * ang_x.sin()) as i64;
    let px = (x as f64 + a_y + ca_y * ang_y.sin()) as i64;
    (px, py)
}

/// Correct barrel/pincushion distortion in a color frame.
///
/// The frame is bicubic-resampled onto a `working` canvas, forward-warped
/// there, then scaled back to the source dimensions. `factor` in [-1, 1]
/// selects barrel (positive) or pincushion (negative) correction strength;
/// values outside the range are clamped. Destinations no source pixel lands
/// on keep the packed BGRA `background` color; warped positions outside the
/// canvas are discarded.
///
/// With `autocrop`, the span the center row and column map to (for
/// `factor >= 0`) or the warped corner-to-corner span (for `factor < 0`) is
/// tracked during the warp and the result is cropped to it before the final
/// rescale.
pub fn undistort_color(
    frame: &ColorFrame,
    working: (u32, u32),
    factor: f64,
    autocrop: bool,
    background: u32,
) -> ColorFrame {
    let (work_w, work_h) = working;
    let canvas = resample(frame, work_w, work_h);
    let amplitude = max_amplitude(work_h, factor);
    let inverse = factor < 0.0;

    let w = work_w as usize;
    let h = work_h as usize;
    let mut dst = ColorFrame::filled(work_w, work_h, background);

    // Crop box tracked while warping
    let mut x1 = work_w as i64;
    let mut y1 = work_h as i64;
    let mut x2 = 0i64;
    let mut y2 = 0i64;

    for y in 0..h {
        for x in 0..w {
            let (px, py) = warp_point(x, y, work_w, work_h, amplitude, inverse);

            if !inverse {
                if x == w / 2 {
                    y1 = y1.min(py);
                    y2 = y2.max(py);
                }
                if y == h / 2 {
                    x1 = x1.min(px);
                    x2 = x2.max(px);
                }
            } else {
                if x == 1 && y == 1 {
                    x1 = px;
                    y1 = py;
                }
                if x == w - 1 && y == h - 1 {
                    x2 = px;
                    y2 = py;
                }
            }

            if px >= 0 && py >= 0 && (px as usize) < w && (py as usize) < h {
                dst.samples_mut()[py as usize * w + px as usize] = canvas.samples()[y * w + x];
            }
        }
    }

    // Clamp the tracked box to the canvas; warped extremes may overshoot
    x1 = x1.max(0);
    y1 = y1.max(0);
    x2 = x2.min(work_w as i64);
    y2 = y2.min(work_h as i64);

    let crop = autocrop
        && x2 > x1
        && y2 > y1
        && (x1 > 0 || y1 > 0 || x2 < work_w as i64 || y2 < work_h as i64);

    let result = if crop {
        debug!(x1, y1, x2, y2, "cropping undistorted canvas");
        let crop_w = (x2 - x1) as usize;
        let crop_h = (y2 - y1) as usize;
        let mut cropped = Vec::with_capacity(crop_w * crop_h);
        for row in y1 as usize..y2 as usize {
            let start = row * w + x1 as usize;
            cropped.extend_from_slice(&dst.samples()[start..start + crop_w]);
        }
        ColorFrame::from_samples(crop_w as u32, crop_h as u32, cropped)
            .expect("crop box within canvas")
    } else {
        dst
    };

    resample(&result, frame.width(), frame.height())
}

/// Correct radial lens distortion in a depth frame with the calibrated
/// cubic coefficients.
pub fn undistort_depth(frame: &DepthFrame) -> DepthFrame {
    undistort_depth_with(frame, [PARAM_A, PARAM_B, PARAM_C, PARAM_D])
}

/// Backward radial remap with explicit coefficients `[A, B, C, D]`.
///
/// For each destination pixel the normalized center distance `r` maps to a
/// source distance `src_r = (A*r^3 + B*r^2 + C*r + D) * r`; the source is
/// sampled nearest-neighbor. Destinations whose source falls outside the
/// frame stay 0. `[0, 0, 0, 1]` is the exact identity.
pub fn undistort_depth_with(frame: &DepthFrame, coefficients: [f64; 4]) -> DepthFrame {
    let [a, b, c, d] = coefficients;
    let w = frame.width() as usize;
    let h = frame.height() as usize;
    // Normalization radius: half the shorter frame dimension, in whole pixels
    let radius = (frame.width().min(frame.height()) / 2) as f64;
    let center_x = frame.width() as f64 / 2.0;
    let center_y = frame.height() as f64 / 2.0;
    let samples = frame.samples();

    let mut out = DepthFrame::new(frame.width(), frame.height());
    out.samples_mut()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, out_row)| {
            let delta_y = (y as f64 - center_y) / radius;
            for (x, out_px) in out_row.iter_mut().enumerate() {
                let delta_x = (x as f64 - center_x) / radius;
                let dst_r = (delta_x * delta_x + delta_y * delta_y).sqrt();
                let src_r = (a * dst_r.powi(3) + b * dst_r.powi(2) + c * dst_r + d) * dst_r;

                // The exact center maps to itself; 0/0 carries no scale
                let scale = if src_r == 0.0 {
                    1.0
                } else {
                    (dst_r / src_r).abs()
                };

                let src_x = (center_x + delta_x * scale * radius).round() as i64;
                let src_y = (center_y + delta_y * scale * radius).round() as i64;
                if src_x >= 0 && src_y >= 0 && (src_x as usize) < w && (src_y as usize) < h {
                    *out_px = samples[src_y as usize * w + src_x as usize];
                }
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_identity_coefficients() {
        let samples: Vec<u16> = (0..512u16).collect();
        let frame = DepthFrame::from_samples(32, 16, samples.clone()).unwrap();
        let out = undistort_depth_with(&frame, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(out.samples(), samples.as_slice());
    }

    #[test]
    fn test_depth_linear_scale_pulls_from_double_offset() {
        // D = 0.5 makes the scale factor 2: destination (cx + k) samples
        // source (cx + 2k)
        let samples: Vec<u16> = (0..64u16).collect();
        let frame = DepthFrame::from_samples(8, 8, samples).unwrap();
        let out = undistort_depth_with(&frame, [0.0, 0.0, 0.0, 0.5]);
        // destination (5, 4): delta from center (4, 4) is (1, 0) -> source (6, 4)
        assert_eq!(out.samples()[4 * 8 + 5], frame.samples()[4 * 8 + 6]);
        // destination (4, 3): delta (0, -1) -> source (4, 2)
        assert_eq!(out.samples()[3 * 8 + 4], frame.samples()[2 * 8 + 4]);
    }

    #[test]
    fn test_depth_out_of_bounds_source_stays_zero() {
        // D = 2 pushes sources outside the frame for most destinations
        let frame = DepthFrame::from_samples(8, 8, vec![500; 64]).unwrap();
        let out = undistort_depth_with(&frame, [0.0, 0.0, 0.0, 2.0]);
        // corner destination: delta (-4, -4)/4 -> |r|*scale maps far outside
        assert_eq!(out.samples()[0], 0);
    }

    #[test]
    fn test_depth_center_pixel_survives_real_coefficients() {
        let mut frame = DepthFrame::new(16, 16);
        frame.samples_mut()[8 * 16 + 8] = 1234;
        let out = undistort_depth(&frame);
        assert_eq!(out.samples()[8 * 16 + 8], 1234);
    }

    #[test]
    fn test_color_zero_factor_preserves_content() {
        // factor 0 means zero amplitude: the warp is the identity move,
        // so a same-size working canvas returns the input unchanged
        let samples: Vec<u32> = (0..64u32).map(|v| 0xFF00_0000 | v).collect();
        let frame = ColorFrame::from_samples(8, 8, samples.clone()).unwrap();
        let out = undistort_color(&frame, (8, 8), 0.0, false, 0);
        assert_eq!(out.samples(), samples.as_slice());
    }

    #[test]
    fn test_color_output_keeps_source_dimensions() {
        let frame = ColorFrame::filled(20, 10, 0xFFFF_FFFF);
        let out = undistort_color(&frame, (64, 32), 0.4, true, 0xFF00_0000);
        assert_eq!(out.dimensions(), (20, 10));
    }

    #[test]
    fn test_color_background_fills_uncovered_pixels() {
        // A full-strength barrel factor pulls the center row inward; no
        // source pixel lands on the left end of the center row, which
        // keeps the background color
        let frame = ColorFrame::filled(16, 16, 0xFFAA_BBCC);
        let out = undistort_color(&frame, (16, 16), 1.0, false, 0x1122_3344);
        assert_eq!(out.samples()[8 * 16], 0x1122_3344);
    }

    #[test]
    fn test_amplitude_clamps_factor() {
        assert_eq!(max_amplitude(100, 5.0), max_amplitude(100, 1.0));
        assert_eq!(max_amplitude(100, -5.0), max_amplitude(100, -1.0));
    }
}
