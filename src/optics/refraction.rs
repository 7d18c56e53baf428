// SPDX-License-Identifier: GPL-3.0-only

//! Refraction and time-of-flight recalibration
//!
//! The sensor measures distance from light travel time, calibrated for air.
//! Inside the housing each ray crosses the sensor-side air gap, the acrylic
//! window, and the surrounding water; every interface bends the ray
//! (Snell's law) and every medium changes the propagation speed. This
//! module rebuilds the true ray geometry per pixel:
//!
//! 1. incident angles from the fixed field of view ([`AngleField`]),
//! 2. refracted angles chained through the [`MediumStack`],
//! 3. transit times of the bounded layers subtracted from the measured
//!    time-of-flight, the remainder converted at water speed,
//! 4. the recovered distance stretched by `1/cos` of the exit angles.
//!
//! Pixels whose refraction has no real solution (total internal reflection)
//! are invalidated to 0 and counted in the [`CorrectionReport`]; they never
//! fail the frame.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{
    ACRYLIC_THICKNESS_MM, AIR_GAP_MM, C_VACUUM_MM_S, N_ACRYLIC, N_AIR, N_WATER,
};
use crate::errors::{OpticsError, PipelineError};
use crate::frame::DepthFrame;

/// One layer the ray crosses on its way out of the housing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    /// Refractive index of the material
    pub refractive_index: f64,
    /// Layer thickness along the optical axis in millimeters.
    ///
    /// Ignored for the final (immersion) medium, which is unbounded.
    pub thickness_mm: f64,
}

impl Medium {
    /// Propagation speed inside the medium, mm/s
    pub fn speed_mm_s(&self) -> f64 {
        C_VACUUM_MM_S / self.refractive_index
    }
}

/// Ordered layers outward from the sensor: the sensor-side gap first, the
/// immersion medium last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediumStack {
    media: Vec<Medium>,
}

impl MediumStack {
    /// Build a validated stack
    pub fn new(media: Vec<Medium>) -> Result<Self, OpticsError> {
        let stack = Self { media };
        stack.validate()?;
        Ok(stack)
    }

    /// The designed housing: air gap, acrylic window, open water
    pub fn underwater_housing() -> Self {
        Self {
            media: vec![
                Medium {
                    refractive_index: N_AIR,
                    thickness_mm: AIR_GAP_MM,
                },
                Medium {
                    refractive_index: N_ACRYLIC,
                    thickness_mm: ACRYLIC_THICKNESS_MM,
                },
                Medium {
                    refractive_index: N_WATER,
                    thickness_mm: 0.0,
                },
            ],
        }
    }

    /// Check stack shape and physical plausibility.
    ///
    /// Deserialized stacks are unchecked until the corrector is built, so
    /// this runs again at construction time.
    pub fn validate(&self) -> Result<(), OpticsError> {
        if self.media.len() < 2 {
            return Err(OpticsError::MediumStackTooShort(self.media.len()));
        }
        for medium in &self.media {
            if !(medium.refractive_index > 0.0) {
                return Err(OpticsError::InvalidRefractiveIndex(format!(
                    "{} is not a positive index",
                    medium.refractive_index
                )));
            }
        }
        for medium in self.bounded() {
            if !(medium.thickness_mm >= 0.0) {
                return Err(OpticsError::InvalidThickness(format!(
                    "{} mm is not a valid layer thickness",
                    medium.thickness_mm
                )));
            }
        }
        Ok(())
    }

    pub fn media(&self) -> &[Medium] {
        &self.media
    }

    /// All layers with a finite thickness (every layer but the last)
    pub fn bounded(&self) -> &[Medium] {
        &self.media[..self.media.len() - 1]
    }

    /// The unbounded final medium the target sits in
    pub fn immersion(&self) -> &Medium {
        self.media.last().expect("validated stack is non-empty")
    }

    /// The medium the sensor itself sits in (its ToF calibration medium)
    pub fn sensor_side(&self) -> &Medium {
        &self.media[0]
    }

    /// Total one-way transit time through the bounded layers, seconds
    fn bounded_transit_s(&self) -> f64 {
        self.bounded()
            .iter()
            .map(|m| m.thickness_mm / m.speed_mm_s())
            .sum()
    }
}

/// Snell's law applied independently per axis.
///
/// Returns NaN components when `(n_from / n_to) * sin(angle)` leaves the
/// [-1, 1] domain (total internal reflection).
pub fn refract(theta: f64, phi: f64, n_from: f64, n_to: f64) -> (f64, f64) {
    let ratio = n_from / n_to;
    ((ratio * theta.sin()).asin(), (ratio * phi.sin()).asin())
}

/// Per-pixel incident ray angles from the sensor's optical axis.
///
/// `theta` varies only with the column and `phi` only with the row, so the
/// field stores one value per column and per row; [`AngleField::angles`]
/// presents the full W x H grid. Built once per pipeline geometry, never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct AngleField {
    width: u32,
    height: u32,
    theta: Vec<f64>,
    phi: Vec<f64>,
}

impl AngleField {
    pub fn new(width: u32, height: u32, hfov_rad: f64, vfov_rad: f64) -> Self {
        Self {
            width,
            height,
            theta: Self::axis_angles(width, hfov_rad),
            phi: Self::axis_angles(height, vfov_rad),
        }
    }

    /// Angles of `n` pixels spanning `fov`.
    ///
    /// On even grids the optical axis falls between the two center pixels:
    /// the `n + 1` grid points spanning [-fov/2, fov/2] contain an exact 0
    /// at index n/2, which no pixel gets - the points on either side of it
    /// land on the center pixel pair instead. Odd grids have no grid point
    /// on the axis to begin with.
    fn axis_angles(n: u32, fov: f64) -> Vec<f64> {
        let count = n as usize;
        let resolution = fov / count as f64;
        let half = fov / 2.0;
        (0..count)
            .map(|i| {
                let k = if count % 2 == 0 && i >= count / 2 {
                    i + 1
                } else {
                    i
                };
                -half + k as f64 * resolution
            })
            .collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Horizontal angle of a column
    pub fn theta(&self, col: u32) -> f64 {
        self.theta[col as usize]
    }

    /// Vertical angle of a row
    pub fn phi(&self, row: u32) -> f64 {
        self.phi[row as usize]
    }

    /// (theta, phi) of the pixel at (row, col)
    pub fn angles(&self, row: u32, col: u32) -> (f64, f64) {
        (self.theta[col as usize], self.phi[row as usize])
    }
}

/// Per-frame accounting of the refraction stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionReport {
    /// Pixels in the frame
    pub total_pixels: usize,
    /// Pixels invalidated by total internal reflection
    pub invalid_pixels: usize,
    /// Mean signed depth change (corrected - measured) over pixels that
    /// carried a measurement and survived correction, millimeters
    pub mean_shift_mm: f64,
}

impl CorrectionReport {
    /// Invalidated fraction of the frame, 0.0 to 1.0
    pub fn invalid_fraction(&self) -> f64 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        self.invalid_pixels as f64 / self.total_pixels as f64
    }
}

/// Refraction and ToF depth corrector for one pipeline geometry.
///
/// Construction validates the medium stack, builds the [`AngleField`], and
/// chains the refracted angles through every interface; per-frame work is
/// pure arithmetic over those per-axis tables.
pub struct RefractionCorrector {
    media: MediumStack,
    angles: AngleField,
    /// Refracted horizontal angles per column, one table per medium
    /// (index 0 = incident angles in the sensor-side gap)
    theta_layers: Vec<Vec<f64>>,
    /// Refracted vertical angles per row, one table per medium
    phi_layers: Vec<Vec<f64>>,
}

impl RefractionCorrector {
    pub fn new(
        width: u32,
        height: u32,
        hfov_rad: f64,
        vfov_rad: f64,
        media: MediumStack,
    ) -> Result<Self, OpticsError> {
        media.validate()?;
        let angles = AngleField::new(width, height, hfov_rad, vfov_rad);

        let mut theta_layers = vec![(0..width).map(|c| angles.theta(c)).collect::<Vec<_>>()];
        let mut phi_layers = vec![(0..height).map(|r| angles.phi(r)).collect::<Vec<_>>()];
        for pair in media.media().windows(2) {
            let (n_from, n_to) = (pair[0].refractive_index, pair[1].refractive_index);
            let prev_theta = theta_layers.last().expect("seeded with incident angles");
            let prev_phi = phi_layers.last().expect("seeded with incident angles");
            let next_theta = prev_theta
                .iter()
                .map(|&t| (n_from / n_to * t.sin()).asin())
                .collect::<Vec<_>>();
            let next_phi = prev_phi
                .iter()
                .map(|&p| (n_from / n_to * p.sin()).asin())
                .collect::<Vec<_>>();
            theta_layers.push(next_theta);
            phi_layers.push(next_phi);
        }

        debug!(
            width,
            height,
            layers = media.media().len(),
            "built refraction angle tables"
        );

        Ok(Self {
            media,
            angles,
            theta_layers,
            phi_layers,
        })
    }

    /// Corrector for the reference sensor field of view
    pub fn with_sensor_fov(
        width: u32,
        height: u32,
        media: MediumStack,
    ) -> Result<Self, OpticsError> {
        Self::new(
            width,
            height,
            crate::constants::HORIZONTAL_FOV_RAD,
            crate::constants::VERTICAL_FOV_RAD,
            media,
        )
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.angles.width(), self.angles.height())
    }

    /// The incident-ray angle field
    pub fn angle_field(&self) -> &AngleField {
        &self.angles
    }

    pub fn media(&self) -> &MediumStack {
        &self.media
    }

    /// Distance the measured time-of-flight leaves for the immersion
    /// medium, after paying the bounded layers' transit times.
    ///
    /// Negative when the measurement is shorter than the housing path
    /// itself (a dropout or near reflection).
    fn immersion_distance_mm(&self, depth_mm: f64) -> f64 {
        let t_total = depth_mm / self.media.sensor_side().speed_mm_s();
        let t_immersion = t_total - self.media.bounded_transit_s();
        t_immersion * self.media.immersion().speed_mm_s()
    }

    /// Ray path lengths of a depth sample inside the medium at `layer`
    /// (an index into the stack; 1 = housing window, last = immersion).
    ///
    /// Bounded layers use their fixed thickness; the immersion layer uses
    /// the ToF-recalibrated remainder. `rzx` is the in-layer length
    /// projected through the horizontal exit angle, `rzy` additionally
    /// through the vertical one.
    pub fn ray_length(&self, depth_mm: f64, row: u32, col: u32, layer: usize) -> (f64, f64) {
        let theta = self.theta_layers[layer][col as usize];
        let phi = self.phi_layers[layer][row as usize];
        let distance = if layer == self.media.media().len() - 1 {
            self.immersion_distance_mm(depth_mm)
        } else {
            self.media.media()[layer].thickness_mm
        };
        let rzx = distance / theta.cos();
        let rzy = rzx / phi.cos();
        (rzx, rzy)
    }

    /// Correct a depth frame for refraction and medium propagation speed.
    ///
    /// Every pixel is recomputed independently; total-internal-reflection
    /// pixels become 0 and are counted in the report instead of failing
    /// the frame.
    pub fn correct(&self, frame: &DepthFrame) -> Result<(DepthFrame, CorrectionReport), PipelineError> {
        if frame.dimensions() != self.dimensions() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimensions(),
                actual: frame.dimensions(),
            });
        }

        let width = frame.width() as usize;
        let immersion = self.media.media().len() - 1;
        let theta_exit = &self.theta_layers[immersion];
        let phi_exit = &self.phi_layers[immersion];
        let samples = frame.samples();

        let mut out = DepthFrame::new(frame.width(), frame.height());
        let (invalid_pixels, shift_sum, measured) = out
            .samples_mut()
            .par_chunks_mut(width)
            .enumerate()
            .map(|(row, out_row)| {
                let cos_phi = phi_exit[row].cos();
                let mut invalid = 0usize;
                let mut shift = 0.0f64;
                let mut measured = 0usize;
                for (col, out_px) in out_row.iter_mut().enumerate() {
                    let depth = samples[row * width + col] as f64;
                    let rzx = self.immersion_distance_mm(depth) / theta_exit[col].cos();
                    let rzy = rzx / cos_phi;
                    if rzy.is_nan() {
                        invalid += 1;
                        *out_px = 0;
                    } else {
                        *out_px = rzy.round().clamp(0.0, u16::MAX as f64) as u16;
                        if depth > 0.0 {
                            shift += rzy - depth;
                            measured += 1;
                        }
                    }
                }
                (invalid, shift, measured)
            })
            .reduce(
                || (0, 0.0, 0),
                |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2),
            );

        let report = CorrectionReport {
            total_pixels: frame.pixel_count(),
            invalid_pixels,
            mean_shift_mm: if measured > 0 {
                shift_sum / measured as f64
            } else {
                0.0
            },
        };

        if report.invalid_pixels > 0 {
            warn!(
                invalid = report.invalid_pixels,
                fraction = report.invalid_fraction(),
                "total internal reflection invalidated pixels"
            );
        }

        Ok((out, report))
    }
}
