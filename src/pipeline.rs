// SPDX-License-Identifier: GPL-3.0-only

//! Correction pipeline composition
//!
//! Wires the individual stages into the per-frame flow:
//! clip -> lens undistort -> median (sort or fast) -> refraction.
//! Every stage is independently switchable through [`PipelineConfig`];
//! stages consume and produce full frames of the configured geometry, so
//! any subset composes. The pipeline holds no frame state across calls -
//! only the angle tables and medium stack, which are rebuilt when a new
//! pipeline is configured.

use std::time::Instant;

use tracing::debug;

use crate::config::{MedianMode, PipelineConfig};
use crate::errors::{PipelineError, PipelineResult};
use crate::filters::{clip, median_fast, median_sort, validate_window};
use crate::frame::DepthFrame;
use crate::optics::refraction::{CorrectionReport, MediumStack, RefractionCorrector};
use crate::optics::undistort;

/// Output of one pipeline pass
#[derive(Debug, Clone)]
pub struct Processed {
    /// The corrected depth frame
    pub frame: DepthFrame,
    /// Refraction-stage accounting; `None` when the stage is disabled
    pub report: Option<CorrectionReport>,
}

/// A configured correction pipeline for one frame geometry.
///
/// Construction validates the configuration and precomputes the refraction
/// angle tables; [`CorrectionPipeline::process`] then rejects frames whose
/// dimensions differ from the configured geometry.
pub struct CorrectionPipeline {
    width: u32,
    height: u32,
    config: PipelineConfig,
    refraction: Option<RefractionCorrector>,
}

impl CorrectionPipeline {
    pub fn new(width: u32, height: u32, config: PipelineConfig) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::Config(format!(
                "frame geometry {}x{} is empty",
                width, height
            )));
        }
        if config.clip_enabled && config.clip_min_mm > config.clip_max_mm {
            return Err(PipelineError::Config(format!(
                "clip range [{}, {}] is inverted",
                config.clip_min_mm, config.clip_max_mm
            )));
        }
        if config.median_mode != MedianMode::None {
            validate_window(config.median_window_w, config.median_window_h, width, height)?;
        }

        let refraction = if config.refraction_enabled {
            Some(RefractionCorrector::with_sensor_fov(
                width,
                height,
                config.media.clone(),
            )?)
        } else {
            None
        };

        Ok(Self {
            width,
            height,
            config,
            refraction,
        })
    }

    /// Pipeline for the reference 512x424 depth stream
    pub fn with_sensor_geometry(config: PipelineConfig) -> PipelineResult<Self> {
        Self::new(
            crate::constants::RAW_DEPTH_WIDTH,
            crate::constants::RAW_DEPTH_HEIGHT,
            config,
        )
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The configured medium stack
    pub fn media(&self) -> &MediumStack {
        &self.config.media
    }

    /// Run every enabled stage over one raw depth frame.
    ///
    /// The input is only read; each enabled stage allocates a fresh output
    /// buffer. Disabled stages cost nothing beyond the final clone when no
    /// stage ran at all.
    pub fn process(&self, frame: &DepthFrame) -> PipelineResult<Processed> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(PipelineError::DimensionMismatch {
                expected: (self.width, self.height),
                actual: frame.dimensions(),
            });
        }

        let started = Instant::now();
        let mut current: Option<DepthFrame> = None;

        if self.config.clip_enabled {
            let input = current.as_ref().unwrap_or(frame);
            current = Some(clip::clip(
                input,
                self.config.clip_min_mm,
                self.config.clip_max_mm,
            ));
            debug!(
                min_mm = self.config.clip_min_mm,
                max_mm = self.config.clip_max_mm,
                "clipped depth range"
            );
        }

        if self.config.lens_undistort_enabled {
            let input = current.as_ref().unwrap_or(frame);
            current = Some(undistort::undistort_depth(input));
            debug!("applied lens undistortion");
        }

        match self.config.median_mode {
            MedianMode::None => {}
            MedianMode::Sort => {
                let input = current.as_ref().unwrap_or(frame);
                current = Some(median_sort::denoise_sort(
                    input,
                    self.config.median_window_w,
                    self.config.median_window_h,
                )?);
                debug!(
                    window_w = self.config.median_window_w,
                    window_h = self.config.median_window_h,
                    "applied sort median filter"
                );
            }
            MedianMode::Fast => {
                let input = current.as_ref().unwrap_or(frame);
                current = Some(median_fast::denoise_fast(
                    input,
                    self.config.median_window_w,
                    self.config.median_window_h,
                )?);
                debug!(
                    window_w = self.config.median_window_w,
                    window_h = self.config.median_window_h,
                    "applied fast median filter"
                );
            }
        }

        let mut report = None;
        if let Some(corrector) = &self.refraction {
            let input = current.as_ref().unwrap_or(frame);
            let (corrected, stage_report) = corrector.correct(input)?;
            current = Some(corrected);
            report = Some(stage_report);
        }

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frame corrected"
        );

        Ok(Processed {
            frame: current.unwrap_or_else(|| frame.clone()),
            report,
        })
    }
}
