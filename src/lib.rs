// SPDX-License-Identifier: GPL-3.0-only

//! uwdepth - depth correction for time-of-flight cameras in underwater housings
//!
//! Raw depth frames captured through a refractive housing are geometrically
//! and radiometrically wrong: the lens distorts radially, salt-and-pepper
//! dropouts pollute the data, and light crossing air, acrylic, and water
//! bends and slows, so the sensor's time-of-flight distances are measured in
//! the wrong medium. This crate corrects all of that on the CPU before the
//! frames reach a 3D reconstruction engine.
//!
//! # Architecture
//!
//! - [`frame`]: depth and color frame buffer types
//! - [`filters`]: depth clipping and the two windowed median filters
//! - [`optics`]: radial lens undistortion, refraction and ToF recalibration
//! - [`pipeline`]: stage composition driven by [`config::PipelineConfig`]
//! - [`visualization`]: depth-to-RGBA rendering for inspection output
//! - [`config`]: pipeline configuration handling
//!
//! # Example
//!
//! ```
//! use uwdepth::{CorrectionPipeline, DepthFrame, PipelineConfig};
//!
//! let pipeline = CorrectionPipeline::new(64, 48, PipelineConfig::underwater()).unwrap();
//! let raw = DepthFrame::from_samples(64, 48, vec![700; 64 * 48]).unwrap();
//! let processed = pipeline.process(&raw).unwrap();
//! assert_eq!(processed.frame.dimensions(), (64, 48));
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod frame;
pub mod optics;
pub mod pipeline;
pub mod visualization;

// Re-export commonly used types
pub use config::{MedianMode, PipelineConfig};
pub use errors::{FilterError, OpticsError, PipelineError, PipelineResult};
pub use frame::{ColorFrame, DepthFrame};
pub use optics::refraction::{CorrectionReport, Medium, MediumStack};
pub use pipeline::{CorrectionPipeline, Processed};
