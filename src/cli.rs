// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for offline frame correction
//!
//! This module provides command-line functionality for:
//! - Running the correction pipeline over raw depth captures
//! - Undistorting color images
//! - Rendering depth frames to PNG for inspection

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use uwdepth::config::PipelineConfig;
use uwdepth::frame::{ColorFrame, DepthFrame};
use uwdepth::optics::undistort;
use uwdepth::pipeline::CorrectionPipeline;
use uwdepth::visualization::{RenderOptions, depth_to_rgba};

/// Default output path next to the input: `<stem>_<timestamp>.<ext>`
fn timestamped_output(input: &Path, stem: &str, ext: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let name = format!("{}_{}.{}", stem, timestamp, ext);
    input.with_file_name(name)
}

/// Load a pipeline configuration from JSON, or the defaults
fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let file = fs::File::open(path)
                .map_err(|e| format!("cannot open config {}: {}", path.display(), e))?;
            Ok(serde_json::from_reader(file)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Read a raw little-endian 16-bit depth capture
fn load_depth_frame(path: &Path, width: u32, height: u32) -> Result<DepthFrame, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    DepthFrame::from_le_bytes(width, height, &bytes).ok_or_else(|| {
        format!(
            "{} holds {} bytes; a {}x{} frame needs {}",
            path.display(),
            bytes.len(),
            width,
            height,
            (width * height * 2) as usize
        )
        .into()
    })
}

/// Write a depth frame as a PNG via the visualization renderer
fn save_depth_png(
    frame: &DepthFrame,
    options: &RenderOptions,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let rgba = depth_to_rgba(frame, options);
    let img = image::RgbaImage::from_raw(frame.width(), frame.height(), rgba)
        .expect("renderer output matches frame dimensions");
    img.save(path)?;
    Ok(())
}

/// Run the correction pipeline over one raw depth capture
pub fn process_frame(
    input: PathBuf,
    width: u32,
    height: u32,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    png: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path.as_deref())?;
    let pipeline = CorrectionPipeline::new(width, height, config)?;
    let frame = load_depth_frame(&input, width, height)?;

    let processed = pipeline.process(&frame)?;

    let output = output.unwrap_or_else(|| timestamped_output(&input, "corrected", "bin"));
    fs::write(&output, processed.frame.to_le_bytes())?;
    info!(path = %output.display(), "wrote corrected frame");
    println!("Corrected frame written to {}", output.display());

    if let Some(png) = png {
        save_depth_png(&processed.frame, &RenderOptions::housing_range(), &png)?;
        println!("Visualization written to {}", png.display());
    }

    if let Some(report) = processed.report {
        println!(
            "Refraction: {} of {} pixels invalidated ({:.2}%), mean depth shift {:+.1} mm",
            report.invalid_pixels,
            report.total_pixels,
            report.invalid_fraction() * 100.0,
            report.mean_shift_mm
        );
    }

    Ok(())
}

/// Undistort a color image with the sine-warp barrel/pincushion remap
pub fn undistort_image(
    input: PathBuf,
    factor: f64,
    autocrop: bool,
    background: String,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let background = u32::from_str_radix(background.trim_start_matches("0x"), 16)
        .map_err(|e| format!("background must be packed BGRA hex (e.g. FF000000): {}", e))?;

    let img = image::open(&input)?.to_rgba8();
    let (width, height) = img.dimensions();

    // RGBA file bytes -> packed BGRA samples
    let samples: Vec<u32> = img
        .as_raw()
        .chunks_exact(4)
        .map(|px| u32::from_le_bytes([px[2], px[1], px[0], px[3]]))
        .collect();
    let frame = ColorFrame::from_samples(width, height, samples).expect("decoded image size");

    let corrected = undistort::undistort_color(&frame, (width, height), factor, autocrop, background);

    // packed BGRA samples -> RGBA file bytes
    let rgba: Vec<u8> = corrected
        .samples()
        .iter()
        .flat_map(|&px| {
            let [b, g, r, a] = px.to_le_bytes();
            [r, g, b, a]
        })
        .collect();
    let out_img =
        image::RgbaImage::from_raw(width, height, rgba).expect("undistortion preserves size");

    let output = output.unwrap_or_else(|| timestamped_output(&input, "undistorted", "png"));
    out_img.save(&output)?;
    println!("Undistorted image written to {}", output.display());

    Ok(())
}

/// Render a raw depth capture to PNG
pub fn visualize_frame(
    input: PathBuf,
    width: u32,
    height: u32,
    grayscale: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let frame = load_depth_frame(&input, width, height)?;

    let options = if grayscale {
        RenderOptions::auto_range()
    } else {
        RenderOptions::housing_range()
    };

    let output = output.unwrap_or_else(|| timestamped_output(&input, "depth", "png"));
    save_depth_png(&frame, &options, &output)?;
    println!("Depth visualization written to {}", output.display());

    Ok(())
}

/// Print the default pipeline configuration as JSON
pub fn print_default_config() -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(&PipelineConfig::default())?);
    Ok(())
}
