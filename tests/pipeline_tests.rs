// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end pipeline tests at the reference sensor geometry

use uwdepth::constants::{RAW_DEPTH_HEIGHT, RAW_DEPTH_WIDTH};
use uwdepth::filters::{median_fast, median_sort};
use uwdepth::{CorrectionPipeline, DepthFrame, MedianMode, PipelineConfig};

fn pseudo_random_frame(width: u32, height: u32, ceiling: u16, seed: u32) -> DepthFrame {
    let mut state = seed;
    let samples = (0..width * height)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            ((state >> 16) as u16) % ceiling
        })
        .collect();
    DepthFrame::from_samples(width, height, samples).unwrap()
}

#[test]
fn test_median_filters_agree_at_sensor_resolution() {
    let frame = pseudo_random_frame(RAW_DEPTH_WIDTH, RAW_DEPTH_HEIGHT, 8000, 42);
    let fast = median_fast::denoise_fast(&frame, 5, 5).unwrap();
    let sort = median_sort::denoise_sort(&frame, 5, 5).unwrap();
    assert_eq!(fast.samples(), sort.samples());
}

#[test]
fn test_full_underwater_pipeline_runs() {
    let pipeline = CorrectionPipeline::with_sensor_geometry(PipelineConfig::underwater()).unwrap();

    // plausible capture: mid-range plane with dropouts and hot outliers
    let mut frame = pseudo_random_frame(RAW_DEPTH_WIDTH, RAW_DEPTH_HEIGHT, 200, 7);
    for sample in frame.samples_mut().iter_mut() {
        *sample += 600;
    }
    for i in (0..frame.pixel_count()).step_by(97) {
        frame.samples_mut()[i] = 0;
    }
    for i in (0..frame.pixel_count()).step_by(211) {
        frame.samples_mut()[i] = 7000;
    }

    let processed = pipeline.process(&frame).unwrap();

    assert_eq!(
        processed.frame.dimensions(),
        (RAW_DEPTH_WIDTH, RAW_DEPTH_HEIGHT)
    );
    let report = processed.report.expect("refraction stage was enabled");
    assert_eq!(report.total_pixels, frame.pixel_count());
    assert_eq!(report.invalid_pixels, 0);
    // water-speed recalibration contracts in-range distances
    assert!(report.mean_shift_mm < 0.0);
}

#[test]
fn test_clip_only_scenario_zeroes_constant_frame() {
    let config = PipelineConfig {
        clip_enabled: true,
        clip_min_mm: 500,
        clip_max_mm: 1000,
        ..PipelineConfig::default()
    };
    let pipeline = CorrectionPipeline::with_sensor_geometry(config).unwrap();
    let frame = DepthFrame::from_samples(
        RAW_DEPTH_WIDTH,
        RAW_DEPTH_HEIGHT,
        vec![2000; (RAW_DEPTH_WIDTH * RAW_DEPTH_HEIGHT) as usize],
    )
    .unwrap();

    let processed = pipeline.process(&frame).unwrap();
    assert!(processed.frame.samples().iter().all(|&d| d == 0));
}

#[test]
fn test_stage_order_clips_before_median() {
    // An out-of-range outlier must be zeroed before the median sees it:
    // with clipping enabled the filter smooths over a dropout, not a spike
    let mut samples = vec![700u16; 81];
    samples[40] = 5000;
    let frame = DepthFrame::from_samples(9, 9, samples).unwrap();

    let config = PipelineConfig {
        clip_enabled: true,
        clip_min_mm: 450,
        clip_max_mm: 900,
        median_mode: MedianMode::Fast,
        median_window_w: 3,
        median_window_h: 3,
        ..PipelineConfig::default()
    };
    let pipeline = CorrectionPipeline::new(9, 9, config).unwrap();
    let processed = pipeline.process(&frame).unwrap();
    assert!(processed.frame.samples().iter().all(|&d| d == 700));
}

#[test]
fn test_pipeline_rejects_wrong_geometry_frame() {
    let pipeline = CorrectionPipeline::with_sensor_geometry(PipelineConfig::default()).unwrap();
    let frame = DepthFrame::new(64, 48);
    assert!(pipeline.process(&frame).is_err());
}
