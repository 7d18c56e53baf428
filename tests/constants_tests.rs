// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the sensor and optics constants

use uwdepth::constants::*;

#[test]
fn test_reference_geometry() {
    assert_eq!(RAW_DEPTH_WIDTH, 512);
    assert_eq!(RAW_DEPTH_HEIGHT, 424);
}

#[test]
fn test_field_of_view_is_physical() {
    // both FOVs are positive and below a half turn
    assert!(HORIZONTAL_FOV_RAD > 0.0 && HORIZONTAL_FOV_RAD < std::f64::consts::PI);
    assert!(VERTICAL_FOV_RAD > 0.0 && VERTICAL_FOV_RAD < std::f64::consts::PI);
    // the sensor is wider than it is tall
    assert!(HORIZONTAL_FOV_RAD > VERTICAL_FOV_RAD);
}

#[test]
fn test_refractive_indices_ordered_for_the_housing() {
    // light leaves the sensor through ever denser media until the window,
    // then exits into water: n_air < n_water < n_acrylic
    assert!(N_AIR > 1.0);
    assert!(N_AIR < N_WATER);
    assert!(N_WATER < N_ACRYLIC);
}

#[test]
fn test_default_clip_range_within_valid_depth() {
    assert!(DEFAULT_CLIP_MIN_MM > DEPTH_INVALID_MM);
    assert!(DEFAULT_CLIP_MAX_MM > DEFAULT_CLIP_MIN_MM);
    assert!(DEFAULT_CLIP_MAX_MM <= DEPTH_MAX_VALID_MM);
}

#[test]
fn test_default_median_window_is_odd() {
    assert_eq!(DEFAULT_MEDIAN_WINDOW % 2, 1);
}
