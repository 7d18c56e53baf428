// SPDX-License-Identifier: GPL-3.0-only

//! Depth frame denoising filters
//!
//! Two windowed median implementations share one window policy and one
//! edge-replicate boundary rule:
//!
//! - [`median_sort::denoise_sort`]: gather, sort, pick - the semantic
//!   reference, trivially row-parallel.
//! - [`median_fast::denoise_fast`]: Huang's incremental histogram median,
//!   a single serpentine scan per frame.
//!
//! Both return the window sample of one-based rank `(area + 1) / 2` and are
//! bit-identical for every input accepted by [`validate_window`].

pub mod clip;
pub mod median_fast;
pub mod median_sort;

use crate::errors::FilterError;

/// Check a median window against the filter policy.
///
/// Both dimensions must be odd, at least 1, and no larger than the frame.
/// Even windows are rejected rather than given a variant-specific rounding
/// rule: the sort filter's "upper middle" element and the histogram filter's
/// rank walk only agree when the window area is odd.
pub fn validate_window(
    window_w: usize,
    window_h: usize,
    frame_w: u32,
    frame_h: u32,
) -> Result<(), FilterError> {
    let valid = |dim: usize, frame_dim: u32| dim >= 1 && dim % 2 == 1 && dim <= frame_dim as usize;
    if !valid(window_w, frame_w) || !valid(window_h, frame_h) {
        return Err(FilterError::InvalidWindowSize { window_w, window_h });
    }
    Ok(())
}
