// SPDX-License-Identifier: GPL-3.0-only

//! Sort-based windowed median filter
//!
//! The reference implementation: for every output pixel, gather the full
//! window (edge-replicated at the borders), sort it, and take the middle
//! element. O(W*H*k*log k) for window area k, but trivially parallel and
//! obviously correct - [`crate::filters::median_fast`] is tested against it.

use rayon::prelude::*;

use super::validate_window;
use crate::errors::FilterError;
use crate::frame::DepthFrame;

/// Remove salt-and-pepper noise with a `window_w` x `window_h` median.
///
/// The output pixel at `(r, c)` is the element of one-based rank
/// `(area + 1) / 2` of the clamped neighborhood centered there. The input
/// buffer is never written; rows of the fresh output buffer are filled on
/// worker threads.
pub fn denoise_sort(
    frame: &DepthFrame,
    window_w: usize,
    window_h: usize,
) -> Result<DepthFrame, FilterError> {
    validate_window(window_w, window_h, frame.width(), frame.height())?;

    let width = frame.width() as usize;
    let wx2 = (window_w / 2) as isize;
    let wy2 = (window_h / 2) as isize;
    let area = window_w * window_h;

    let mut out = DepthFrame::new(frame.width(), frame.height());
    out.samples_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out_row)| {
            let mut neighborhood = Vec::with_capacity(area);
            for (col, out_px) in out_row.iter_mut().enumerate() {
                neighborhood.clear();
                for r in row as isize - wy2..=row as isize + wy2 {
                    for c in col as isize - wx2..=col as isize + wx2 {
                        neighborhood.push(frame.sample_clamped(r, c));
                    }
                }
                neighborhood.sort_unstable();
                *out_px = neighborhood[area / 2];
            }
        });

    Ok(out)
}
