// SPDX-License-Identifier: GPL-3.0-only

//! Huang histogram median filter
//!
//! Huang's 1981 algorithm replaces the per-pixel sort with one running
//! histogram of the current window. Sliding the window by one column swaps
//! a single column of samples in and out of the histogram, and the median
//! bucket pointer is then walked at most as far as the histogram changed -
//! amortized O(1) median maintenance per pixel.
//!
//! The scan is boustrophedon: row 0 left-to-right, row 1 right-to-left, and
//! so on. Sliding back along the next row instead of jumping to its start is
//! what keeps every step a one-column (or, at a row turn, one-row) delta.
//! The price is that histogram and median pointer carry across the entire
//! frame, so the filter is strictly sequential per frame; the parallel
//! alternative is [`crate::filters::median_sort`].

use super::validate_window;
use crate::errors::FilterError;
use crate::frame::DepthFrame;

/// One bucket per representable sample value. The valid sensor range ends at
/// 8000 mm, but a full-range histogram keeps the filter total and exactly
/// interchangeable with the sort variant on arbitrary 16-bit input.
const HIST_BUCKETS: usize = 1 << 16;

/// Running window histogram with its median bucket pointer.
///
/// Invariant between pixels: `med` is the bucket holding the sample of
/// one-based rank `middle`, and `delta_l` is the histogram mass strictly
/// below `med`.
struct WindowHistogram {
    hist: Vec<u32>,
    med: usize,
    delta_l: u32,
    middle: u32,
}

impl WindowHistogram {
    fn new(middle: u32) -> Self {
        Self {
            hist: vec![0; HIST_BUCKETS],
            med: 0,
            delta_l: 0,
            middle,
        }
    }

    fn insert(&mut self, value: u16) {
        self.hist[value as usize] += 1;
    }

    /// Locate the median from scratch after the initial window fill
    fn locate(&mut self) {
        let mut cumulative = 0u32;
        for (bucket, &count) in self.hist.iter().enumerate() {
            cumulative += count;
            if cumulative >= self.middle {
                self.med = bucket;
                self.delta_l = cumulative - count;
                return;
            }
        }
        unreachable!("window always holds `middle` samples");
    }

    /// Swap one departing sample for one entering sample
    fn swap(&mut self, departing: u16, entering: u16) {
        if departing == entering {
            return;
        }
        self.hist[departing as usize] -= 1;
        if (departing as usize) < self.med {
            self.delta_l -= 1;
        }
        self.hist[entering as usize] += 1;
        if (entering as usize) < self.med {
            self.delta_l += 1;
        }
    }

    /// Walk `med` one bucket at a time until the rank `middle` again falls
    /// inside it: `delta_l < middle <= delta_l + hist[med]`.
    fn rebalance(&mut self) {
        if self.delta_l >= self.middle {
            while self.delta_l >= self.middle {
                self.med -= 1;
                if self.hist[self.med] > 0 {
                    self.delta_l -= self.hist[self.med];
                }
            }
        } else {
            while self.delta_l + self.hist[self.med] < self.middle {
                if self.hist[self.med] > 0 {
                    self.delta_l += self.hist[self.med];
                }
                self.med += 1;
            }
        }
    }

    fn median(&self) -> u16 {
        self.med as u16
    }
}

/// Serpentine scan cursor. `direction` is +1 on left-to-right rows and -1 on
/// right-to-left rows; it flips at every row turn.
struct Cursor {
    row: isize,
    col: isize,
    direction: isize,
}

/// Remove salt-and-pepper noise with a `window_w` x `window_h` median,
/// maintained incrementally over a serpentine scan.
///
/// Output is bit-identical to [`super::median_sort::denoise_sort`] for the
/// same frame and window; that equivalence is the correctness contract and
/// is asserted by the test suite.
pub fn denoise_fast(
    frame: &DepthFrame,
    window_w: usize,
    window_h: usize,
) -> Result<DepthFrame, FilterError> {
    validate_window(window_w, window_h, frame.width(), frame.height())?;

    let width = frame.width() as isize;
    let height = frame.height() as isize;
    let stride = frame.width() as usize;
    let wx2 = (window_w / 2) as isize;
    let wy2 = (window_h / 2) as isize;
    let middle = ((window_w * window_h + 1) / 2) as u32;

    let mut out = DepthFrame::new(frame.width(), frame.height());
    let mut window = WindowHistogram::new(middle);

    // Fill the histogram with the clamped window around (0, 0)
    for r in -wy2..=wy2 {
        for c in -wx2..=wx2 {
            window.insert(frame.sample_clamped(r, c));
        }
    }
    window.locate();
    out.samples_mut()[0] = window.median();

    let mut cursor = Cursor {
        row: 0,
        col: 1,
        direction: 1,
    };

    loop {
        // Slide along the current row, one column swap per pixel
        while cursor.col >= 0 && cursor.col < width {
            let departing = cursor.col - cursor.direction * (wx2 + 1);
            let entering = cursor.col + cursor.direction * wx2;
            for r in cursor.row - wy2..=cursor.row + wy2 {
                window.swap(
                    frame.sample_clamped(r, departing),
                    frame.sample_clamped(r, entering),
                );
            }
            window.rebalance();
            out.samples_mut()[cursor.row as usize * stride + cursor.col as usize] =
                window.median();
            cursor.col += cursor.direction;
        }

        if cursor.row == height - 1 {
            break;
        }

        // Turn: step back onto the last pixel of the row, flip direction,
        // and shift the window down one row in place.
        cursor.col -= cursor.direction;
        cursor.direction = -cursor.direction;

        let departing_row = cursor.row - wy2;
        let entering_row = cursor.row + wy2 + 1;
        for c in cursor.col - wx2..=cursor.col + wx2 {
            window.swap(
                frame.sample_clamped(departing_row, c),
                frame.sample_clamped(entering_row, c),
            );
        }
        window.rebalance();
        cursor.row += 1;
        out.samples_mut()[cursor.row as usize * stride + cursor.col as usize] = window.median();
        cursor.col += cursor.direction;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::median_sort::denoise_sort;

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
    fn test_rejects_even_window() {
        let frame = DepthFrame::new(8, 8);
        assert!(denoise_fast(&frame, 2, 3).is_err());
        assert!(denoise_fast(&frame, 3, 6).is_err());
    }

    #[test]
    fn test_identity_window() {
        let frame = pseudo_random_frame(9, 7, 8000, 7);
        let out = denoise_fast(&frame, 1, 1).unwrap();
        assert_eq!(out.samples(), frame.samples());
    }

    #[test]
    fn test_constant_frame_unchanged() {
        let frame = DepthFrame::from_samples(16, 12, vec![2000; 192]).unwrap();
        let out = denoise_fast(&frame, 5, 5).unwrap();
        assert!(out.samples().iter().all(|&d| d == 2000));
    }

    #[test]
    fn test_matches_sort_reference_on_random_frames() {
        for (w, h, seed) in [(17, 11, 1), (16, 12, 2), (31, 9, 3)] {
            let frame = pseudo_random_frame(w, h, 8000, seed);
            for (fw, fh) in [(3, 3), (5, 5), (3, 5), (5, 3), (7, 3)] {
                let fast = denoise_fast(&frame, fw, fh).unwrap();
                let sort = denoise_sort(&frame, fw, fh).unwrap();
                assert_eq!(
                    fast.samples(),
                    sort.samples(),
                    "mismatch for {}x{} window on {}x{} frame",
                    fw,
                    fh,
                    w,
                    h
                );
            }
        }
    }

    #[test]
    fn test_matches_sort_reference_on_full_range_samples() {
        // Samples above the 8000 mm valid ceiling still filter exactly
        let frame = pseudo_random_frame(13, 13, u16::MAX, 11);
        let fast = denoise_fast(&frame, 5, 5).unwrap();
        let sort = denoise_sort(&frame, 5, 5).unwrap();
        assert_eq!(fast.samples(), sort.samples());
    }

    #[test]
    fn test_matches_sort_reference_with_dropouts() {
        // Zero samples are processed uniformly through the window math
        let mut frame = pseudo_random_frame(15, 10, 3000, 23);
        for i in (0..frame.pixel_count()).step_by(4) {
            frame.samples_mut()[i] = 0;
        }
        let fast = denoise_fast(&frame, 3, 3).unwrap();
        let sort = denoise_sort(&frame, 3, 3).unwrap();
        assert_eq!(fast.samples(), sort.samples());
    }

    #[test]
    fn test_removes_isolated_outlier() {
        let mut samples = vec![700u16; 49];
        samples[24] = 7999; // center pixel of a 7x7 frame
        let frame = DepthFrame::from_samples(7, 7, samples).unwrap();
        let out = denoise_fast(&frame, 3, 3).unwrap();
        assert!(out.samples().iter().all(|&d| d == 700));
    }
}
