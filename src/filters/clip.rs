// SPDX-License-Identifier: GPL-3.0-only

//! Depth range clipping
//!
//! Samples outside the configured range are likely backscatter or housing
//! reflections and are zeroed before the frame reaches the reconstruction
//! engine. Zero samples carry no measurement and pass through unchanged.

use crate::frame::DepthFrame;

/// Zero every non-zero sample outside `[min_mm, max_mm]`.
///
/// The bounds are inclusive. Idempotent: clipping a clipped frame with the
/// same bounds is a no-op.
pub fn clip(frame: &DepthFrame, min_mm: u16, max_mm: u16) -> DepthFrame {
    let samples = frame
        .samples()
        .iter()
        .map(|&d| {
            if d != 0 && (d < min_mm || d > max_mm) {
                0
            } else {
                d
            }
        })
        .collect();
    DepthFrame::from_samples(frame.width(), frame.height(), samples)
        .expect("clip preserves dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<u16>) -> DepthFrame {
        DepthFrame::from_samples(samples.len() as u32, 1, samples).unwrap()
    }

    #[test]
    fn test_clip_zeroes_out_of_range() {
        let out = clip(&frame(vec![100, 450, 700, 900, 901, 8000]), 450, 900);
        assert_eq!(out.samples(), &[0, 450, 700, 900, 0, 0]);
    }

    #[test]
    fn test_clip_keeps_invalid_samples_invalid() {
        // 0 means "no data", not a reading below the minimum
        let out = clip(&frame(vec![0, 0, 500]), 450, 900);
        assert_eq!(out.samples(), &[0, 0, 500]);
    }

    #[test]
    fn test_clip_is_idempotent() {
        let input = frame(vec![0, 10, 450, 700, 900, 2000, 65535]);
        let once = clip(&input, 450, 900);
        let twice = clip(&once, 450, 900);
        assert_eq!(once, twice);
    }
}
