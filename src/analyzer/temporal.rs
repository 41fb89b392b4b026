//! Time-domain frame measures: zero-crossing rate and RMS energy
//!
//! Both use the same centered framing as the spectrum so their tracks line up
//! frame for frame with the spectral and pitch tracks.

use super::frames::{self, Padding};

/// Samples with magnitude at or below this count as exact zeros
const ZERO_THRESHOLD: f64 = 1e-10;

/// Fraction of sign changes per frame
///
/// Zero counts as positive, so a signal touching zero from above does not
/// register a crossing. The first sample of each frame has no predecessor
/// and never counts, the divisor is still the full frame length.
pub fn zero_crossing_rate(samples: &[f64], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let padded = frames::centered(samples, frame_length, Padding::Edge);

    frames::frames(&padded, frame_length, hop_length)
        .map(|frame| {
            let crossings = frame
                .windows(2)
                .filter(|pair| is_negative(pair[0]) != is_negative(pair[1]))
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

fn is_negative(x: f64) -> bool {
    x.abs() > ZERO_THRESHOLD && x.is_sign_negative()
}

/// Root-mean-square amplitude per frame
pub fn rms(samples: &[f64], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let padded = frames::centered(samples, frame_length, Padding::Zero);

    frames::frames(&padded, frame_length, hop_length)
        .map(|frame| {
            let sum_sq: f64 = frame.iter().map(|&x| x * x).sum();
            (sum_sq / frame_length as f64).sqrt()
        })
        .collect()
}
