//! Sample-rate conversion using rubato

use crate::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The output is aligned with the input (the resampler's delay is dropped)
/// and holds `ceil(len * to_rate / from_rate)` samples.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> Result<Vec<f64>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(Error::Resample(format!(
            "cannot resample {} Hz -> {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;

    let mut resampler = FastFixedIn::<f64>::new(ratio, 1.0, PolynomialDegree::Cubic, CHUNK_SIZE, 1)
        .map_err(|e| Error::Resample(format!("failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();
    let expected_len = (samples.len() as f64 * ratio).ceil() as usize;

    let mut input_buffer = vec![vec![0.0f64; CHUNK_SIZE]];
    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);

    let mut pos = 0;
    // Keep feeding (zeros once the input runs out) until the delayed tail is flushed
    while output.len() < expected_len + delay {
        let needed = resampler.input_frames_next();
        input_buffer[0].resize(needed, 0.0);

        let end = (pos + needed).min(samples.len());
        let chunk = end.saturating_sub(pos);
        if chunk > 0 {
            input_buffer[0][..chunk].copy_from_slice(&samples[pos..end]);
        }
        input_buffer[0][chunk..].fill(0.0);
        pos += chunk;

        let produced = resampler
            .process(&input_buffer, None)
            .map_err(|e| Error::Resample(format!("resampling failed: {}", e)))?;
        output.extend_from_slice(&produced[0]);
    }

    log::debug!(
        "resampled {} samples @ {} Hz -> {} samples @ {} Hz",
        samples.len(),
        from_rate,
        expected_len,
        to_rate
    );

    Ok(output.into_iter().skip(delay).take(expected_len).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin())
            .collect()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let samples = sine(440.0, 16000, 1000);
        assert_eq!(resample(&samples, 16000, 16000).unwrap(), samples);
    }

    #[test]
    fn test_downsample_length() {
        let samples = sine(440.0, 44100, 44100);
        let out = resample(&samples, 44100, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn test_upsample_length() {
        let samples = sine(440.0, 8000, 3001);
        let out = resample(&samples, 8000, 16000).unwrap();
        assert_eq!(out.len(), 6002);
    }

    #[test]
    fn test_resampled_sine_keeps_frequency() {
        let out = resample(&sine(440.0, 48000, 48000), 48000, 16000).unwrap();
        // Count zero crossings in the middle half: ~2 per period
        let mid = &out[4000..12000];
        let crossings = mid
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count();
        let freq = crossings as f64 / 2.0 / (mid.len() as f64 / 16000.0);
        assert!((freq - 440.0).abs() < 5.0, "got {} Hz", freq);
    }

    #[test]
    fn test_zero_rate_is_an_error() {
        assert!(matches!(
            resample(&[0.0; 10], 0, 16000).unwrap_err(),
            Error::Resample(_)
        ));
    }
}
