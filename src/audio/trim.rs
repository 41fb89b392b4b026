//! Leading/trailing silence trimming

use crate::analyzer::temporal;

/// Power floor before taking the log
const AMIN: f64 = 1e-10;

/// Range of `samples` that survives trimming
///
/// Frames are measured by RMS (centered, zero-padded) and compared in dB to
/// the loudest frame. Everything from the first to the last frame louder
/// than `-top_db` is kept, at hop resolution. Interior quiet stretches are
/// never removed.
pub fn non_silent_range(
    samples: &[f64],
    top_db: f64,
    frame_length: usize,
    hop_length: usize,
) -> std::ops::Range<usize> {
    if samples.is_empty() {
        return 0..0;
    }

    let db: Vec<f64> = {
        let power: Vec<f64> = temporal::rms(samples, frame_length, hop_length)
            .into_iter()
            .map(|r| r * r)
            .collect();
        let reference = power.iter().cloned().fold(0.0f64, f64::max);
        let ref_db = 10.0 * reference.max(AMIN).log10();
        power
            .iter()
            .map(|&p| 10.0 * p.max(AMIN).log10() - ref_db)
            .collect()
    };

    let first = db.iter().position(|&d| d > -top_db);
    let last = db.iter().rposition(|&d| d > -top_db);

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * hop_length).min(samples.len());
            let end = ((last + 1) * hop_length).min(samples.len());
            start..end.max(start)
        }
        _ => 0..0,
    }
}

/// Copy of `samples` with leading and trailing silence removed
pub fn trim(samples: &[f64], top_db: f64, frame_length: usize, hop_length: usize) -> Vec<f64> {
    let range = non_silent_range(samples, top_db, frame_length, hop_length);
    log::debug!(
        "trim at {} dB keeps samples {}..{} of {}",
        top_db,
        range.start,
        range.end,
        samples.len()
    );
    samples[range].to_vec()
}
