//! Centered framing shared by every frame-level measure
//!
//! All tracks use the same convention: the signal is padded by
//! `frame_length / 2` on each side before slicing, so frame `t` is centered on
//! sample `t * hop_length` and a signal of `n` samples yields `1 + n / hop`
//! frames. Clips shorter than one window therefore still produce frames.

/// How the signal is extended past its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Zeros (STFT, RMS, pitch)
    Zero,
    /// Repeat the first/last sample (zero-crossing rate)
    Edge,
}

/// Pad `samples` by half a frame on both sides
pub fn centered(samples: &[f64], frame_length: usize, padding: Padding) -> Vec<f64> {
    let pad = frame_length / 2;
    let (head, tail) = match padding {
        Padding::Zero => (0.0, 0.0),
        Padding::Edge => (
            samples.first().copied().unwrap_or(0.0),
            samples.last().copied().unwrap_or(0.0),
        ),
    };

    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.resize(pad, head);
    padded.extend_from_slice(samples);
    padded.resize(padded.len() + pad, tail);
    padded
}

/// Number of full frames in an already padded buffer
pub fn frame_count(padded_len: usize, frame_length: usize, hop_length: usize) -> usize {
    if padded_len < frame_length || hop_length == 0 {
        0
    } else {
        (padded_len - frame_length) / hop_length + 1
    }
}

/// Iterate over the frames of an already padded buffer
pub fn frames(
    padded: &[f64],
    frame_length: usize,
    hop_length: usize,
) -> impl Iterator<Item = &[f64]> + '_ {
    (0..frame_count(padded.len(), frame_length, hop_length)).map(move |i| {
        let start = i * hop_length;
        &padded[start..start + frame_length]
    })
}
