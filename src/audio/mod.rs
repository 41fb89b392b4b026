//! Audio loading: decode, downmix, resample, trim
//!
//! Produces the [`Waveform`] the extractor expects: mono, at the configured
//! analysis rate (16 kHz by default), with leading/trailing near-silence
//! removed.
//!
//! ```ignore
//! use voxtriage::audio;
//! use voxtriage::config::LoaderConfig;
//!
//! let clip = audio::load("voicemail.ogg", &LoaderConfig::default())?;
//! println!("{} s at {} Hz", clip.waveform.duration_secs(), clip.waveform.sample_rate());
//! ```

pub mod decode;
pub mod resample;
pub mod trim;

use crate::config::LoaderConfig;
use crate::{Error, Result};
use std::path::Path;

/// Mono samples at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// A loaded clip plus what the source looked like before conversion
#[derive(Debug, Clone)]
pub struct LoadedClip {
    pub waveform: Waveform,
    pub source_sample_rate: u32,
    pub source_channels: usize,
    /// Duration of the decoded audio before trimming
    pub source_duration_secs: f64,
}

/// Load an audio file from disk
pub fn load<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<LoadedClip> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    load_bytes(data, extension, config)
}

/// Load an in-memory audio file
pub fn load_bytes(data: Vec<u8>, extension: Option<&str>, config: &LoaderConfig) -> Result<LoadedClip> {
    if let Err(e) = config.validate() {
        return Err(Error::InvalidInput(format!("loader parameters: {}", e)));
    }
    let decoded = decode::decode(data, extension)?;
    let source_duration_secs = decoded.samples.len() as f64 / decoded.sample_rate as f64;

    let resampled = resample::resample(&decoded.samples, decoded.sample_rate, config.sample_rate)?;
    let trimmed = trim::trim(
        &resampled,
        config.top_db,
        config.trim_frame_length,
        config.trim_hop_length,
    );

    Ok(LoadedClip {
        waveform: Waveform::new(trimmed, config.sample_rate),
        source_sample_rate: decoded.sample_rate,
        source_channels: decoded.channels,
        source_duration_secs,
    })
}
