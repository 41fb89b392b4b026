//! Clip-level acoustic descriptors
//!
//! [`extract`] runs every frame-level measure over a waveform and reduces the
//! tracks to twelve scalars. The set is always complete: pitch statistics
//! that cannot be computed are `None`, never missing and never NaN.

use super::{pitch, spectral, temporal};
use crate::config::ExtractorConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Added to the F0 mean before dividing in the coefficient of variation
const CV_EPSILON: f64 = 1e-12;

/// The fixed descriptor vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKey {
    FlatMean,
    FlatStd,
    CentroidMean,
    RolloffMean,
    HfRatioMean,
    HfRatioStd,
    F0Mean,
    F0Std,
    F0Cv,
    ZcrMean,
    RmsMean,
    RmsStd,
}

impl DescriptorKey {
    pub const ALL: [DescriptorKey; 12] = [
        DescriptorKey::FlatMean,
        DescriptorKey::FlatStd,
        DescriptorKey::CentroidMean,
        DescriptorKey::RolloffMean,
        DescriptorKey::HfRatioMean,
        DescriptorKey::HfRatioStd,
        DescriptorKey::F0Mean,
        DescriptorKey::F0Std,
        DescriptorKey::F0Cv,
        DescriptorKey::ZcrMean,
        DescriptorKey::RmsMean,
        DescriptorKey::RmsStd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DescriptorKey::FlatMean => "flat_mean",
            DescriptorKey::FlatStd => "flat_std",
            DescriptorKey::CentroidMean => "centroid_mean",
            DescriptorKey::RolloffMean => "rolloff_mean",
            DescriptorKey::HfRatioMean => "hf_ratio_mean",
            DescriptorKey::HfRatioStd => "hf_ratio_std",
            DescriptorKey::F0Mean => "f0_mean",
            DescriptorKey::F0Std => "f0_std",
            DescriptorKey::F0Cv => "f0_cv",
            DescriptorKey::ZcrMean => "zcr_mean",
            DescriptorKey::RmsMean => "rms_mean",
            DescriptorKey::RmsStd => "rms_std",
        }
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor set of one clip
///
/// Serializes as a flat JSON object with all twelve keys; undefined pitch
/// statistics become `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub flat_mean: f64,
    pub flat_std: f64,
    pub centroid_mean: f64,
    pub rolloff_mean: f64,
    pub hf_ratio_mean: f64,
    pub hf_ratio_std: f64,
    /// `None` when fewer than `min_voiced_frames` frames were voiced
    pub f0_mean: Option<f64>,
    pub f0_std: Option<f64>,
    pub f0_cv: Option<f64>,
    pub zcr_mean: f64,
    pub rms_mean: f64,
    pub rms_std: f64,
}

impl Descriptors {
    /// Value of `key`, `None` if undefined
    pub fn get(&self, key: DescriptorKey) -> Option<f64> {
        match key {
            DescriptorKey::FlatMean => Some(self.flat_mean),
            DescriptorKey::FlatStd => Some(self.flat_std),
            DescriptorKey::CentroidMean => Some(self.centroid_mean),
            DescriptorKey::RolloffMean => Some(self.rolloff_mean),
            DescriptorKey::HfRatioMean => Some(self.hf_ratio_mean),
            DescriptorKey::HfRatioStd => Some(self.hf_ratio_std),
            DescriptorKey::F0Mean => self.f0_mean,
            DescriptorKey::F0Std => self.f0_std,
            DescriptorKey::F0Cv => self.f0_cv,
            DescriptorKey::ZcrMean => Some(self.zcr_mean),
            DescriptorKey::RmsMean => Some(self.rms_mean),
            DescriptorKey::RmsStd => Some(self.rms_std),
        }
    }

    /// All twelve entries in vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (DescriptorKey, Option<f64>)> + '_ {
        DescriptorKey::ALL.iter().map(move |&key| (key, self.get(key)))
    }

    pub fn has_pitch(&self) -> bool {
        self.f0_mean.is_some()
    }
}

/// Compute the descriptor set of a mono waveform
///
/// Fails only on caller misuse: an empty waveform, a non-finite sample, a
/// zero sample rate or an inconsistent parameter set. Everything else
/// (silence, noise, clips shorter than one window) produces a complete,
/// possibly uninformative, set.
pub fn extract(samples: &[f64], sample_rate: u32, config: &ExtractorConfig) -> Result<Descriptors> {
    if let Err(e) = config.validate() {
        return Err(Error::InvalidInput(format!("extractor parameters: {}", e)));
    }
    if samples.is_empty() {
        return Err(Error::InvalidInput("waveform is empty".into()));
    }
    if sample_rate == 0 {
        return Err(Error::InvalidInput("sample rate must be > 0".into()));
    }
    if let Some(idx) = samples.iter().position(|x| !x.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "waveform has a non-finite sample at index {}",
            idx
        )));
    }

    let frame = config.frame_length;
    let hop = config.hop_length;

    let spec = spectral::stft_magnitudes(samples, sample_rate, frame, hop);
    let flat = spectral::flatness(&spec, config.power);
    let centroid = spectral::centroid(&spec);
    let rolloff = spectral::rolloff(&spec, config.rolloff_percent);
    let hf_ratio = spectral::band_ratio(&spec, &config.hf_band, &config.lf_band);

    let track = pitch::pyin(samples, sample_rate, frame, hop, &config.pitch);
    let voiced: Vec<f64> = track.voiced().collect();

    let zcr = temporal::zero_crossing_rate(samples, frame, hop);
    let rms = temporal::rms(samples, frame, hop);

    log::debug!(
        "extracted {} frames from {} samples ({} voiced)",
        spec.num_frames(),
        samples.len(),
        voiced.len()
    );

    let (f0_mean, f0_std, f0_cv) = if voiced.len() < config.pitch.min_voiced_frames {
        (None, None, None)
    } else {
        let m = mean(&voiced);
        let s = std_dev(&voiced);
        (Some(m), Some(s), Some(s / (m + CV_EPSILON)))
    };

    Ok(Descriptors {
        flat_mean: mean(&flat),
        flat_std: std_dev(&flat),
        centroid_mean: mean(&centroid),
        rolloff_mean: mean(&rolloff),
        hf_ratio_mean: mean(&hf_ratio),
        hf_ratio_std: std_dev(&hf_ratio),
        f0_mean,
        f0_std,
        f0_cv,
        zcr_mean: mean(&zcr),
        rms_mean: mean(&rms),
        rms_std: std_dev(&rms),
    })
}

/// Reusable extractor bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn extract(&self, samples: &[f64], sample_rate: u32) -> Result<Descriptors> {
        extract(samples, sample_rate, &self.config)
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Mean with non-finite entries counted as zero (0 for an empty track)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&x| finite_or_zero(x)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation with non-finite entries counted as zero
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values
        .iter()
        .map(|&x| (finite_or_zero(x) - m).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    var.sqrt()
}
