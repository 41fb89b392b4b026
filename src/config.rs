//! Configuration for the loader, the feature extractor and the scorer
//!
//! Every constant the analysis depends on lives here so tests (and users) can
//! override it. `Default` reproduces the reference parameters: 16 kHz input,
//! 25 dB trim, 1024/256 framing, pYIN over C2..C7 and the six-rule table.
//!
//! Configuration files are JSON. Every section is optional; missing fields
//! fall back to their defaults:
//!
//! ```json
//! {
//!   "loader": { "top_db": 30.0 },
//!   "extractor": { "pitch": { "min_voiced_frames": 20 } },
//!   "verdict": { "elevated": 40.0, "high": 70.0 }
//! }
//! ```

use crate::analyzer::DescriptorKey;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loader: LoaderConfig,
    pub extractor: ExtractorConfig,
    pub scoring: ScoringConfig,
    pub verdict: VerdictThresholds,
}

impl Config {
    /// Load and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.loader.validate()?;
        self.extractor.validate()?;
        self.scoring.validate()?;
        self.verdict.validate()
    }
}

/// Audio loader settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Analysis sample rate every clip is resampled to
    pub sample_rate: u32,
    /// Frames quieter than this many dB below the loudest frame are trimmed
    /// from both ends
    pub top_db: f64,
    pub trim_frame_length: usize,
    pub trim_hop_length: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            top_db: 25.0,
            trim_frame_length: 2048,
            trim_hop_length: 512,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::Config("loader.sample_rate must be > 0".into()));
        }
        if !(self.top_db.is_finite() && self.top_db > 0.0) {
            return Err(Error::Config("loader.top_db must be a positive number".into()));
        }
        if self.trim_hop_length == 0 || self.trim_frame_length < self.trim_hop_length {
            return Err(Error::Config(
                "loader trim framing needs 0 < trim_hop_length <= trim_frame_length".into(),
            ));
        }
        Ok(())
    }
}

/// Half-open or closed frequency interval used for band energy sums
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
    /// Whether `high_hz` itself belongs to the band
    pub include_high: bool,
}

impl FrequencyBand {
    pub const fn new(low_hz: f64, high_hz: f64, include_high: bool) -> Self {
        Self {
            low_hz,
            high_hz,
            include_high,
        }
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low_hz
            && if self.include_high {
                freq <= self.high_hz
            } else {
                freq < self.high_hz
            }
    }
}

/// Frame-level feature extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Analysis window (FFT size) in samples
    pub frame_length: usize,
    pub hop_length: usize,
    /// Exponent applied to magnitudes before the flatness measure
    pub power: f64,
    pub rolloff_percent: f64,
    pub hf_band: FrequencyBand,
    pub lf_band: FrequencyBand,
    pub pitch: PitchConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            frame_length: 1024,
            hop_length: 256,
            power: 2.0,
            rolloff_percent: 0.85,
            hf_band: FrequencyBand::new(4000.0, 8000.0, true),
            lf_band: FrequencyBand::new(300.0, 4000.0, false),
            pitch: PitchConfig::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hop_length == 0 || self.frame_length < self.hop_length {
            return Err(Error::Config(
                "extractor framing needs 0 < hop_length <= frame_length".into(),
            ));
        }
        if self.frame_length < 4 {
            return Err(Error::Config("extractor.frame_length must be >= 4".into()));
        }
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(Error::Config("extractor.power must be positive".into()));
        }
        if !(self.rolloff_percent > 0.0 && self.rolloff_percent < 1.0) {
            return Err(Error::Config(
                "extractor.rolloff_percent must lie in (0, 1)".into(),
            ));
        }
        for (name, band) in [("hf_band", &self.hf_band), ("lf_band", &self.lf_band)] {
            if !(band.low_hz >= 0.0 && band.low_hz < band.high_hz) {
                return Err(Error::Config(format!(
                    "extractor.{} must satisfy 0 <= low_hz < high_hz",
                    name
                )));
            }
        }
        self.pitch.validate(self.frame_length)
    }
}

/// pYIN pitch tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Lowest trackable F0 (C2)
    pub fmin: f64,
    /// Highest trackable F0 (C7)
    pub fmax: f64,
    /// Below this many voiced frames the F0 statistics are undefined
    pub min_voiced_frames: usize,
    pub n_thresholds: usize,
    /// Integer shape parameters of the Beta prior over YIN thresholds
    pub beta_alpha: u32,
    pub beta_beta: u32,
    pub boltzmann: f64,
    /// Pitch bin width in semitones
    pub resolution: f64,
    /// Octaves per second
    pub max_transition_rate: f64,
    pub switch_prob: f64,
    pub no_trough_prob: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            fmin: 65.406_391_325_149_66,
            fmax: 2_093.004_522_404_789,
            min_voiced_frames: 10,
            n_thresholds: 100,
            beta_alpha: 2,
            beta_beta: 18,
            boltzmann: 2.0,
            resolution: 0.1,
            max_transition_rate: 35.92,
            switch_prob: 0.01,
            no_trough_prob: 0.01,
        }
    }
}

impl PitchConfig {
    fn validate(&self, frame_length: usize) -> Result<()> {
        if !(self.fmin > 0.0 && self.fmin < self.fmax) {
            return Err(Error::Config("pitch range needs 0 < fmin < fmax".into()));
        }
        if frame_length < 8 {
            return Err(Error::Config(
                "pitch tracking needs frame_length >= 8".into(),
            ));
        }
        if self.n_thresholds == 0 || self.beta_alpha == 0 || self.beta_beta == 0 {
            return Err(Error::Config(
                "pitch thresholds and beta parameters must be > 0".into(),
            ));
        }
        if !(self.resolution > 0.0 && self.resolution <= 1.0) {
            return Err(Error::Config("pitch.resolution must lie in (0, 1]".into()));
        }
        for (name, p) in [
            ("switch_prob", self.switch_prob),
            ("no_trough_prob", self.no_trough_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Config(format!("pitch.{} must lie in [0, 1]", name)));
            }
        }
        if !(self.boltzmann > 0.0 && self.max_transition_rate > 0.0) {
            return Err(Error::Config(
                "pitch.boltzmann and pitch.max_transition_rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Direction of a threshold comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Below,
    Above,
}

impl Comparison {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Below => value < threshold,
            Comparison::Above => value > threshold,
        }
    }
}

/// A single scoring rule: `key <comparison> threshold` adds `weight`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable machine-readable identifier
    pub flag: String,
    pub key: DescriptorKey,
    pub comparison: Comparison,
    pub threshold: f64,
    pub weight: f64,
    /// Human-readable explanation reported when the rule fires
    pub reason: String,
}

impl Rule {
    pub fn new(
        flag: &str,
        key: DescriptorKey,
        comparison: Comparison,
        threshold: f64,
        weight: f64,
        reason: &str,
    ) -> Self {
        Self {
            flag: flag.to_string(),
            key,
            comparison,
            threshold,
            weight,
            reason: reason.to_string(),
        }
    }
}

/// Ordered rule table. Declaration order is reporting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub rules: Vec<Rule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        use Comparison::{Above, Below};
        use DescriptorKey::*;

        Self {
            rules: vec![
                Rule::new(
                    "flat_variation_low",
                    FlatStd,
                    Below,
                    0.02,
                    20.0,
                    "Spectral flatness variation is abnormally low (over-smooth spectrum)",
                ),
                Rule::new(
                    "hf_ratio_variation_low",
                    HfRatioStd,
                    Below,
                    0.15,
                    15.0,
                    "HF/LF energy ratio variation is abnormally low (codec or synthesis suspected)",
                ),
                Rule::new(
                    "pitch_variation_low",
                    F0Cv,
                    Below,
                    0.05,
                    20.0,
                    "Pitch variability is abnormally low (robotic or synthetic)",
                ),
                Rule::new(
                    "pitch_jumps",
                    F0Std,
                    Above,
                    80.0,
                    10.0,
                    "Pitch standard deviation is abnormally high (discontinuous jumps suspected)",
                ),
                Rule::new(
                    "loudness_constant",
                    RmsStd,
                    Below,
                    0.01,
                    15.0,
                    "Loudness (RMS) variation is abnormally constant",
                ),
                Rule::new(
                    "zcr_low",
                    ZcrMean,
                    Below,
                    0.03,
                    5.0,
                    "Zero-crossing rate is low (smoothed synthesis or noise suppression)",
                ),
            ],
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            if rule.flag.is_empty() || rule.reason.is_empty() {
                return Err(Error::Config(
                    "every scoring rule needs a flag and a reason".into(),
                ));
            }
            if !(rule.weight.is_finite() && rule.weight >= 0.0) {
                return Err(Error::Config(format!(
                    "rule '{}' has a negative or non-finite weight",
                    rule.flag
                )));
            }
            if !rule.threshold.is_finite() {
                return Err(Error::Config(format!(
                    "rule '{}' has a non-finite threshold",
                    rule.flag
                )));
            }
        }
        Ok(())
    }

    /// Sum of all rule weights, the highest score the table can produce
    pub fn max_score(&self) -> f64 {
        self.rules.iter().map(|r| r.weight).sum::<f64>().clamp(0.0, 100.0)
    }
}

/// Score boundaries for the presentation verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    pub elevated: f64,
    pub high: f64,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            elevated: 35.0,
            high: 65.0,
        }
    }
}

impl VerdictThresholds {
    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.elevated)
            || !(0.0..=100.0).contains(&self.high)
            || self.elevated > self.high
        {
            return Err(Error::Config(
                "verdict thresholds need 0 <= elevated <= high <= 100".into(),
            ));
        }
        Ok(())
    }
}
