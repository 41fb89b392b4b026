//! Core analysis engine
//!
//! Two pure stages run in sequence over each clip:
//!
//! 1. [`features`] turns a mono waveform into twelve descriptors, built from
//!    the frame-level measures in [`spectral`], [`pitch`] and [`temporal`].
//! 2. [`scoring`] walks the rule table and sums the weights of the rules
//!    that fire into a 0-100 score with one reason per rule.
//!
//! [`Analyzer`] wraps both behind the audio loader for the batch CLI. It
//! never fails: a clip that cannot be loaded or analyzed comes back as an
//! [`AnalysisResult`] with [`Verdict::Error`].

pub mod features;
pub mod frames;
pub mod pitch;
pub mod scoring;
pub mod spectral;
pub mod temporal;

pub use features::{extract, DescriptorKey, Descriptors, FeatureExtractor};
pub use scoring::{score, SuspicionScore};

use crate::audio::{self, Waveform};
use crate::config::{Config, VerdictThresholds};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Presentation bucket for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// No strong synthetic pattern
    Low,
    /// Some indicators, worth a listen
    Elevated,
    /// Several indicators at once
    High,
    /// The clip could not be analyzed
    Error,
}

impl Verdict {
    pub fn from_score(score: f64, thresholds: &VerdictThresholds) -> Self {
        if score >= thresholds.high {
            Verdict::High
        } else if score >= thresholds.elevated {
            Verdict::Elevated
        } else {
            Verdict::Low
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Low => write!(f, "LOW"),
            Verdict::Elevated => write!(f, "ELEVATED"),
            Verdict::High => write!(f, "HIGH"),
            Verdict::Error => write!(f, "ERROR"),
        }
    }
}

/// Per-clip record for reports and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,
    pub file_name: String,
    /// Sample rate of the file before resampling (0 if it never decoded)
    pub source_sample_rate: u32,
    /// Analyzed duration, after trimming
    pub duration_secs: f64,
    pub verdict: Verdict,
    pub score: f64,
    pub reasons: Vec<String>,
    pub flags: Vec<String>,
    pub descriptors: Option<Descriptors>,
    pub error: Option<String>,
}

impl AnalysisResult {
    fn failed(file_path: String, file_name: String, message: String) -> Self {
        Self {
            file_path,
            file_name,
            source_sample_rate: 0,
            duration_secs: 0.0,
            verdict: Verdict::Error,
            score: 0.0,
            reasons: vec![],
            flags: vec![],
            descriptors: None,
            error: Some(message),
        }
    }
}

/// Load → extract → score pipeline with one configuration
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: Config,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration after validating it
    pub fn with_config(mut self, config: Config) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_top_db(mut self, top_db: f64) -> Self {
        self.config.loader.top_db = top_db;
        self
    }

    pub fn with_min_voiced_frames(mut self, frames: usize) -> Self {
        self.config.extractor.pitch.min_voiced_frames = frames;
        self
    }

    pub fn with_thresholds(mut self, elevated: f64, high: f64) -> Self {
        self.config.verdict = VerdictThresholds { elevated, high };
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze one audio file. Failures are reported in the result.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> AnalysisResult {
        let path = path.as_ref();
        let file_path = path.display().to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Err(e) = self.config.validate() {
            return AnalysisResult::failed(file_path, file_name, e.to_string());
        }

        let clip = match audio::load(path, &self.config.loader) {
            Ok(clip) => clip,
            Err(e) => {
                log::debug!("{}: load failed: {}", file_path, e);
                return AnalysisResult::failed(file_path, file_name, e.to_string());
            }
        };

        match self.analyze_waveform(&clip.waveform) {
            Ok((descriptors, suspicion)) => AnalysisResult {
                file_path,
                file_name,
                source_sample_rate: clip.source_sample_rate,
                duration_secs: clip.waveform.duration_secs(),
                verdict: Verdict::from_score(suspicion.score, &self.config.verdict),
                score: suspicion.score,
                reasons: suspicion.reasons,
                flags: suspicion.flags,
                descriptors: Some(descriptors),
                error: None,
            },
            Err(e) => {
                let mut result = AnalysisResult::failed(file_path, file_name, e.to_string());
                result.source_sample_rate = clip.source_sample_rate;
                result
            }
        }
    }

    /// Extract and score an already-loaded waveform
    pub fn analyze_waveform(&self, waveform: &Waveform) -> Result<(Descriptors, SuspicionScore)> {
        let descriptors = extract(
            waveform.samples(),
            waveform.sample_rate(),
            &self.config.extractor,
        )?;
        let suspicion = score(&descriptors, &self.config.scoring);
        Ok((descriptors, suspicion))
    }

    pub fn verdict(&self, score: f64) -> Verdict {
        Verdict::from_score(score, &self.config.verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, amplitude: f64, len: usize) -> Waveform {
        let samples = (0..len)
            .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / 16000.0).sin())
            .collect();
        Waveform::new(samples, 16000)
    }

    // ==========================================================================
    // VERDICT TESTS
    // ==========================================================================

    #[test]
    fn test_verdict_boundaries() {
        let t = VerdictThresholds::default();
        assert_eq!(Verdict::from_score(0.0, &t), Verdict::Low);
        assert_eq!(Verdict::from_score(34.9, &t), Verdict::Low);
        assert_eq!(Verdict::from_score(35.0, &t), Verdict::Elevated);
        assert_eq!(Verdict::from_score(64.9, &t), Verdict::Elevated);
        assert_eq!(Verdict::from_score(65.0, &t), Verdict::High);
        assert_eq!(Verdict::from_score(100.0, &t), Verdict::High);
    }

    #[test]
    fn test_verdict_display_and_serde() {
        assert_eq!(Verdict::Elevated.to_string(), "ELEVATED");
        assert_eq!(serde_json::to_string(&Verdict::High).unwrap(), "\"HIGH\"");
    }

    #[test]
    fn test_custom_thresholds() {
        let analyzer = Analyzer::new().with_thresholds(10.0, 20.0);
        assert_eq!(analyzer.verdict(15.0), Verdict::Elevated);
        assert_eq!(analyzer.verdict(20.0), Verdict::High);
    }

    // ==========================================================================
    // BUILDER TESTS
    // ==========================================================================

    #[test]
    fn test_builders_override_config() {
        let analyzer = Analyzer::new().with_top_db(40.0).with_min_voiced_frames(3);
        assert_eq!(analyzer.config().loader.top_db, 40.0);
        assert_eq!(analyzer.config().extractor.pitch.min_voiced_frames, 3);
        // Untouched sections keep their defaults
        assert_eq!(analyzer.config().scoring.rules.len(), 6);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let mut config = Config::default();
        config.extractor.hop_length = 0;
        let err = Analyzer::new().with_config(config).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));

        let analyzer = Analyzer::new().with_config(Config::default()).unwrap();
        assert_eq!(analyzer.config(), &Config::default());
    }

    #[test]
    fn test_invalid_builder_override_is_an_error_result() {
        // Validation runs before the file is touched
        let result = Analyzer::new().with_top_db(-5.0).analyze("/nonexistent/clip.wav");
        assert_eq!(result.verdict, Verdict::Error);
        assert!(result.error.unwrap().contains("top_db"));
    }

    // ==========================================================================
    // PIPELINE TESTS
    // ==========================================================================

    #[test]
    fn test_constant_tone_scenario() {
        // One second of a steady 440 Hz tone: machine-flat on several axes
        let (descriptors, suspicion) = Analyzer::new()
            .analyze_waveform(&sine(440.0, 0.2, 16000))
            .unwrap();

        assert!(descriptors.rms_std < 0.01, "rms_std {}", descriptors.rms_std);
        assert!(suspicion.flags.contains(&"loudness_constant".to_string()));
        assert!(suspicion.flags.contains(&"flat_variation_low".to_string()));
        assert!(suspicion.score >= 35.0, "score {}", suspicion.score);
        assert_eq!(suspicion.reasons.len(), suspicion.flags.len());
    }

    #[test]
    fn test_empty_waveform_is_an_error() {
        let err = Analyzer::new()
            .analyze_waveform(&Waveform::new(vec![], 16000))
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }

    #[test]
    fn test_analyze_missing_file_reports_error() {
        let result = Analyzer::new().analyze("/nonexistent/clip.wav");
        assert_eq!(result.verdict, Verdict::Error);
        assert_eq!(result.file_name, "clip.wav");
        assert!(result.error.is_some());
        assert!(result.descriptors.is_none());
        assert_eq!(result.score, 0.0);
    }
}
