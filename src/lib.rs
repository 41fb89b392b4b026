//! voxtriage - Heuristic suspicion scoring for synthetic speech
//!
//! voxtriage estimates how likely a short speech recording is synthetic
//! (text-to-speech or voice-converted) rather than natural human speech. It
//! is a triage signal for an alerting workflow, not a forensic verdict.
//!
//! # Overview
//!
//! Synthetic speech tends to be too regular: the spectrum stays equally
//! smooth from frame to frame, loudness barely moves, pitch either stays
//! unnaturally flat or jumps between disconnected values. voxtriage measures
//! twelve acoustic descriptors and checks them against a small table of
//! rules, each of which adds a weight and a human-readable reason.
//!
//! # Pipeline
//!
//! 1. **Loading** ([`audio`]): decode, downmix to mono, resample to 16 kHz,
//!    trim leading/trailing near-silence.
//!
//! 2. **Feature extraction** ([`analyzer::features`]): spectral flatness,
//!    centroid, roll-off, high/low band energy ratio, pYIN pitch,
//!    zero-crossing rate and RMS energy, reduced to clip-level statistics.
//!
//! 3. **Scoring** ([`analyzer::scoring`]): sum of triggered rule weights,
//!    clamped to 0-100, with one reason per triggered rule.
//!
//! # Quick Start
//!
//! ```no_run
//! use voxtriage::{Analyzer, Verdict};
//!
//! let analyzer = Analyzer::new();
//! let result = analyzer.analyze("voicemail.wav");
//!
//! match result.verdict {
//!     Verdict::Low => println!("No strong pattern"),
//!     Verdict::Elevated => println!("Worth a second listen"),
//!     Verdict::High => println!("Verify the caller before acting"),
//!     Verdict::Error => println!("Couldn't analyze: {:?}", result.error),
//! }
//!
//! println!("Score: {}/100", result.score);
//! for reason in &result.reasons {
//!     println!("- {}", reason);
//! }
//! ```
//!
//! # Scoring System
//!
//! | Score Range | Verdict | Meaning |
//! |-------------|---------|---------|
//! | 0-34 | LOW | No strong synthetic pattern (not proof of a real voice) |
//! | 35-64 | ELEVATED | Some indicators of synthesis |
//! | 65-100 | HIGH | Several indicators at once |
//!
//! # Modules
//!
//! - [`audio`]: Decoding, resampling and trimming
//! - [`analyzer`]: Feature extraction, scoring and the batch pipeline
//! - [`config`]: Every tunable constant, loadable from JSON
//! - [`report`]: Output formatters (text, JSON, CSV)

pub mod analyzer;
pub mod audio;
pub mod config;
pub mod error;
pub mod report;

pub use analyzer::{
    extract, score, AnalysisResult, Analyzer, DescriptorKey, Descriptors, FeatureExtractor,
    SuspicionScore, Verdict,
};
pub use audio::Waveform;
pub use config::Config;
pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is reachable from the root.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: Verdict = Verdict::Low;
        let _analyzer = Analyzer::new();
        let _extractor = FeatureExtractor::default();
        let _: Config = Config::default();
    }

    #[test]
    fn test_core_functions_from_root() {
        let samples: Vec<f64> = (0..4000).map(|i| ((i % 40) as f64 / 40.0) - 0.5).collect();
        let descriptors = extract(&samples, 16000, &Config::default().extractor).unwrap();
        let result = score(&descriptors, &Config::default().scoring);
        assert!((0.0..=100.0).contains(&result.score));
        assert_eq!(result.reasons.len(), result.flags.len());
    }

    #[test]
    fn test_verdict_variants() {
        let _ = Verdict::Low;
        let _ = Verdict::Elevated;
        let _ = Verdict::High;
        let _ = Verdict::Error;
    }
}
