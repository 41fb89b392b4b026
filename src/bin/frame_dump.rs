//! Per-frame dump for investigating individual clips
//!
//! Prints the frame-level tracks behind the descriptors (F0, voicing
//! probability, flatness, HF ratio, RMS, ZCR) followed by the descriptor set
//! and the rules that fired.

use std::env;
use voxtriage::analyzer::{pitch, spectral, temporal};
use voxtriage::audio::{self, LoadedClip, Waveform};
use voxtriage::report::text;
use voxtriage::{AnalysisResult, Analyzer, Config};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: frame_dump <file1> [file2 ...]");
        std::process::exit(1);
    }

    let analyzer = Analyzer::new();
    let mut failed = false;

    for path in &args[1..] {
        println!("\n{}", "=".repeat(72));
        println!("FILE: {}", path);
        println!("{}", "=".repeat(72));

        match audio::load(path, &analyzer.config().loader) {
            Ok(clip) => {
                println!(
                    "Source: {} Hz, {} channel(s), {:.2}s decoded, {:.2}s after trim",
                    clip.source_sample_rate,
                    clip.source_channels,
                    clip.source_duration_secs,
                    clip.waveform.duration_secs()
                );
                dump_frames(&clip.waveform, analyzer.config());
                dump_summary(&analyzer, &clip, path);
            }
            Err(e) => {
                eprintln!("Failed to load: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn dump_frames(waveform: &Waveform, config: &Config) {
    if waveform.is_empty() {
        println!("(empty after trimming)");
        return;
    }

    let ex = &config.extractor;
    let samples = waveform.samples();
    let sr = waveform.sample_rate();

    let spec = spectral::stft_magnitudes(samples, sr, ex.frame_length, ex.hop_length);
    let flat = spectral::flatness(&spec, ex.power);
    let hf = spectral::band_ratio(&spec, &ex.hf_band, &ex.lf_band);
    let track = pitch::pyin(samples, sr, ex.frame_length, ex.hop_length, &ex.pitch);
    let rms = temporal::rms(samples, ex.frame_length, ex.hop_length);
    let zcr = temporal::zero_crossing_rate(samples, ex.frame_length, ex.hop_length);

    println!(
        "\n{:>6} {:>8} {:>9} {:>7} {:>9} {:>9} {:>8} {:>7}",
        "frame", "time", "f0", "p(v)", "flatness", "hf_ratio", "rms", "zcr"
    );
    println!("{}", "-".repeat(72));

    for i in 0..spec.num_frames() {
        let f0 = track
            .f0
            .get(i)
            .copied()
            .flatten()
            .map(|f| format!("{:.1}", f))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6} {:>7.3}s {:>9} {:>7.3} {:>9.5} {:>9.5} {:>8.5} {:>7.4}",
            i,
            (i * ex.hop_length) as f64 / sr as f64,
            f0,
            track.voiced_prob.get(i).copied().unwrap_or(0.0),
            flat[i],
            hf[i],
            rms.get(i).copied().unwrap_or(0.0),
            zcr.get(i).copied().unwrap_or(0.0),
        );
    }

    println!(
        "\n{} frames, {} voiced",
        spec.num_frames(),
        track.voiced_count()
    );
}

fn dump_summary(analyzer: &Analyzer, clip: &LoadedClip, path: &str) {
    match summarize(analyzer, clip, path) {
        Ok(result) => println!("\n{}", text::render(&result)),
        Err(e) => eprintln!("Extraction failed: {}", e),
    }
}

fn summarize(analyzer: &Analyzer, clip: &LoadedClip, path: &str) -> voxtriage::Result<AnalysisResult> {
    let (descriptors, suspicion) = analyzer.analyze_waveform(&clip.waveform)?;
    Ok(AnalysisResult {
        file_path: path.to_string(),
        file_name: path.to_string(),
        source_sample_rate: clip.source_sample_rate,
        duration_secs: clip.waveform.duration_secs(),
        verdict: analyzer.verdict(suspicion.score),
        score: suspicion.score,
        reasons: suspicion.reasons,
        flags: suspicion.flags,
        descriptors: Some(descriptors),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reports_source_rate() {
        let samples: Vec<f64> = (0..16000)
            .map(|i| 0.2 * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 16000.0).sin())
            .collect();
        let clip = LoadedClip {
            waveform: Waveform::new(samples, 16000),
            source_sample_rate: 44100,
            source_channels: 2,
            source_duration_secs: 1.0,
        };

        let result = summarize(&Analyzer::new(), &clip, "call.wav").unwrap();
        assert_eq!(result.source_sample_rate, 44100);
        assert!((result.duration_secs - 1.0).abs() < 1e-9);
        assert!(result.descriptors.is_some());
    }
}
