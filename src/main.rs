use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use voxtriage::report::{self, Summary};
use voxtriage::{AnalysisResult, Analyzer, Config, Verdict};
use walkdir::WalkDir;

/// Exit code for a run that could not complete (1 and 2 report verdicts)
const EXIT_FAILURE: i32 = 3;

/// Extensions collected when PATH is a directory
const SUPPORTED_EXTENSIONS: [&str; 6] = ["wav", "wave", "flac", "mp3", "ogg", "oga"];

#[derive(Parser, Debug)]
#[command(name = "voxtriage")]
#[command(author, version, about = "Heuristic suspicion score for synthetic (TTS / voice-converted) speech")]
struct Args {
    /// File or directory to analyze
    path: PathBuf,

    /// Output report file (.txt, .json, otherwise CSV)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "voxtriage-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate CSV report
    #[arg(long)]
    no_report: bool,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trim threshold in dB below the loudest frame
    #[arg(long)]
    top_db: Option<f64>,

    /// Voiced frames needed before pitch statistics are defined
    #[arg(long)]
    min_voiced_frames: Option<usize>,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Show descriptors and reasons for every clip
    #[arg(short, long)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,

    /// Score at which a clip is ELEVATED
    #[arg(long)]
    elevated: Option<f64>,

    /// Score at which a clip is HIGH
    #[arg(long)]
    high: Option<f64>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = collect_files(&args.path);

    if files.is_empty() {
        eprintln!(
            "No audio files found (supported: {})",
            SUPPORTED_EXTENSIONS.join(", ")
        );
        std::process::exit(EXIT_FAILURE);
    }

    if !args.quiet {
        eprintln!("\x1b[1mvoxtriage - Synthetic Speech Triage\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} audio file(s)\n", files.len());
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    let analyzer = match Analyzer::new().with_config(config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    // Analyze files in parallel
    let results: Vec<AnalysisResult> = files
        .par_iter()
        .map(|path| {
            let result = analyzer.analyze(path);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(result.file_name.clone());
            }
            result
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    if !args.quiet {
        for r in &results {
            print_result(r, args.verbose);
        }
    }

    let summary = Summary::from_results(&results);

    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Low:\x1b[0m       {}", summary.low);
        eprintln!("  \x1b[33m? Elevated:\x1b[0m  {}", summary.elevated);
        eprintln!("  \x1b[31m✗ High:\x1b[0m      {}", summary.high);
        if summary.error > 0 {
            eprintln!("  \x1b[90mErrors:\x1b[0m      {}", summary.error);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("voxtriage_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        if let Err(e) = report::generate(output_path, &results) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mAnalysis complete. Scores are a triage signal, not proof.\x1b[0m");
    }

    std::process::exit(exit_code(&summary));
}

/// 2 if any clip is HIGH, 1 if any is ELEVATED, 0 otherwise
fn exit_code(summary: &Summary) -> i32 {
    if summary.high > 0 {
        2
    } else if summary.elevated > 0 {
        1
    } else {
        0
    }
}

/// Defaults, then the config file, then command-line overrides
fn build_config(args: &Args) -> voxtriage::Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(top_db) = args.top_db {
        config.loader.top_db = top_db;
    }
    if let Some(frames) = args.min_voiced_frames {
        config.extractor.pitch.min_voiced_frames = frames;
    }
    if let Some(elevated) = args.elevated {
        config.verdict.elevated = elevated;
    }
    if let Some(high) = args.high {
        config.verdict.high = high;
    }

    config.validate()?;
    Ok(config)
}

fn collect_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn print_result(r: &AnalysisResult, verbose: bool) {
    let color = match r.verdict {
        Verdict::Low => "\x1b[32m",      // Green
        Verdict::Elevated => "\x1b[33m", // Yellow
        Verdict::High => "\x1b[31m",     // Red
        Verdict::Error => "\x1b[90m",    // Gray
    };
    let reset = "\x1b[0m";

    let flags_str = if r.flags.is_empty() {
        "-".to_string()
    } else {
        r.flags.join(",")
    };

    println!(
        "{}{:<11}{} {:>5.1}  {:>6.2}s  {:<40}  {}",
        color,
        format!("[{}]", r.verdict),
        reset,
        r.score,
        r.duration_secs,
        truncate(&flags_str, 40),
        &r.file_name
    );

    if let Some(ref error) = r.error {
        eprintln!("    {}", error);
    }

    if verbose {
        if let Some(ref d) = r.descriptors {
            eprintln!(
                "    Spectral: flat={:.4}±{:.4} centroid={:.0}Hz rolloff={:.0}Hz hf_ratio={:.4}±{:.4}",
                d.flat_mean, d.flat_std, d.centroid_mean, d.rolloff_mean, d.hf_ratio_mean, d.hf_ratio_std
            );
            eprintln!(
                "    Pitch: f0={} std={} cv={}",
                fmt_opt(d.f0_mean, "Hz"),
                fmt_opt(d.f0_std, "Hz"),
                fmt_opt(d.f0_cv, "")
            );
            eprintln!(
                "    Temporal: zcr={:.4} rms={:.4}±{:.4}",
                d.zcr_mean, d.rms_mean, d.rms_std
            );
        }
        for reason in &r.reasons {
            eprintln!("    - {}", reason);
        }
    }
}

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{:.2}{}", v, unit))
        .unwrap_or_else(|| "n/a".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
