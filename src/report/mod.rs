//! Report generation for analysis results
//!
//! This module provides output formatters for analysis results in multiple formats:
//!
//! - **Text**: Alert body for a chat or mail dispatcher, one block per clip
//! - **JSON**: Machine-readable format for programmatic consumption
//! - **CSV**: Spreadsheet-compatible format for bulk triage
//!
//! # Usage
//!
//! ```ignore
//! use voxtriage::report;
//!
//! // Automatically picks format based on extension
//! report::generate("alert.txt", &results)?;   // Text
//! report::generate("report.json", &results)?; // JSON
//! report::generate("report.csv", &results)?;  // CSV
//! ```

pub mod csv;
pub mod json;
pub mod text;

use crate::analyzer::{AnalysisResult, Verdict};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, results: &[AnalysisResult]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = io::BufWriter::new(std::fs::File::create(path)?);

    match ext.as_str() {
        "json" => json::write(&mut file, results)?,
        "txt" | "text" => text::write(&mut file, results)?,
        _ => csv::write(&mut file, results)?,
    }

    file.flush()
}

/// Verdict counts for a batch of results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub low: usize,
    pub elevated: usize,
    pub high: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for r in results {
            match r.verdict {
                Verdict::Low => summary.low += 1,
                Verdict::Elevated => summary.elevated += 1,
                Verdict::High => summary.high += 1,
                Verdict::Error => summary.error += 1,
            }
        }

        summary
    }
}

/// Format an optional descriptor for humans
pub(crate) fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "n/a".to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::result;
    use super::*;

    // ==========================================================================
    // SUMMARY STATISTICS TESTS
    // ==========================================================================
    //
    // The Summary struct aggregates verdict counts for a batch of clips.
    // It heads the JSON report and the CLI summary.
    // ==========================================================================

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_results(&[]);
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_summary_mixed() {
        let results = vec![
            result(Verdict::Low),
            result(Verdict::Low),
            result(Verdict::Elevated),
            result(Verdict::High),
            result(Verdict::Error),
        ];
        let summary = Summary::from_results(&results);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.low, 2);
        assert_eq!(summary.elevated, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.error, 1);
    }

    #[test]
    fn test_summary_counts_add_up() {
        let results: Vec<_> = [Verdict::Low, Verdict::High, Verdict::High]
            .into_iter()
            .map(result)
            .collect();
        let s = Summary::from_results(&results);
        assert_eq!(s.low + s.elevated + s.high + s.error, s.total);
    }

    // ==========================================================================
    // DISPATCH TESTS
    // ==========================================================================

    #[test]
    fn test_generate_picks_format_by_extension() {
        let dir = std::env::temp_dir().join(format!("voxtriage-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let results = vec![result(Verdict::Low)];

        generate(dir.join("out.json"), &results).unwrap();
        generate(dir.join("out.txt"), &results).unwrap();
        generate(dir.join("out.csv"), &results).unwrap();

        let json = std::fs::read_to_string(dir.join("out.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
        let text = std::fs::read_to_string(dir.join("out.txt")).unwrap();
        assert!(text.contains("Score:"));
        let csv = std::fs::read_to_string(dir.join("out.csv")).unwrap();
        assert!(csv.starts_with("file_path,"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(0.5)), "0.5000");
        assert_eq!(format_value(None), "n/a");
    }
}
