//! Plain-text alert body
//!
//! One block per clip, ready to paste into a chat message or mail body.

use super::format_value;
use crate::analyzer::AnalysisResult;
use std::io::{self, Write};

const TITLE: &str = "=== Synthetic Speech Suspicion (Heuristic) ===";

/// Shown instead of a reason list when no rule fired
pub const NO_PATTERN_NOTE: &str =
    "No strong synthetic pattern found (this does not mean the voice is genuine)";

/// Follow-up advice appended to every block
pub const FOLLOW_UP: [&str; 2] = [
    "This score is a triage signal only. Confirm identity by calling back a known number and asking a safe-word question.",
    "Phone codecs, heavy compression and background noise make detection less reliable.",
];

/// Render the alert block of one clip
pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(TITLE);
    out.push('\n');
    out.push_str(&format!("File: {}\n", result.file_path));

    if let Some(ref error) = result.error {
        out.push_str(&format!("Error: {}\n", error));
        return out;
    }

    out.push_str(&format!("Score: {:.1} / 100 ({})\n", result.score, result.verdict));

    out.push_str("\n[Descriptors]\n");
    if let Some(ref descriptors) = result.descriptors {
        for (key, value) in descriptors.iter() {
            out.push_str(&format!("- {}: {}\n", key, format_value(value)));
        }
    }

    out.push_str("\n[Reasons]\n");
    if result.reasons.is_empty() {
        out.push_str(&format!("- {}\n", NO_PATTERN_NOTE));
    } else {
        for reason in &result.reasons {
            out.push_str(&format!("- {}\n", reason));
        }
    }

    out.push_str("\n[Next]\n");
    for line in FOLLOW_UP {
        out.push_str(&format!("- {}\n", line));
    }

    out
}

pub fn write<W: Write>(w: &mut W, results: &[AnalysisResult]) -> io::Result<()> {
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        write!(w, "{}", render(result))?;
    }
    Ok(())
}
