//! CSV report, one row per clip
//!
//! Undefined descriptors and failed clips leave their cells empty. Flags are
//! joined with `;` so the column stays a single cell.

use crate::analyzer::{AnalysisResult, DescriptorKey};
use std::io::{self, Write};

const LEADING: [&str; 6] = [
    "file_path",
    "file_name",
    "verdict",
    "score",
    "source_sample_rate",
    "duration_secs",
];

const TRAILING: [&str; 3] = ["flags", "reasons", "error"];

pub fn write<W: Write>(w: &mut W, results: &[AnalysisResult]) -> io::Result<()> {
    let header: Vec<&str> = LEADING
        .iter()
        .copied()
        .chain(DescriptorKey::ALL.iter().map(|k| k.as_str()))
        .chain(TRAILING.iter().copied())
        .collect();
    writeln!(w, "{}", header.join(","))?;

    for r in results {
        let mut row = vec![
            escape(&r.file_path),
            escape(&r.file_name),
            r.verdict.to_string(),
            format!("{:.1}", r.score),
            r.source_sample_rate.to_string(),
            format!("{:.3}", r.duration_secs),
        ];

        for key in DescriptorKey::ALL {
            let cell = r
                .descriptors
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default();
            row.push(cell);
        }

        row.push(escape(&r.flags.join(";")));
        row.push(escape(&r.reasons.join("; ")));
        row.push(escape(r.error.as_deref().unwrap_or("")));

        writeln!(w, "{}", row.join(","))?;
    }

    Ok(())
}

/// Quote a field if it contains a delimiter, quote or newline
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
