//! JSON report: `{ "summary": {...}, "results": [...] }`

use super::Summary;
use crate::analyzer::AnalysisResult;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct Report<'a> {
    summary: Summary,
    results: &'a [AnalysisResult],
}

pub fn write<W: Write>(w: &mut W, results: &[AnalysisResult]) -> io::Result<()> {
    let report = Report {
        summary: Summary::from_results(results),
        results,
    };
    serde_json::to_writer_pretty(&mut *w, &report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Verdict;
    use crate::report::test_support::{failed, flagged, result};

    fn render(results: &[AnalysisResult]) -> serde_json::Value {
        let mut buf = Vec::new();
        write(&mut buf, results).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_json_structure() {
        let value = render(&[result(Verdict::Low), flagged(), failed()]);

        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["summary"]["low"], 1);
        assert_eq!(value["summary"]["elevated"], 1);
        assert_eq!(value["summary"]["error"], 1);
        assert_eq!(value["results"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_json_descriptors_and_nulls() {
        let value = render(&[result(Verdict::Low)]);
        let descriptors = value["results"][0]["descriptors"].as_object().unwrap();

        assert_eq!(descriptors.len(), 12);
        assert!(descriptors["f0_mean"].is_null());
        assert_eq!(descriptors["rms_mean"], 0.05);
    }

    #[test]
    fn test_json_verdict_and_reasons() {
        let value = render(&[flagged()]);
        let r = &value["results"][0];

        assert_eq!(r["verdict"], "ELEVATED");
        assert_eq!(r["score"], 35.0);
        assert_eq!(r["flags"][0], "flat_variation_low");
        assert_eq!(r["reasons"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_json_failed_clip() {
        let value = render(&[failed()]);
        let r = &value["results"][0];
        assert!(r["descriptors"].is_null());
        assert_eq!(r["verdict"], "ERROR");
        assert!(r["error"].as_str().unwrap().contains("no decodable audio"));
    }

    #[test]
    fn test_json_round_trips_results() {
        let mut buf = Vec::new();
        write(&mut buf, &[flagged()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let back: AnalysisResult = serde_json::from_value(value["results"][0].clone()).unwrap();
        assert_eq!(back.flags, flagged().flags);
        assert_eq!(back.descriptors, flagged().descriptors);
    }
}
