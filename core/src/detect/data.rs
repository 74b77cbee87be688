//! Detects runs of `Label: <number>[suffix]` lines and rewrites them into a
//! `chart` directive, choosing line/bar/pie by the data's shape.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static DATA_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*([A-Za-z][A-Za-z0-9 _-]{0,40}):\s*(-?\d+(?:\.\d+)?)\s*([A-Za-z%]{0,5})\s*$").unwrap());

static MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)").unwrap()
});

fn choose_chart_kind(labels: &[String], values: &[f64]) -> &'static str {
    if labels.iter().any(|l| MONTH_RE.is_match(l.trim())) {
        return "line";
    }
    let sum: f64 = values.iter().sum();
    if labels.len() <= 5 && sum > 0.0 && (sum - 100.0).abs() / sum <= 0.1 {
        return "pie";
    }
    "bar"
}

/// Recognises three or more consecutive `Label: number[suffix]` lines.
pub struct DataDetector;

impl Detector for DataDetector {
    fn name(&self) -> &'static str {
        "data"
    }

    fn detect(&self, source: &str) -> Vec<DetectionMatch> {
        let mut matches = Vec::new();
        let lines: Vec<&str> = source.lines().collect();
        let mut offsets = Vec::with_capacity(lines.len());
        let mut pos = 0usize;
        for line in &lines {
            offsets.push(pos);
            pos += line.len() + 1;
        }

        let mut i = 0;
        while i < lines.len() {
            let mut run = Vec::new();
            let mut j = i;
            while j < lines.len() {
                let Some(caps) = DATA_LINE_RE.captures(lines[j]) else {
                    break;
                };
                let label = caps[1].trim().to_string();
                let value: f64 = caps[2].parse().unwrap_or(0.0);
                let suffix = caps[3].to_string();
                run.push((label, value, suffix));
                j += 1;
            }
            if run.len() >= 3 {
                let start = offsets[i];
                let end = (offsets[j - 1] + lines[j - 1].len()).min(source.len());
                let labels: Vec<String> = run.iter().map(|(l, _, _)| l.clone()).collect();
                let values: Vec<f64> = run.iter().map(|(_, v, _)| *v).collect();
                let kind = choose_chart_kind(&labels, &values);
                let series: Vec<_> = run
                    .iter()
                    .map(|(label, value, suffix)| json!({ "label": label, "value": value, "suffix": suffix }))
                    .collect();
                let mut confidence = 0.65 + (run.len() as f64 - 3.0).max(0.0) * 0.03;
                let consistent_units = run.iter().all(|(_, _, s)| s == &run[0].2);
                if consistent_units {
                    confidence += 0.1;
                }
                matches.push(DetectionMatch {
                    start,
                    end,
                    confidence: clamp_confidence(confidence),
                    data: json!({ "series": series, "kind": kind }),
                    detector: self.name(),
                });
                i = j;
                continue;
            }
            i += 1;
        }
        matches
    }

    fn transform(&self, m: &DetectionMatch) -> String {
        fenced_directive("chart", &m.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_three_consecutive_data_lines() {
        let source = "Revenue: 120\nCosts: 80\nProfit: 40\n";
        let matches = DataDetector.detect(source);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].data["series"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn chooses_line_chart_for_month_labels() {
        let source = "Jan: 10\nFeb: 20\nMar: 30\n";
        let matches = DataDetector.detect(source);
        assert_eq!(matches[0].data["kind"], "line");
    }

    #[test]
    fn ignores_fewer_than_three_lines() {
        let source = "Revenue: 120\nCosts: 80\n";
        assert!(DataDetector.detect(source).is_empty());
    }
}
