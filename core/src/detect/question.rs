//! Detects a question followed by an enumerated set of options, or an
//! explicit yes/no prompt, and rewrites it into a `choice` or `confirm`
//! directive.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static OPTION_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:\d+[.)]|[a-zA-Z][.)])\s+(.+)$").unwrap());

static YES_NO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(\s*yes\s*/\s*no\s*\)\s*\?\s*$").unwrap());

/// Recognises a question sentence followed by options, or a yes/no prompt.
pub struct QuestionDetector;

impl Detector for QuestionDetector {
    fn name(&self) -> &'static str {
        "question"
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
            let line = lines[i].trim_end();
            if line.trim_end().ends_with('?') {
                if YES_NO_RE.is_match(line) {
                    let start = offsets[i];
                    let end = (offsets[i] + lines[i].len()).min(source.len());
                    matches.push(DetectionMatch {
                        start,
                        end,
                        confidence: clamp_confidence(0.8),
                        data: json!({ "question": line.trim(), "kind": "confirm" }),
                        detector: self.name(),
                    });
                    i += 1;
                    continue;
                }

                let mut options = Vec::new();
                let mut j = i + 1;
                while j < lines.len() {
                    let Some(caps) = OPTION_LINE_RE.captures(lines[j]) else {
                        break;
                    };
                    options.push(caps[1].trim().to_string());
                    j += 1;
                }
                if options.len() >= 2 {
                    let start = offsets[i];
                    let last = j - 1;
                    let end = (offsets[last] + lines[last].len()).min(source.len());
                    let mut confidence = if options.len() >= 3 { 0.78 } else { 0.6 };
                    confidence += (options.len() as f64 - 2.0).max(0.0) * 0.04;
                    matches.push(DetectionMatch {
                        start,
                        end,
                        confidence: clamp_confidence(confidence),
                        data: json!({
                            "question": line.trim(),
                            "options": options,
                            "kind": "choice",
                        }),
                        detector: self.name(),
                    });
                    i = j;
                    continue;
                }
            }
            i += 1;
        }
        matches
    }

    fn transform(&self, m: &DetectionMatch) -> String {
        let kind = m.data["kind"].as_str().unwrap_or("choice");
        let type_name = if kind == "confirm" { "confirm" } else { "choice" };
        fenced_directive(type_name, &m.data)
    }
}
