//! Detects pipe-delimited Markdown tables and rewrites them into a
//! `table-plus` directive.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static SEPARATOR_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|?\s*:?-{2,}:?\s*(\|\s*:?-{2,}:?\s*)*\|?\s*$").unwrap());

fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim().trim_start_matches('|').trim_end_matches('|');
    trimmed
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Recognises a pipe-table (header + separator + at least one data row).
pub struct TableDetector;

impl Detector for TableDetector {
    fn name(&self) -> &'static str {
        "table"
    }

    fn detect(&self, source: &str) -> Vec<DetectionMatch> {
        let mut matches = Vec::new();
        let lines: Vec<&str> = source.lines().collect();
        // Track each line's starting byte offset in the original source.
        let mut offsets = Vec::with_capacity(lines.len());
        let mut pos = 0usize;
        for line in &lines {
            offsets.push(pos);
            pos += line.len() + 1; // +1 for the newline this detector assumes
        }

        let mut i = 0;
        while i + 1 < lines.len() {
            let header_cells = split_row(lines[i]);
            if header_cells.len() >= 2 && lines[i].trim().contains('|') && SEPARATOR_ROW_RE.is_match(lines[i + 1]) {
                let mut j = i + 2;
                let mut rows = Vec::new();
                while j < lines.len() && lines[j].trim().contains('|') && !lines[j].trim().is_empty() {
                    rows.push(split_row(lines[j]));
                    j += 1;
                }
                if !rows.is_empty() {
                    let start = offsets[i];
                    let last_line_idx = j - 1;
                    let end = (offsets[last_line_idx] + lines[last_line_idx].len()).min(source.len());
                    let mut confidence = 0.7 + (rows.len() as f64) * 0.03;
                    if header_cells.iter().all(|c| !c.is_empty()) {
                        confidence += 0.05;
                    }
                    matches.push(DetectionMatch {
                        start,
                        end,
                        confidence: clamp_confidence(confidence),
                        data: json!({ "columns": header_cells, "data": rows }),
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
        fenced_directive("table-plus", &m.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_three_column_four_row_table() {
        let source = "Intro\n\n\
            | Name | Role | Years |\n\
            |------|------|-------|\n\
            | Ada | Engineer | 5 |\n\
            | Lin | Designer | 3 |\n\
            | Kai | PM | 2 |\n\
            | Zoe | QA | 4 |\n\n\
            Outro";
        let matches = TableDetector.detect(source);
        assert_eq!(matches.len(), 1);
        let data = &matches[0].data;
        assert_eq!(data["columns"].as_array().unwrap().len(), 3);
        assert_eq!(data["data"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn offsets_span_exactly_the_motivating_substring() {
        let source = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let matches = TableDetector.detect(source);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(&source[m.start..m.end], "| a | b |\n|---|---|\n| 1 | 2 |");
    }

    #[test]
    fn no_table_when_no_separator_row() {
        let source = "| a | b |\nnot a separator\n| 1 | 2 |\n";
        assert!(TableDetector.detect(source).is_empty());
    }
}
