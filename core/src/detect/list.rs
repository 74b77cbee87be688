//! Detects ordered, step-like lists and rewrites them into an `accordion`
//! directive.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static ORDERED_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*(\d+)[.)]\s+(.+)$").unwrap());

const STEP_VERBS: &[&str] = &[
    "install", "run", "configure", "click", "open", "select", "create", "add", "remove", "set",
    "enable", "download", "navigate", "click", "choose", "enter", "build", "start", "stop",
    "deploy", "update",
];

fn looks_like_a_step(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    STEP_VERBS.iter().any(|verb| lower.starts_with(verb))
}

/// Recognises a sequentially-numbered list of at least three step-like
/// items, each averaging at least 15 characters.
pub struct ListDetector;

impl Detector for ListDetector {
    fn name(&self) -> &'static str {
        "list"
    }

    fn detect(&self, source: &str) -> Vec<DetectionMatch> {
        let mut matches = Vec::new();
        let mut items: Vec<(usize, usize, u64, String)> = Vec::new();
        for caps in ORDERED_ITEM_RE.captures_iter(source) {
            let whole = caps.get(0).unwrap();
            let n: u64 = caps[1].parse().unwrap_or(0);
            items.push((whole.start(), whole.end(), n, caps[2].trim().to_string()));
        }

        let mut i = 0;
        while i < items.len() {
            let mut j = i + 1;
            let mut expected = items[i].2 + 1;
            while j < items.len() && items[j].2 == expected {
                expected += 1;
                j += 1;
            }
            let run = &items[i..j];
            if run.len() >= 3 {
                let avg_len: f64 =
                    run.iter().map(|(_, _, _, t)| t.len() as f64).sum::<f64>() / run.len() as f64;
                let step_like_count = run.iter().filter(|(_, _, _, t)| looks_like_a_step(t)).count();
                if avg_len >= 15.0 {
                    let start = run.first().unwrap().0;
                    let end = run.last().unwrap().1;
                    let mut confidence = 0.55 + (run.len() as f64 - 3.0).max(0.0) * 0.03;
                    if step_like_count > 0 {
                        confidence += 0.15 * (step_like_count as f64 / run.len() as f64);
                    }
                    matches.push(DetectionMatch {
                        start,
                        end,
                        confidence: clamp_confidence(confidence),
                        data: json!({
                            "steps": run.iter().map(|(_, _, _, t)| t.clone()).collect::<Vec<_>>(),
                        }),
                        detector: self.name(),
                    });
                }
            }
            i = j.max(i + 1);
        }
        matches
    }

    fn transform(&self, m: &DetectionMatch) -> String {
        fenced_directive("accordion", &m.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_numbered_list_of_steps() {
        let source = "1. Install the dependencies from the registry\n\
                       2. Run the build script in the project root\n\
                       3. Configure the deployment target environment\n";
        let matches = ListDetector.detect(source);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].data["steps"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn ignores_short_items() {
        let source = "1. Go\n2. Run\n3. Ok\n";
        assert!(ListDetector.detect(source).is_empty());
    }

    #[test]
    fn ignores_non_sequential_numbering() {
        let source = "1. Install the dependencies carefully\n\
                       5. Run the build script thoroughly\n\
                       9. Configure the deployment target\n";
        assert!(ListDetector.detect(source).is_empty());
    }
}
