//! Detects non-directive fenced code blocks with a language tag and
//! rewrites them into a `code-runner` directive.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```([A-Za-z][A-Za-z0-9_+-]*)\r?\n([\s\S]*?)\r?\n```[ \t]*$").unwrap());

const RUNNABLE_LANGUAGES: &[&str] = &[
    "js", "javascript", "ts", "typescript", "py", "python", "rust", "rs", "go", "ruby", "sh",
    "bash", "shell",
];

/// Recognises fenced code blocks (excluding `livellm:` directives) with a
/// known language tag and at least two lines of code.
pub struct CodeDetector;

impl Detector for CodeDetector {
    fn name(&self) -> &'static str {
        "code"
    }

    fn detect(&self, source: &str) -> Vec<DetectionMatch> {
        let mut matches = Vec::new();
        for caps in CODE_FENCE_RE.captures_iter(source) {
            let lang = &caps[1];
            if lang.eq_ignore_ascii_case("livellm") || lang.starts_with("livellm:") {
                continue;
            }
            let body = &caps[2];
            let line_count = body.lines().filter(|l| !l.trim().is_empty()).count();
            if line_count < 2 {
                continue;
            }
            let whole = caps.get(0).unwrap();
            let mut confidence = 0.6;
            if RUNNABLE_LANGUAGES.contains(&lang.to_ascii_lowercase().as_str()) {
                confidence += 0.2;
            }
            confidence += (line_count as f64 - 2.0).max(0.0).min(5.0) * 0.02;
            matches.push(DetectionMatch {
                start: whole.start(),
                end: whole.end(),
                confidence: clamp_confidence(confidence),
                data: json!({ "language": lang, "code": body }),
                detector: self.name(),
            });
        }
        matches
    }

    fn transform(&self, m: &DetectionMatch) -> String {
        fenced_directive("code-runner", &m.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_runnable_fenced_block() {
        let source = "```python\nprint(1)\nprint(2)\n```\n";
        let matches = CodeDetector.detect(source);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].data["language"], "python");
    }

    #[test]
    fn ignores_single_line_blocks() {
        let source = "```python\nprint(1)\n```\n";
        assert!(CodeDetector.detect(source).is_empty());
    }

    #[test]
    fn ignores_livellm_directive_fences() {
        let source = "```livellm:alert\n{\"text\":\"hi\"}\n```\n";
        assert!(CodeDetector.detect(source).is_empty());
    }
}
