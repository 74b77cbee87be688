//! Detects standalone HTTP(S) URLs that are not already part of a Markdown
//! link, rewriting them into a `link-preview` directive.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s<>\)\]\}]+").unwrap());

/// Recognises bare URLs not already wrapped in `[text](url)` or `<url>`.
pub struct LinkDetector;

impl Detector for LinkDetector {
    fn name(&self) -> &'static str {
        "link"
    }

    fn detect(&self, source: &str) -> Vec<DetectionMatch> {
        let mut matches = Vec::new();
        for m in URL_RE.find_iter(source) {
            if inside_markdown_link(source, m.start()) {
                continue;
            }
            // Trim common trailing punctuation that isn't part of the URL.
            let mut end = m.end();
            let raw = m.as_str();
            let trimmed = raw.trim_end_matches(['.', ',', ';', ':', '!', '?']);
            end -= raw.len() - trimmed.len();

            matches.push(DetectionMatch {
                start: m.start(),
                end,
                confidence: clamp_confidence(0.65),
                data: json!({ "url": &source[m.start()..end] }),
                detector: self.name(),
            });
        }
        matches
    }

    fn transform(&self, m: &DetectionMatch) -> String {
        fenced_directive("link-preview", &m.data)
    }
}

/// True if the URL starting at `start` sits inside `(...)` immediately
/// after a Markdown link's `]`, i.e. `[text](https://...)`, or inside
/// angle-bracket autolink syntax `<https://...>`.
fn inside_markdown_link(source: &str, start: usize) -> bool {
    if start == 0 {
        return false;
    }
    let before = &source[..start];
    if before.ends_with("](") {
        return true;
    }
    if before.ends_with('<') {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_standalone_url() {
        let source = "Check out https://example.com/docs for more.";
        let matches = LinkDetector.detect(source);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].data["url"], "https://example.com/docs");
    }

    #[test]
    fn ignores_urls_inside_markdown_links() {
        let source = "See [the docs](https://example.com/docs) for more.";
        assert!(LinkDetector.detect(source).is_empty());
    }

    #[test]
    fn trims_trailing_sentence_punctuation() {
        let source = "Visit https://example.com.";
        let matches = LinkDetector.detect(source);
        assert_eq!(matches[0].data["url"], "https://example.com");
    }
}
