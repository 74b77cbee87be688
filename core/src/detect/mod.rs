//! Independent pattern finders over raw Markdown source.
//!
//! Each detector is blind to the others: it scans the whole source and
//! reports [`DetectionMatch`]es with confidence scores and character
//! offsets. The [`crate::transform::Transformer`] is the only thing that
//! reconciles overlapping matches across detectors.

pub mod address;
pub mod code;
pub mod data;
pub mod link;
pub mod list;
pub mod question;
pub mod table;

use serde_json::Value;

/// One candidate pattern a detector found in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionMatch {
    /// Character offset of the match's start in the original source.
    pub start: usize,
    /// Character offset one past the match's end in the original source.
    pub end: usize,
    /// Confidence this match is a real instance of the pattern, in `[0,1]`.
    pub confidence: f64,
    /// The parsed pattern payload, later turned into directive props.
    pub data: Value,
    /// Name of the detector that produced this match, so the transformer
    /// can route `transform` back to the right detector.
    pub detector: &'static str,
}

/// A pluggable pattern-finder over raw Markdown.
pub trait Detector {
    /// The detector's registration name, e.g. `"table"`.
    fn name(&self) -> &'static str;

    /// Scans `source` and returns every candidate match, independent of
    /// any other detector's output.
    fn detect(&self, source: &str) -> Vec<DetectionMatch>;

    /// Produces the directive text that should replace `m.start..m.end` in
    /// the source. Only ever called with matches this detector produced.
    fn transform(&self, m: &DetectionMatch) -> String;
}

/// Clamps a raw confidence score (base + bonuses) into `[0, 1]`.
pub(crate) fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Serialises `props` as a fenced `livellm:<type>` block, the form every
/// detector's `transform` emits.
pub(crate) fn fenced_directive(type_name: &str, props: &Value) -> String {
    format!(
        "```livellm:{type_name}\n{}\n```",
        serde_json::to_string_pretty(props).unwrap_or_else(|_| "{}".to_string())
    )
}
