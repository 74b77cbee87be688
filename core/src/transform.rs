//! Orchestrates the detectors, resolves overlapping matches, and rewrites
//! the source to embed the directives they found.

use crate::bus::{Event, EventBus};
use crate::detect::{
    address::AddressDetector, code::CodeDetector, data::DataDetector, link::LinkDetector,
    list::ListDetector, question::QuestionDetector, table::TableDetector, DetectionMatch,
    Detector,
};
use std::collections::BTreeSet;

/// How aggressively the transformer rewrites source on `transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `transform` returns the input unchanged; detectors never run.
    Off,
    /// Detectors run and events fire, but the source is returned unchanged.
    /// Useful for previewing what would be detected without committing to
    /// the rewrite.
    Passive,
    /// Detectors run, overlaps are resolved, and accepted matches are
    /// spliced into the source.
    Auto,
}

struct Entry {
    name: &'static str,
    detector: Box<dyn Detector>,
    enabled: bool,
}

/// Runs the registered detectors over a source string and rewrites it.
pub struct Transformer {
    mode: Mode,
    /// Matches below this confidence are dropped before overlap resolution.
    pub confidence_threshold: f64,
    detectors: Vec<Entry>,
    /// Lifecycle events (`transformer:detected`, `transformer:enriched`).
    pub bus: EventBus,
}

impl Transformer {
    /// A transformer in `Auto` mode with no detectors registered yet. Call
    /// [`Transformer::register_builtins`] to add the seven built-in ones.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            confidence_threshold: 0.5,
            detectors: Vec::new(),
            bus: EventBus::new(),
        }
    }

    /// Registers a custom detector under `name`, replacing any existing
    /// detector of the same name.
    pub fn register(&mut self, name: &'static str, detector: Box<dyn Detector>) {
        self.detectors.retain(|e| e.name != name);
        self.detectors.push(Entry {
            name,
            detector,
            enabled: true,
        });
    }

    /// Registers the seven built-in detectors (table, question, address,
    /// code, link, list, data), all enabled.
    pub fn register_builtins(&mut self) {
        self.register("table", Box::new(TableDetector));
        self.register("question", Box::new(QuestionDetector));
        self.register("address", Box::new(AddressDetector));
        self.register("code", Box::new(CodeDetector));
        self.register("link", Box::new(LinkDetector));
        self.register("list", Box::new(ListDetector));
        self.register("data", Box::new(DataDetector));
    }

    /// Enables a previously registered detector by name. No-op if unknown.
    pub fn enable(&mut self, name: &str) {
        if let Some(entry) = self.detectors.iter_mut().find(|e| e.name == name) {
            entry.enabled = true;
        }
    }

    /// Disables a previously registered detector by name. No-op if unknown.
    pub fn disable(&mut self, name: &str) {
        if let Some(entry) = self.detectors.iter_mut().find(|e| e.name == name) {
            entry.enabled = false;
        }
    }

    /// Runs `source` through the configured mode.
    pub fn transform(&mut self, source: &str) -> String {
        if self.mode == Mode::Off || self.detectors.iter().all(|e| !e.enabled) {
            return source.to_string();
        }

        let mut raw_matches: Vec<DetectionMatch> = Vec::new();
        for entry in &self.detectors {
            if !entry.enabled {
                continue;
            }
            // Detector panics/exceptions are caught so one misbehaving
            // detector can't abort the whole batch.
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                entry.detector.detect(source)
            }));
            match result {
                Ok(found) => raw_matches.extend(found),
                Err(_) => {
                    log::error!("detector \"{}\" panicked; skipping its matches", entry.name);
                }
            }
        }

        self.bus.emit(Event::TransformerDetected {
            match_count: raw_matches.len(),
        });

        if self.mode == Mode::Passive {
            return source.to_string();
        }

        let accepted = self.resolve_overlaps(raw_matches);
        let rewritten = splice(source, &accepted, &self.detectors);

        self.bus.emit(Event::TransformerEnriched {
            accepted_count: accepted.len(),
        });

        rewritten
    }

    /// Filters by confidence threshold, then greedily accepts matches by
    /// descending confidence so long as they don't overlap an
    /// already-accepted interval.
    fn resolve_overlaps(&self, matches: Vec<DetectionMatch>) -> Vec<DetectionMatch> {
        let mut candidates: Vec<DetectionMatch> = matches
            .into_iter()
            .filter(|m| m.confidence >= self.confidence_threshold)
            .collect();
        candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        let mut accepted: Vec<DetectionMatch> = Vec::new();
        let mut covered: BTreeSet<usize> = BTreeSet::new();
        for m in candidates {
            if (m.start..m.end).clone().any(|i| covered.contains(&i)) {
                continue;
            }
            covered.extend(m.start..m.end);
            accepted.push(m);
        }
        accepted
    }
}

fn splice(source: &str, accepted: &[DetectionMatch], detectors: &[Entry]) -> String {
    let mut ordered: Vec<&DetectionMatch> = accepted.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = source.to_string();
    for m in ordered {
        let Some(entry) = detectors.iter().find(|e| e.name == m.detector) else {
            continue;
        };
        let replacement = entry.detector.transform(m);
        result.replace_range(m.start..m.end, &replacement);
    }
    result
}
