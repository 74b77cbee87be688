//! Detects US-style street addresses and bare `lat,lng` coordinate pairs,
//! rewriting them into a `map` directive.

use super::{clamp_confidence, fenced_directive, DetectionMatch, Detector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static STREET_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)\d{1,6}\s+[A-Z][A-Za-z0-9.'\s]{2,40}\s(?:Street|St|Avenue|Ave|Boulevard|Blvd|Road|Rd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl)\.?(?:,\s*[A-Za-z.\s]+)?(?:,\s*[A-Z]{2})?(?:\s+\d{5}(?:-\d{4})?)?",
    )
    .expect("static street address regex")
});

static COORD_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d{1,3}(?:\.\d+)?)\s*,\s*(-?\d{1,3}(?:\.\d+)?)").unwrap());

/// Recognises street addresses and valid `lat,lng` coordinate pairs.
pub struct AddressDetector;

impl Detector for AddressDetector {
    fn name(&self) -> &'static str {
        "address"
    }

    fn detect(&self, source: &str) -> Vec<DetectionMatch> {
        let mut matches = Vec::new();

        for m in STREET_ADDRESS_RE.find_iter(source) {
            matches.push(DetectionMatch {
                start: m.start(),
                end: m.end(),
                confidence: clamp_confidence(0.72),
                data: json!({ "address": m.as_str().trim() }),
                detector: self.name(),
            });
        }

        for caps in COORD_PAIR_RE.captures_iter(source) {
            let whole = caps.get(0).unwrap();
            let lat: f64 = caps[1].parse().unwrap_or(f64::NAN);
            let lng: f64 = caps[2].parse().unwrap_or(f64::NAN);
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
                matches.push(DetectionMatch {
                    start: whole.start(),
                    end: whole.end(),
                    confidence: clamp_confidence(0.55),
                    data: json!({ "lat": lat, "lng": lng }),
                    detector: self.name(),
                });
            }
        }

        matches
    }

    fn transform(&self, m: &DetectionMatch) -> String {
        fenced_directive("map", &m.data)
    }
}
