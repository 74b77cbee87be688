//! Parses and represents the streaming wire protocol: one JSON-encoded
//! event per transport frame, discriminated by a `type` field, with two
//! legacy shapes accepted for backward compatibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event in the streaming wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireEvent {
    /// A chunk of generated text to append to the stream.
    Token {
        /// The text chunk.
        token: String,
    },
    /// Out-of-band metadata about the generation, e.g. model/usage stats.
    Metadata {
        /// The model identifier that produced the generation.
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        /// The upstream provider name.
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        /// Provider-specific usage stats, passed through verbatim.
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Value>,
        /// Generation latency in milliseconds.
        #[serde(rename = "latency_ms", skip_serializing_if = "Option::is_none")]
        latency_ms: Option<f64>,
    },
    /// A transport-level error. Non-recoverable errors terminate the stream.
    Error {
        /// A machine-readable error code.
        code: String,
        /// A human-readable message.
        message: String,
        /// Whether the stream can continue after this error.
        recoverable: bool,
    },
    /// The terminal event: generation finished normally.
    Done {
        /// The complete generated text, if the transport provides it.
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "fullText")]
        full_text: Option<String>,
    },
}

impl WireEvent {
    /// Parses one transport frame. Accepts the tagged `{"type": ...}` shape,
    /// the legacy literal `"[DONE]"` sentinel, and the legacy untagged
    /// `{"token": "..."}` shape without a `type` field. Returns `None` for
    /// anything else (unknown event types, or frames that parse as neither
    /// shape) — callers should log and skip the frame, per the transport
    /// error-handling rule.
    pub fn parse(frame: &str) -> Option<WireEvent> {
        let trimmed = frame.trim();
        if trimmed == "\"[DONE]\"" || trimmed == "[DONE]" {
            return Some(WireEvent::Done { full_text: None });
        }
        if let Ok(event) = serde_json::from_str::<WireEvent>(trimmed) {
            return Some(event);
        }
        // Legacy untagged token shape: `{"token": "..."}` with no `type`.
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if let Some(token) = value.get("token").and_then(Value::as_str) {
                if value.get("type").is_none() {
                    return Some(WireEvent::Token {
                        token: token.to_string(),
                    });
                }
            }
        }
        None
    }
}
