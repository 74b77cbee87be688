//! Shared directive-body resolution: JSON parsing, type lookup, and schema
//! validation, used by the parser's fence/inline rules, the stream
//! renderer's `COMPONENT` state, and the mutation observer. Keeping this
//! logic in one place is what guarantees the static and streaming render
//! paths treat the same directive body identically.

use crate::directive::{self, Props};
use crate::dom::Block;
use crate::error::CoreError;
use crate::registry::Registry;

/// Default cap on a directive body's JSON size, in bytes, shared by the
/// static parser and the stream renderer so the same source produces the
/// same fallback behaviour on either path.
pub const DEFAULT_MAX_JSON_SIZE: usize = 64 * 1024;

/// What became of a directive body once its JSON was parsed (or failed to
/// parse) and checked against the registry.
#[derive(Debug, Clone)]
pub enum DirectiveOutcome {
    /// The directive type-checked and validated; ready to materialise.
    Component {
        /// The directive's type name.
        type_name: String,
        /// `livellm-<type_name>`.
        tag_name: String,
        /// Defaults-applied, validated props.
        props: Props,
    },
    /// The directive was well-formed JSON of a known type, but failed
    /// schema validation.
    SchemaError {
        /// The directive's type name.
        type_name: String,
        /// One message per violated rule.
        errors: Vec<String>,
        /// The raw body, preserved for the error card.
        raw: String,
    },
    /// The directive could not be honoured at all: malformed JSON, unknown
    /// type, invalid identifier, or an oversize body.
    Fallback {
        /// Human-readable reason.
        reason: String,
        /// The raw body, preserved for the fallback card.
        raw: String,
    },
}

impl DirectiveOutcome {
    /// Converts this outcome into the [`Block`] it should render as.
    pub fn into_block(self) -> Block {
        match self {
            DirectiveOutcome::Component {
                type_name,
                tag_name,
                props,
            } => Block::Component {
                type_name,
                tag_name,
                props,
            },
            DirectiveOutcome::SchemaError {
                type_name,
                errors,
                raw,
            } => Block::ErrorCard {
                type_name,
                errors,
                raw,
            },
            DirectiveOutcome::Fallback { reason, raw } => Block::FallbackCard { reason, raw },
        }
    }

    /// True for the `Component` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, DirectiveOutcome::Component { .. })
    }
}

/// Resolves a directive's raw JSON body against `registry`: size check,
/// identifier check, JSON parse, type lookup, schema validation, defaults.
/// Never panics and never returns an `Err` — every failure mode becomes a
/// [`DirectiveOutcome`] variant the caller renders as a card.
pub fn resolve_directive(
    type_name: &str,
    raw_body: &str,
    max_json_size: usize,
    registry: &mut Registry,
) -> DirectiveOutcome {
    if raw_body.len() > max_json_size {
        let err = CoreError::OversizeJson {
            size: raw_body.len(),
            max: max_json_size,
        };
        return DirectiveOutcome::Fallback {
            reason: err.to_string(),
            raw: raw_body.to_string(),
        };
    }
    if !directive::is_valid_ident(type_name) {
        let err = CoreError::InvalidIdentifier(type_name.to_string());
        return DirectiveOutcome::Fallback {
            reason: err.to_string(),
            raw: raw_body.to_string(),
        };
    }
    let parsed: serde_json::Value = match serde_json::from_str(raw_body) {
        Ok(v) => v,
        Err(e) => {
            let err = CoreError::MalformedJson(e.to_string());
            return DirectiveOutcome::Fallback {
                reason: err.to_string(),
                raw: raw_body.to_string(),
            };
        }
    };
    let Some(obj) = parsed.as_object() else {
        let err = CoreError::MalformedJson("component body must be a JSON object".to_string());
        return DirectiveOutcome::Fallback {
            reason: err.to_string(),
            raw: raw_body.to_string(),
        };
    };
    if !registry.has(type_name) {
        let err = CoreError::UnknownComponent(type_name.to_string());
        return DirectiveOutcome::Fallback {
            reason: err.to_string(),
            raw: raw_body.to_string(),
        };
    }
    let result = registry.validate(type_name, obj);
    if !result.valid {
        let err = CoreError::SchemaValidation(result.errors.clone());
        log::debug!("{err}");
        return DirectiveOutcome::SchemaError {
            type_name: type_name.to_string(),
            errors: result.errors.into_iter().map(|e| e.message).collect(),
            raw: raw_body.to_string(),
        };
    }
    let props = registry.apply_defaults(type_name, obj);
    let tag_name = registry
        .get(type_name)
        .map(|d| d.tag_name.clone())
        .unwrap_or_default();
    DirectiveOutcome::Component {
        type_name: type_name.to_string(),
        tag_name,
        props,
    }
}
