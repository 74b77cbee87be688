//! Domain error types.
//!
//! `CoreError` covers the "authoring error" and "programmer error"
//! categories from the failure semantics: malformed directive bodies,
//! unknown component types, schema violations, and oversize payloads. None
//! of these ever escape the streaming or static render paths as a `panic!`
//! or bare `Result::Err` — callers that hit one of these during
//! parsing/streaming convert it into a fallback or error card (see
//! [`crate::dom`]) instead of propagating it.
//!
//! Transport and host-callback errors are not represented here: they are
//! logged at the call site via the `log` crate and never constructed as a
//! typed error, since nothing downstream needs to match on them.

use thiserror::Error;

/// Domain-specific error type for directive parsing and validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The body of a directive could not be parsed as JSON.
    #[error("malformed JSON in component body: {0}")]
    MalformedJson(String),

    /// The directive's `type` is not a registered component.
    #[error("unknown component type: {0}")]
    UnknownComponent(String),

    /// The directive's `type` does not match the identifier grammar.
    #[error("invalid component type identifier: {0}")]
    InvalidIdentifier(String),

    /// The directive body exceeded the configured maximum size.
    #[error("component body size {size} exceeds maximum allowed {max} bytes")]
    OversizeJson {
        /// Observed size in bytes.
        size: usize,
        /// Configured maximum in bytes.
        max: usize,
    },

    /// Schema validation failed; carries one message per violated property.
    #[error("schema validation failed: {} violation(s)", .0.len())]
    SchemaValidation(Vec<crate::schema::ValidationError>),

    /// A programmer-facing error: registering a descriptor twice, observing
    /// a document that was never attached, removing an action handler that
    /// was never added, and so on. Logged with a `[programmer error]` prefix
    /// at the call site and treated as a recoverable no-op; this variant
    /// exists so a caller that wants the detail can still get it.
    #[error("programmer error: {0}")]
    Programmer(String),
}

impl CoreError {
    /// True for the categories that should surface a visible card in the
    /// document rather than being silently logged and dropped.
    pub fn is_authoring_error(&self) -> bool {
        !matches!(self, CoreError::Programmer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programmer_errors_are_not_authoring_errors() {
        assert!(!CoreError::Programmer("oops".into()).is_authoring_error());
        assert!(CoreError::UnknownComponent("widget".into()).is_authoring_error());
    }
}
