//! The parsed shape of a component invocation embedded in Markdown source.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// A JSON object of component properties. Unknown keys are permitted for
/// forward compatibility; schema validation only inspects keys it knows.
pub type Props = Map<String, Value>;

/// Matches `[A-Za-z_][A-Za-z0-9_-]*`, the identifier grammar for directive
/// type names.
pub static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("static identifier regex"));

/// True iff `name` is a syntactically valid directive type identifier.
pub fn is_valid_ident(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// Whether a directive was written as a fenced block or inline monospace run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveForm {
    /// A fenced section, info string `livellm:<type>`, JSON body.
    Block,
    /// An inline monospace run `livellm:<type>{...}`.
    Inline,
}

/// A parsed component invocation: a type name plus a props object, before
/// the registry has validated or defaulted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// The directive's type name, e.g. `"alert"`.
    pub type_name: String,
    /// The JSON object carried in the directive body.
    pub props: Props,
    /// How the directive was written in source.
    pub form: DirectiveForm,
}

impl Directive {
    /// Builds a directive, trusting that `type_name` has already been
    /// validated by the caller (the parser always checks before
    /// constructing one).
    pub fn new(type_name: impl Into<String>, props: Props, form: DirectiveForm) -> Self {
        Self {
            type_name: type_name.into(),
            props,
            form,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        assert!(is_valid_ident("alert"));
        assert!(is_valid_ident("table_plus"));
        assert!(is_valid_ident("table-plus"));
        assert!(is_valid_ident("_private"));
    }

    #[test]
    fn rejects_non_identifiers() {
        assert!(!is_valid_ident(""));
        assert!(!is_valid_ident("9lives"));
        assert!(!is_valid_ident("has space"));
        assert!(!is_valid_ident("has.dot"));
        assert!(!is_valid_ident("emoji🙂"));
    }
}
