//! Per-component property schemas and the pure validation function that
//! checks a props object against one.

use crate::directive::Props;
use serde_json::Value;
use std::collections::BTreeMap;

/// The JSON-ish type family a [`PropertySpec`] constrains a value to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON array (element types are not checked, per spec).
    Array,
    /// A JSON object (field types are not checked, per spec).
    Object,
    /// A JSON string constrained to a finite set of admissible values.
    Enum,
}

/// The rules for a single named property in a component's [`Schema`].
#[derive(Debug, Clone)]
pub struct PropertySpec {
    /// The property's required type family.
    pub kind: PropertyType,
    /// Whether the property's absence is an error.
    pub required: bool,
    /// Applied via [`apply_defaults`] only when the property is absent.
    pub default: Option<Value>,
    /// For `PropertyType::Enum`, the admissible string values.
    pub enum_values: Vec<String>,
    /// For `PropertyType::Number`, an inclusive lower bound.
    pub min: Option<f64>,
    /// For `PropertyType::Number`, an inclusive upper bound.
    pub max: Option<f64>,
}

impl PropertySpec {
    /// A required property of the given type, with no other constraints.
    pub fn required(kind: PropertyType) -> Self {
        Self {
            kind,
            required: true,
            default: None,
            enum_values: Vec::new(),
            min: None,
            max: None,
        }
    }

    /// An optional property with a default applied when absent.
    pub fn optional(kind: PropertyType, default: Value) -> Self {
        Self {
            kind,
            required: false,
            default: Some(default),
            enum_values: Vec::new(),
            min: None,
            max: None,
        }
    }

    /// Builder: restrict an enum property to the given admissible values.
    pub fn with_enum_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: restrict a number property's range.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

/// A mapping of property name to its validation rules.
pub type Schema = BTreeMap<String, PropertySpec>;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The offending property's name, or `"_component"` for whole-component
    /// errors (e.g. "not registered").
    pub prop: String,
    /// Human-readable description.
    pub message: String,
    /// What the schema expected, if applicable.
    pub expected: Option<String>,
    /// What was actually supplied, if applicable.
    pub received: Option<String>,
}

impl ValidationError {
    fn new(prop: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            message: message.into(),
            expected: None,
            received: None,
        }
    }

    fn with_expected_received(mut self, expected: impl Into<String>, received: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.received = Some(received.into());
        self
    }
}

/// The outcome of validating a props object against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// True iff `errors` is empty.
    pub valid: bool,
    /// One entry per violated rule.
    pub errors: Vec<ValidationError>,
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_kind(kind: PropertyType, value: &Value) -> bool {
    match kind {
        PropertyType::String => value.is_string(),
        PropertyType::Number => value.is_number(),
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::Array => value.is_array(),
        PropertyType::Object => value.is_object(),
        PropertyType::Enum => value.is_string(),
    }
}

/// Validates `props` against `schema`. Unknown properties in `props` that
/// aren't declared in `schema` are permitted (forward compatibility) and do
/// not appear in the result.
pub fn validate(schema: &Schema, props: &Props) -> ValidationResult {
    let mut errors = Vec::new();
    for (name, spec) in schema {
        match props.get(name) {
            None => {
                if spec.required {
                    errors.push(ValidationError::new(
                        name,
                        format!("property \"{name}\" is required"),
                    ));
                }
            }
            Some(value) => {
                if !matches_kind(spec.kind, value) {
                    errors.push(
                        ValidationError::new(name, format!("property \"{name}\" has the wrong type"))
                            .with_expected_received(format!("{:?}", spec.kind), type_name(value)),
                    );
                    continue;
                }
                match spec.kind {
                    PropertyType::Number => {
                        let n = value.as_f64().unwrap_or(f64::NAN);
                        if let Some(min) = spec.min {
                            if n < min {
                                errors.push(ValidationError::new(
                                    name,
                                    format!("property \"{name}\" is below the minimum of {min}"),
                                ));
                            }
                        }
                        if let Some(max) = spec.max {
                            if n > max {
                                errors.push(ValidationError::new(
                                    name,
                                    format!("property \"{name}\" is above the maximum of {max}"),
                                ));
                            }
                        }
                    }
                    PropertyType::Enum => {
                        let s = value.as_str().unwrap_or_default();
                        if !spec.enum_values.iter().any(|v| v == s) {
                            errors.push(
                                ValidationError::new(
                                    name,
                                    format!("property \"{name}\" is not one of the admissible values"),
                                )
                                .with_expected_received(spec.enum_values.join(", "), s),
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

/// Returns a shallow copy of `props` with every absent optional property
/// populated from its schema default. Present properties are left alone.
/// Idempotent: applying twice yields the same result as applying once.
pub fn apply_defaults(schema: &Schema, props: &Props) -> Props {
    let mut out = props.clone();
    for (name, spec) in schema {
        if !out.contains_key(name) {
            if let Some(default) = &spec.default {
                out.insert(name.clone(), default.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        let mut schema = Schema::new();
        schema.insert("text".into(), PropertySpec::required(PropertyType::String));
        schema.insert(
            "level".into(),
            PropertySpec::optional(PropertyType::Enum, json!("info"))
                .with_enum_values(["info", "warning", "error"]),
        );
        schema.insert(
            "duration".into(),
            PropertySpec::optional(PropertyType::Number, json!(3000)).with_range(Some(0.0), Some(60_000.0)),
        );
        schema
    }

    #[test]
    fn missing_required_property_is_an_error() {
        let schema = sample_schema();
        let props = Props::new();
        let result = validate(&schema, &props);
        assert!(!result.valid);
        assert_eq!(result.errors[0].prop, "text");
    }

    #[test]
    fn wrong_type_is_an_error() {
        let schema = sample_schema();
        let mut props = Props::new();
        props.insert("text".into(), json!(42));
        let result = validate(&schema, &props);
        assert!(!result.valid);
        assert_eq!(result.errors[0].prop, "text");
    }

    #[test]
    fn enum_outside_admissible_set_is_an_error() {
        let schema = sample_schema();
        let mut props = Props::new();
        props.insert("text".into(), json!("hi"));
        props.insert("level".into(), json!("critical"));
        let result = validate(&schema, &props);
        assert!(!result.valid);
        assert_eq!(result.errors[0].prop, "level");
    }

    #[test]
    fn number_out_of_range_is_an_error() {
        let schema = sample_schema();
        let mut props = Props::new();
        props.insert("text".into(), json!("hi"));
        props.insert("duration".into(), json!(100_000));
        let result = validate(&schema, &props);
        assert!(!result.valid);
        assert_eq!(result.errors[0].prop, "duration");
    }

    #[test]
    fn unknown_properties_are_permitted() {
        let schema = sample_schema();
        let mut props = Props::new();
        props.insert("text".into(), json!("hi"));
        props.insert("extra".into(), json!(true));
        let result = validate(&schema, &props);
        assert!(result.valid);
    }

    #[test]
    fn apply_defaults_is_idempotent() {
        let schema = sample_schema();
        let mut props = Props::new();
        props.insert("text".into(), json!("hi"));
        let once = apply_defaults(&schema, &props);
        let twice = apply_defaults(&schema, &once);
        assert_eq!(once, twice);
        assert_eq!(once.get("level"), Some(&json!("info")));
    }

    #[test]
    fn apply_defaults_does_not_override_present_values() {
        let schema = sample_schema();
        let mut props = Props::new();
        props.insert("text".into(), json!("hi"));
        props.insert("level".into(), json!("warning"));
        let out = apply_defaults(&schema, &props);
        assert_eq!(out.get("level"), Some(&json!("warning")));
    }
}
