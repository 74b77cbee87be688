//! The component registry: the catalogue of directive type names the
//! parser, stream renderer, and observer are allowed to materialise.

use crate::bus::{Event, EventBus};
use crate::directive::Props;
use crate::error::CoreError;
use crate::schema::{self, PropertySpec, PropertyType, Schema, ValidationResult};
use serde_json::json;
use std::collections::BTreeMap;

/// Which lifecycle bucket a component belongs to. Mirrors the source
/// system's three rough groupings rather than encoding a real class
/// hierarchy — components don't inherit behaviour from their category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Rendered inline within running text.
    Inline,
    /// Rendered as its own block.
    Block,
    /// Emits user-interaction actions back to the host.
    Action,
}

/// A visible stand-in shown while a streaming component's body is still
/// arriving.
#[derive(Debug, Clone)]
pub struct Placeholder {
    /// Host-facing placeholder markup.
    pub markup: String,
    /// Declared minimum height in pixels, so the surrounding layout doesn't
    /// jump when the real component replaces it.
    pub min_height_px: u32,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            markup: "<div class=\"livellm-skeleton\"></div>".to_string(),
            min_height_px: 48,
        }
    }
}

/// A locator a [`Registry`] can hand to a [`LazyLoader`] to fetch a
/// component module that hasn't been loaded yet.
pub trait LazyLoader {
    /// Fetches and returns the descriptor for `name`, located at `locator`.
    fn load(&self, name: &str, locator: &str) -> Result<ComponentDescriptor, CoreError>;
}

/// Registry metadata about one component type.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    /// Unique component name, e.g. `"alert"`.
    pub name: String,
    /// `livellm-<name>`, derived at construction time.
    pub tag_name: String,
    /// The component's property schema.
    pub schema: Schema,
    /// Placeholder shown while streaming.
    pub placeholder: Placeholder,
    /// Lifecycle bucket.
    pub category: Category,
    /// If set, the component is not loaded until [`Registry::load_component`]
    /// is called with a [`LazyLoader`] that knows how to resolve this URL.
    pub lazy_locator: Option<String>,
}

impl ComponentDescriptor {
    /// Builds a descriptor, deriving `tag_name` from `name`.
    pub fn new(name: impl Into<String>, schema: Schema, placeholder: Placeholder, category: Category) -> Self {
        let name = name.into();
        let tag_name = format!("livellm-{name}");
        Self {
            name,
            tag_name,
            schema,
            placeholder,
            category,
            lazy_locator: None,
        }
    }

    /// Builder: mark this descriptor as lazily loaded from `locator`.
    pub fn lazy(mut self, locator: impl Into<String>) -> Self {
        self.lazy_locator = Some(locator.into());
        self
    }
}

/// Catalogue of directive type names to [`ComponentDescriptor`]s.
///
/// A `Registry` is a plain constructible value, not a forced singleton:
/// [`default`] returns one pre-populated with the built-in components, and
/// callers who want an isolated catalogue (tests, multi-tenant hosts) just
/// construct `Registry::new()` and register their own.
pub struct Registry {
    components: BTreeMap<String, ComponentDescriptor>,
    fallback_placeholder: Placeholder,
    /// Lifecycle events (`registry:registered`, `component:unknown`, ...).
    pub bus: EventBus,
}

impl Registry {
    /// An empty registry with no components.
    pub fn new() -> Self {
        Self {
            components: BTreeMap::new(),
            fallback_placeholder: Placeholder::default(),
            bus: EventBus::new(),
        }
    }

    /// Adds `descriptor`, idempotent on `descriptor.name`: registering the
    /// same name twice is a no-op on the second call (mirrors "query first,
    /// then define" semantics for an underlying custom-element registry).
    pub fn register(&mut self, descriptor: ComponentDescriptor) {
        if self.components.contains_key(&descriptor.name) {
            return;
        }
        let name = descriptor.name.clone();
        self.components.insert(name.clone(), descriptor);
        self.bus.emit(Event::RegistryRegistered { name });
    }

    /// True iff `name` has a registered descriptor.
    pub fn has(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// The descriptor for `name`, if registered.
    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.get(name)
    }

    /// Every registered component name, in sorted order.
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Removes and returns the descriptor for `name`, if any.
    pub fn remove(&mut self, name: &str) -> Option<ComponentDescriptor> {
        self.components.remove(name)
    }

    /// Removes every registered component.
    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Validates `props` against `name`'s schema. An unregistered name
    /// yields a single `_component` "not registered" error rather than
    /// panicking.
    pub fn validate(&mut self, name: &str, props: &Props) -> ValidationResult {
        match self.components.get(name) {
            Some(descriptor) => schema::validate(&descriptor.schema, props),
            None => {
                self.bus.emit(Event::ComponentUnknown {
                    type_name: name.to_string(),
                });
                ValidationResult {
                    valid: false,
                    errors: vec![crate::schema::ValidationError {
                        prop: "_component".to_string(),
                        message: format!("\"{name}\" is not registered"),
                        expected: None,
                        received: None,
                    }],
                }
            }
        }
    }

    /// Returns a copy of `props` with absent optional properties
    /// defaulted, per `name`'s schema. Unknown names are returned
    /// unchanged, since there is no schema to default against.
    pub fn apply_defaults(&self, name: &str, props: &Props) -> Props {
        match self.components.get(name) {
            Some(descriptor) => schema::apply_defaults(&descriptor.schema, props),
            None => props.clone(),
        }
    }

    /// `name`'s declared placeholder, or a global fallback if unregistered.
    pub fn get_placeholder(&self, name: &str) -> &Placeholder {
        self.components
            .get(name)
            .map(|d| &d.placeholder)
            .unwrap_or(&self.fallback_placeholder)
    }

    /// If `name` is registered and lazy and hasn't been resolved yet,
    /// fetches it via `loader` and replaces the stub with the resolved
    /// descriptor. Idempotent: a second call for an already-resolved name
    /// is a no-op.
    pub fn load_component(
        &mut self,
        name: &str,
        loader: &dyn LazyLoader,
    ) -> Result<(), CoreError> {
        let Some(descriptor) = self.components.get(name) else {
            return Err(CoreError::Programmer(format!(
                "load_component called for unregistered name \"{name}\""
            )));
        };
        let Some(locator) = descriptor.lazy_locator.clone() else {
            return Ok(());
        };
        let resolved = loader.load(name, &locator)?;
        self.components.insert(name.to_string(), resolved);
        self.bus.emit(Event::RegistryRegistered {
            name: name.to_string(),
        });
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// A process-wide default registry, pre-populated with the built-in
/// component descriptors the transformer's detectors and the example
/// directive grammar target.
pub fn default() -> Registry {
    let mut registry = Registry::new();
    for descriptor in builtin_descriptors() {
        registry.register(descriptor);
    }
    registry
}

fn builtin_descriptors() -> Vec<ComponentDescriptor> {
    vec![
        ComponentDescriptor::new(
            "alert",
            {
                let mut s = Schema::new();
                s.insert("text".into(), PropertySpec::required(PropertyType::String));
                s.insert(
                    "type".into(),
                    PropertySpec::optional(PropertyType::Enum, json!("info"))
                        .with_enum_values(["info", "warning", "error"]),
                );
                s
            },
            Placeholder::default(),
            Category::Block,
        ),
        ComponentDescriptor::new(
            "table-plus",
            {
                let mut s = Schema::new();
                s.insert("columns".into(), PropertySpec::required(PropertyType::Array));
                s.insert("data".into(), PropertySpec::required(PropertyType::Array));
                s
            },
            Placeholder::default(),
            Category::Block,
        ),
        ComponentDescriptor::new(
            "choice",
            {
                let mut s = Schema::new();
                s.insert("question".into(), PropertySpec::required(PropertyType::String));
                s.insert("options".into(), PropertySpec::required(PropertyType::Array));
                s
            },
            Placeholder::default(),
            Category::Action,
        ),
        ComponentDescriptor::new(
            "confirm",
            {
                let mut s = Schema::new();
                s.insert("question".into(), PropertySpec::required(PropertyType::String));
                s
            },
            Placeholder::default(),
            Category::Action,
        ),
        ComponentDescriptor::new(
            "map",
            {
                // The address detector emits either a street address or a
                // coordinate pair (never both), so neither shape is required
                // on its own; the component itself geocodes `address` when
                // `lat`/`lng` are absent. None of the three carries a default
                // since there's no sensible fallback coordinate or address.
                let unset = |kind: PropertyType| PropertySpec {
                    kind,
                    required: false,
                    default: None,
                    enum_values: Vec::new(),
                    min: None,
                    max: None,
                };
                let mut s = Schema::new();
                s.insert("lat".into(), unset(PropertyType::Number));
                s.insert("lng".into(), unset(PropertyType::Number));
                s.insert("address".into(), unset(PropertyType::String));
                s.insert("label".into(), PropertySpec::optional(PropertyType::String, json!("")));
                s
            },
            Placeholder::default(),
            Category::Block,
        ),
        ComponentDescriptor::new(
            "code-runner",
            {
                let mut s = Schema::new();
                s.insert("language".into(), PropertySpec::required(PropertyType::String));
                s.insert("code".into(), PropertySpec::required(PropertyType::String));
                s
            },
            Placeholder::default(),
            Category::Block,
        ),
        ComponentDescriptor::new(
            "link-preview",
            {
                let mut s = Schema::new();
                s.insert("url".into(), PropertySpec::required(PropertyType::String));
                s
            },
            Placeholder::default(),
            Category::Inline,
        ),
        ComponentDescriptor::new(
            "accordion",
            {
                let mut s = Schema::new();
                s.insert("steps".into(), PropertySpec::required(PropertyType::Array));
                s
            },
            Placeholder::default(),
            Category::Block,
        ),
        ComponentDescriptor::new(
            "chart",
            {
                let mut s = Schema::new();
                s.insert("series".into(), PropertySpec::required(PropertyType::Array));
                s.insert(
                    "kind".into(),
                    PropertySpec::optional(PropertyType::Enum, json!("line"))
                        .with_enum_values(["line", "bar", "pie"]),
                );
                s
            },
            Placeholder::default(),
            Category::Block,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_registry_has_builtins() {
        let registry = default();
        assert!(registry.has("alert"));
        assert!(registry.has("table-plus"));
        assert_eq!(registry.list().count(), 9);
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = Registry::new();
        let mut events: Vec<()> = Vec::new();
        registry.bus.on(crate::bus::EventKind::RegistryRegistered, {
            let _ = &mut events;
            move |_e| {}
        });
        registry.register(ComponentDescriptor::new(
            "alert",
            Schema::new(),
            Placeholder::default(),
            Category::Block,
        ));
        registry.register(ComponentDescriptor::new(
            "alert",
            Schema::new(),
            Placeholder::default(),
            Category::Block,
        ));
        assert_eq!(registry.list().count(), 1);
    }

    #[test]
    fn validate_unregistered_name_yields_component_error() {
        let mut registry = Registry::new();
        let result = registry.validate("widget", &Props::new());
        assert!(!result.valid);
        assert_eq!(result.errors[0].prop, "_component");
    }

    #[test]
    fn apply_defaults_delegates_to_schema() {
        let registry = default();
        let mut props = Props::new();
        props.insert("text".into(), json!("hi"));
        let out = registry.apply_defaults("alert", &props);
        assert_eq!(out.get("type"), Some(&json!("info")));
    }

    #[test]
    fn get_placeholder_falls_back_for_unregistered_name() {
        let registry = Registry::new();
        let placeholder = registry.get_placeholder("widget");
        assert_eq!(placeholder.min_height_px, 48);
    }

    #[test]
    fn map_accepts_either_an_address_or_a_coordinate_pair() {
        let mut registry = default();
        let mut by_address = Props::new();
        by_address.insert("address".into(), json!("1600 Amphitheatre Parkway"));
        assert!(registry.validate("map", &by_address).valid);

        let mut by_coords = Props::new();
        by_coords.insert("lat".into(), json!(37.422));
        by_coords.insert("lng".into(), json!(-122.084));
        assert!(registry.validate("map", &by_coords).valid);
    }
}
