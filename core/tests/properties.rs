//! Property-based invariants that should hold for any input, not just the
//! handful of examples the unit tests hardcode.

use livellm_core::directive::Props;
use livellm_core::registry;
use livellm_core::render::render;
use livellm_core::schema::{apply_defaults, validate, PropertySpec, PropertyType, Schema};
use livellm_core::stream::StreamRenderer;
use livellm_core::transform::{Mode, Transformer};
use proptest::prelude::*;
use serde_json::json;

fn arb_schema_and_props() -> impl Strategy<Value = (Schema, Props)> {
    let spec = prop_oneof![
        Just((PropertyType::String, json!("x"))),
        Just((PropertyType::Number, json!(1))),
        Just((PropertyType::Boolean, json!(true))),
    ];
    prop::collection::vec(("[a-z][a-z0-9_]{0,8}", spec, any::<bool>()), 0..6).prop_map(|fields| {
        let mut schema = Schema::new();
        let mut props = Props::new();
        for (name, (kind, default), present) in fields {
            schema.insert(
                name.clone(),
                PropertySpec::optional(kind, default.clone()),
            );
            if present {
                props.insert(name, default);
            }
        }
        (schema, props)
    })
}

proptest! {
    /// Applying defaults twice never differs from applying them once: the
    /// second pass finds nothing absent left to fill in.
    #[test]
    fn apply_defaults_is_idempotent((schema, props) in arb_schema_and_props()) {
        let once = apply_defaults(&schema, &props);
        let twice = apply_defaults(&schema, &once);
        prop_assert_eq!(once, twice);
    }

    /// A props object produced by `apply_defaults` always validates clean
    /// against the same schema, since every optional field now has either
    /// its caller-supplied value or its declared default.
    #[test]
    fn defaulted_props_always_validate((schema, props) in arb_schema_and_props()) {
        let defaulted = apply_defaults(&schema, &props);
        let result = validate(&schema, &defaulted);
        prop_assert!(result.valid, "errors: {:?}", result.errors);
    }

    /// With no detectors registered, Auto-mode transform is the identity
    /// function regardless of source content.
    #[test]
    fn transform_with_no_detectors_is_identity(source in ".{0,200}") {
        let mut t = Transformer::new(Mode::Auto);
        prop_assert_eq!(t.transform(&source), source);
    }

    /// Off mode is the identity function even with every detector
    /// registered and enabled.
    #[test]
    fn off_mode_is_identity_even_with_builtins_registered(source in ".{0,200}") {
        let mut t = Transformer::new(Mode::Off);
        t.register_builtins();
        prop_assert_eq!(t.transform(&source), source);
    }

    /// A directive body resolved through the static parser and the same
    /// body fed through the stream renderer character by character produce
    /// the same materialised props, for any well-formed alert body.
    #[test]
    fn static_and_streaming_paths_agree_on_well_formed_bodies(text in "[a-zA-Z0-9 .,!?]{0,80}") {
        let body = json!({ "text": text }).to_string();
        let source = format!("```livellm:alert\n{body}\n```\n");

        let mut reg_static = registry::default();
        let static_doc = render(&source, &mut reg_static, None);
        let static_props = static_doc.components_of_type("alert").next().cloned();

        let mut reg_stream = registry::default();
        let mut renderer = StreamRenderer::default();
        for ch in source.chars() {
            renderer.push(&ch.to_string(), &mut reg_stream);
        }
        renderer.end(&mut reg_stream);
        let stream_doc = renderer.document();
        let stream_props = stream_doc.components_of_type("alert").next().cloned();

        prop_assert_eq!(static_props, stream_props);
    }

    /// Feeding a stream renderer arbitrary text with no backticks at all
    /// never produces a component, placeholder, or error/fallback card —
    /// there is nothing in it that could be mistaken for a directive.
    #[test]
    fn plain_prose_with_no_backticks_never_materialises_a_directive(
        text in "[a-zA-Z0-9 .,!?\n]{0,300}"
    ) {
        prop_assume!(!text.contains('`'));
        let mut reg = registry::default();
        let mut renderer = StreamRenderer::default();
        renderer.push(&text, &mut reg);
        renderer.end(&mut reg);
        let doc = renderer.document();
        prop_assert!(doc.blocks().iter().all(|b| matches!(b, livellm_core::dom::Block::Text(_))));
    }
}
