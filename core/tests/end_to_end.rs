//! End-to-end scenarios exercising the whole pipeline (transformer, parser,
//! stream renderer, observer, action routing) the way a host actually
//! drives them, rather than one module at a time.

use livellm_core::action::{format_as_message, Action, ActionMetadata, Router};
use livellm_core::dom::Block;
use livellm_core::observe::Observer;
use livellm_core::registry;
use livellm_core::render::render;
use livellm_core::scheduler::ImmediateScheduler;
use livellm_core::stream::StreamRenderer;
use livellm_core::transform::{Mode, Transformer};
use serde_json::json;

#[test]
fn a_complete_message_with_a_table_is_rendered_through_the_transformer_and_parser() {
    let mut reg = registry::default();
    let mut transformer = Transformer::new(Mode::Auto);
    transformer.register_builtins();
    let source = "Here are the results:\n\n| name | score |\n|---|---|\n| a | 1 |\n| b | 2 |\n";
    let document = render(source, &mut reg, Some(&mut transformer));
    assert!(document
        .blocks()
        .iter()
        .any(|b| matches!(b, Block::Component { type_name, .. } if type_name == "table-plus")));
    assert!(document.actions_bound());
}

#[test]
fn a_streamed_response_materialises_a_component_and_resumes_prose_after_it() {
    let mut reg = registry::default();
    let mut renderer = StreamRenderer::default();
    for chunk in [
        "Summary: disk usage is high.\n\n",
        "```livellm:alert\n",
        "{\"type\":\"warning\",\"text\":\"Disk usage is above 90%\"}",
        "\n```\n\n",
        "Consider freeing up space.",
    ] {
        renderer.push(chunk, &mut reg);
    }
    renderer.end(&mut reg);

    let doc = renderer.document();
    let blocks = doc.blocks();
    assert!(blocks.len() >= 3, "expected text, component, text blocks, got {blocks:?}");
    assert!(matches!(blocks.first(), Some(Block::Text(_))));
    assert!(blocks
        .iter()
        .any(|b| matches!(b, Block::Component { type_name, .. } if type_name == "alert")));
    assert!(blocks.last().unwrap().to_html().contains("freeing up space"));
    assert!(doc.actions_bound());
}

#[test]
fn a_connection_drop_mid_component_leaves_a_diagnosable_fallback_card_not_a_broken_component() {
    let mut reg = registry::default();
    let mut renderer = StreamRenderer::default();
    renderer.push("Partial alert incoming.\n\n```livellm:alert\n{\"text\":\"uns", &mut reg);
    renderer.abort(&mut reg);

    assert!(renderer.is_aborted());
    let doc = renderer.document();
    assert!(!doc.blocks().iter().any(|b| matches!(b, Block::Component { .. })));
    assert!(doc.blocks().iter().any(|b| matches!(b, Block::FallbackCard { .. })));
    assert!(doc.actions_bound());
}

#[test]
fn a_malformed_directive_body_renders_as_a_fallback_card_never_a_panic() {
    let mut reg = registry::default();
    let source = "```livellm:alert\n{\"text\": not json\n```";
    let document = render(source, &mut reg, None);
    assert!(document
        .blocks()
        .iter()
        .any(|b| matches!(b, Block::FallbackCard { .. })));
}

#[test]
fn a_schema_violation_renders_as_an_error_card_distinct_from_a_fallback() {
    let mut reg = registry::default();
    // "alert" requires "text"; omit it.
    let source = "```livellm:alert\n{\"type\":\"info\"}\n```";
    let document = render(source, &mut reg, None);
    assert!(document
        .blocks()
        .iter()
        .any(|b| matches!(b, Block::ErrorCard { type_name, .. } if type_name == "alert")));
}

#[test]
fn a_host_mutated_container_is_picked_up_by_the_observer_exactly_once() {
    let mut reg = registry::default();
    let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
    let transcript = "The assistant says:\n\n```livellm:alert\n{\"text\":\"hi\"}\n```\n";

    let first_pass = observer.scan(transcript, &mut reg);
    assert_eq!(first_pass.len(), 1);

    // A host appends more prose without touching the existing directive.
    let appended = format!("{transcript}\nAnd one more thing.");
    let second_pass = observer.scan(&appended, &mut reg);
    assert!(second_pass.is_empty(), "unchanged directive should not be re-resolved");
}

#[test]
fn a_choice_action_round_trips_through_the_router_and_formats_for_the_transcript() {
    let mut router = Router::new(true);
    let mut sent = Vec::new();
    let action = Action {
        component: "choice".into(),
        action: "select".into(),
        value: json!("restart-service"),
        label: "Restart the service".into(),
        metadata: ActionMetadata::now("choice-42").with_question_context("What should we do?"),
    };
    router.dispatch(action.clone(), &mut |a| sent.push(a.clone()));
    assert_eq!(sent.len(), 1);
    assert_eq!(format_as_message(&sent[0]), "Restart the service: restart-service");
}

#[test]
fn a_confirm_action_is_held_until_the_host_confirms_it() {
    let mut router = Router::new(false);
    let mut sent = Vec::new();
    let action = Action {
        component: "confirm".into(),
        action: "confirm".into(),
        value: json!(true),
        label: "Delete all drafts".into(),
        metadata: ActionMetadata::now("confirm-1"),
    };
    router.dispatch(action, &mut |a| sent.push(a.clone()));
    assert!(sent.is_empty());
    assert!(router.has_pending());
    router.confirm(&mut |a| sent.push(a.clone()));
    assert_eq!(sent.len(), 1);
    assert_eq!(format_as_message(&sent[0]), "Confirmed: Delete all drafts");
}

#[test]
fn the_static_and_streaming_paths_agree_on_the_same_directive_body() {
    let source = "```livellm:alert\n{\"text\":\"same everywhere\"}\n```\n";

    let mut reg_static = registry::default();
    let static_doc = render(source, &mut reg_static, None);
    let static_component = static_doc
        .blocks()
        .iter()
        .find_map(|b| match b {
            Block::Component { type_name, props, .. } if type_name == "alert" => Some(props.clone()),
            _ => None,
        })
        .expect("static path should materialise the component");

    let mut reg_stream = registry::default();
    let mut renderer = StreamRenderer::default();
    renderer.push(source, &mut reg_stream);
    renderer.end(&mut reg_stream);
    let stream_doc = renderer.document();
    let stream_component = stream_doc
        .blocks()
        .iter()
        .find_map(|b| match b {
            Block::Component { type_name, props, .. } if type_name == "alert" => Some(props.clone()),
            _ => None,
        })
        .expect("stream path should materialise the component");

    assert_eq!(static_component, stream_component);
}
