//! The static (non-streaming) render entry point: run the transformer over
//! the source, parse it, sanitise the result, and mark actions bound — the
//! same pipeline a host that already has the whole message up front uses
//! instead of [`crate::stream::StreamRenderer`].

use crate::dom::Document;
use crate::parser::Parser;
use crate::registry::Registry;
use crate::transform::Transformer;

/// Something that can clean HTML before it reaches the host. The default is
/// the identity function; a host embedding this in a browser would plug in
/// a real sanitiser (e.g. an allowlist-based one) here instead.
pub trait Sanitizer {
    /// Returns a safe version of `html`.
    fn sanitize(&self, html: &str) -> String;
}

/// Passes HTML through unchanged. [`Block::to_html`](crate::dom::Block::to_html)
/// already escapes every value it interpolates, so this is a reasonable
/// default for hosts that don't need an additional allowlist pass.
pub struct IdentitySanitizer;

impl Sanitizer for IdentitySanitizer {
    fn sanitize(&self, html: &str) -> String {
        html.to_string()
    }
}

/// Runs the full static pipeline: transform (if `transformer` is `Some`),
/// parse, and return the resulting [`Document`] with its actions marked
/// bound. Returns the `Document` rather than a string so callers can still
/// inspect individual blocks (e.g. `components_of_type`) before flattening.
pub fn render(
    source: &str,
    registry: &mut Registry,
    transformer: Option<&mut Transformer>,
) -> Document {
    let transformed;
    let effective_source = match transformer {
        Some(t) => {
            transformed = t.transform(source);
            transformed.as_str()
        }
        None => source,
    };
    let mut parser = Parser::new();
    let mut document = parser.parse(effective_source, registry);
    document.mark_actions_bound();
    document
}

/// Runs [`render`] and flattens the result straight to an HTML string
/// through `sanitizer`.
pub fn render_to_string(
    source: &str,
    registry: &mut Registry,
    transformer: Option<&mut Transformer>,
    sanitizer: &dyn Sanitizer,
) -> String {
    let document = render(source, registry, transformer);
    sanitizer.sanitize(&document.to_html())
}

/// Returns a container to its initial, empty state. A thin wrapper over
/// [`Document::clear`] so the render entry points live in one place from a
/// host's point of view (render, render_to_string, clear).
pub fn clear(document: &mut Document) {
    document.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::transform::Mode;

    #[test]
    fn render_parses_plain_markdown_and_marks_actions_bound() {
        let mut reg = registry::default();
        let document = render("Hello **world**", &mut reg, None);
        assert!(document.to_html().contains("<strong>world</strong>"));
        assert!(document.actions_bound());
    }

    #[test]
    fn render_with_a_transformer_enriches_before_parsing() {
        let mut reg = registry::default();
        let mut transformer = Transformer::new(Mode::Auto);
        transformer.register_builtins();
        let source = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let document = render(source, &mut reg, Some(&mut transformer));
        assert!(document
            .blocks()
            .iter()
            .any(|b| matches!(b, crate::dom::Block::Component { type_name, .. } if type_name == "table-plus")));
    }

    #[test]
    fn render_to_string_applies_the_sanitizer() {
        struct Uppercase;
        impl Sanitizer for Uppercase {
            fn sanitize(&self, html: &str) -> String {
                html.to_uppercase()
            }
        }
        let mut reg = registry::default();
        let out = render_to_string("hi", &mut reg, None, &Uppercase);
        assert!(out.contains("HI"));
    }

    #[test]
    fn clear_empties_the_document() {
        let mut reg = registry::default();
        let mut document = render("hi", &mut reg, None);
        clear(&mut document);
        assert!(document.blocks().is_empty());
    }
}
