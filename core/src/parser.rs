//! Wraps the Markdown tokenizer and recognises embedded component
//! directives, fenced or inline, emitting the resulting [`dom::Block`]s in
//! place of the raw directive text.
//!
//! Directives are protected from the tokenizer the same way the teacher
//! protects JSX spans before handing content to it: find them with a regex
//! pass over the raw source, swap each in for an opaque placeholder token
//! the tokenizer will pass straight through as ordinary text (it uses
//! Unicode private-use characters, which are never markdown-special and
//! never need HTML escaping), run the real markdown pipeline, then walk the
//! output splicing the resolved block's HTML back in over each token.

use crate::bus::{Event, EventBus};
use crate::directive_resolve::{resolve_directive, DirectiveOutcome, DEFAULT_MAX_JSON_SIZE};
use crate::dom::{Block, Document};
use crate::registry::Registry;
use markdown::{to_html_with_options, Options};
use once_cell::sync::Lazy;
use regex::Regex;

/// Delimits a placeholder token; chosen from the Unicode private-use area
/// so it can never collide with real Markdown source text.
const TOKEN_DELIM: char = '\u{E000}';

static BLOCK_DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^```livellm:([A-Za-z_][A-Za-z0-9_-]*)\r?\n([\s\S]*?)\r?\n```[ \t]*$")
        .expect("static block directive regex")
});

static INLINE_DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"`livellm:([A-Za-z_][A-Za-z0-9_-]*)(\{[^`\n]*\})`")
        .expect("static inline directive regex")
});

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:<p>)?\u{E000}(\d+)\u{E000}(?:</p>)?").expect("static placeholder regex")
});

fn placeholder_token(index: usize) -> String {
    format!("{TOKEN_DELIM}{index}{TOKEN_DELIM}")
}

/// Finds every fenced block directive in `source`, in source order, as
/// `(start, end, type_name, raw_body)`. Exposed for the mutation observer,
/// which re-scans host-mutated content the parser never saw.
pub fn find_block_directives(source: &str) -> Vec<(usize, usize, String, String)> {
    BLOCK_DIRECTIVE_RE
        .captures_iter(source)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            (
                whole.start(),
                whole.end(),
                caps[1].to_string(),
                caps[2].to_string(),
            )
        })
        .collect()
}

/// Renders a markdown fragment straight to HTML with no directive scanning.
/// The stream renderer's TEXT state already excises component fences
/// character by character before a fragment ever reaches here, so there is
/// nothing left for the full [`Parser::parse`] pipeline to protect.
pub fn render_text(source: &str) -> String {
    to_html_with_options(source, &Options::gfm())
        .unwrap_or_else(|e| format!("<p>markdown render error: {e}</p>"))
}

/// Wraps the markdown tokenizer and the directive grammar on top of it.
pub struct Parser {
    /// Maximum accepted size, in bytes, of a directive's JSON body.
    pub max_json_size: usize,
    /// Lifecycle events (`parser:start`, `parser:component:found`, ...).
    pub bus: EventBus,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            max_json_size: DEFAULT_MAX_JSON_SIZE,
            bus: EventBus::new(),
        }
    }
}

impl Parser {
    /// A parser with the default body size cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser with a custom maximum directive body size.
    pub fn with_max_json_size(max_json_size: usize) -> Self {
        Self {
            max_json_size,
            ..Self::default()
        }
    }

    /// Parses `source` into a [`Document`]: ordinary markdown becomes
    /// `Text` blocks, recognised directives become `Component`, `ErrorCard`,
    /// or `FallbackCard` blocks in their original position.
    pub fn parse(&mut self, source: &str, registry: &mut Registry) -> Document {
        self.bus.emit(Event::ParserStart);

        let mut blocks_by_index: Vec<Block> = Vec::new();
        let mut protected = source.to_string();

        // Block directives first: a fence's info string can't legally
        // contain backticks, so there's no ambiguity with the inline rule.
        let block_matches: Vec<(usize, usize, String, String)> = BLOCK_DIRECTIVE_RE
            .captures_iter(source)
            .map(|caps| {
                let whole = caps.get(0).unwrap();
                (
                    whole.start(),
                    whole.end(),
                    caps[1].to_string(),
                    caps[2].to_string(),
                )
            })
            .collect();

        for (start, end, type_name, body) in block_matches.into_iter().rev() {
            let outcome = self.resolve_and_report(&type_name, &body, registry);
            let index = blocks_by_index.len();
            blocks_by_index.push(outcome.into_block());
            let placeholder = format!("\n\n{}\n\n", placeholder_token(index));
            protected.replace_range(start..end, &placeholder);
        }

        // Inline directives over what's left (block placeholders are plain
        // tokens and never match the inline backtick pattern).
        let scan_target = protected.clone();
        let inline_matches: Vec<(usize, usize, String, String)> = INLINE_DIRECTIVE_RE
            .captures_iter(&scan_target)
            .map(|caps| {
                let whole = caps.get(0).unwrap();
                let type_name = caps[1].to_string();
                let braces = &caps[2];
                (whole.start(), whole.end(), type_name, braces.to_string())
            })
            .collect();

        for (start, end, type_name, body) in inline_matches.into_iter().rev() {
            let outcome = self.resolve_and_report(&type_name, &body, registry);
            let index = blocks_by_index.len();
            blocks_by_index.push(outcome.into_block());
            protected.replace_range(start..end, &placeholder_token(index));
        }

        let html = to_html_with_options(&protected, &Options::gfm())
            .unwrap_or_else(|e| format!("<p>markdown render error: {e}</p>"));

        let document = self.restore(&html, blocks_by_index);
        self.bus.emit(Event::ParserComplete);
        document
    }

    fn resolve_and_report(
        &mut self,
        type_name: &str,
        body: &str,
        registry: &mut Registry,
    ) -> DirectiveOutcome {
        let outcome = resolve_directive(type_name, body, self.max_json_size, registry);
        match &outcome {
            DirectiveOutcome::Component { type_name, .. } => {
                self.bus.emit(Event::ParserComponentFound {
                    type_name: type_name.clone(),
                });
            }
            DirectiveOutcome::SchemaError { type_name, .. } => {
                self.bus.emit(Event::ParserError {
                    message: format!("schema validation failed for \"{type_name}\""),
                });
            }
            DirectiveOutcome::Fallback { reason, .. } => {
                self.bus.emit(Event::ParserError {
                    message: reason.clone(),
                });
            }
        }
        outcome
    }

    fn restore(&self, html: &str, resolved: Vec<Block>) -> Document {
        let mut document = Document::new();
        let mut cursor = 0;
        for caps in PLACEHOLDER_RE.captures_iter(html) {
            let whole = caps.get(0).unwrap();
            if whole.start() > cursor {
                document.push(Block::Text(html[cursor..whole.start()].to_string()));
            }
            let index: usize = caps[1].parse().unwrap_or(usize::MAX);
            if let Some(block) = resolved.get(index) {
                document.push(block.clone());
            }
            cursor = whole.end();
        }
        if cursor < html.len() {
            document.push(Block::Text(html[cursor..].to_string()));
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn plain_markdown_becomes_a_single_text_block() {
        let mut parser = Parser::new();
        let mut reg = registry::default();
        let doc = parser.parse("Hello **world**", &mut reg);
        assert_eq!(doc.blocks().len(), 1);
        assert!(matches!(doc.blocks()[0], Block::Text(_)));
        assert!(doc.to_html().contains("<strong>world</strong>"));
    }

    #[test]
    fn block_directive_becomes_a_component() {
        let mut parser = Parser::new();
        let mut reg = registry::default();
        let source =
            "Here is an alert:\n\n```livellm:alert\n{\"type\":\"info\",\"text\":\"Hi\"}\n```\nAfter.";
        let doc = parser.parse(source, &mut reg);
        let components: Vec<_> = doc
            .blocks()
            .iter()
            .filter(|b| matches!(b, Block::Component { .. }))
            .collect();
        assert_eq!(components.len(), 1);
        if let Block::Component { type_name, props, .. } = components[0] {
            assert_eq!(type_name, "alert");
            assert_eq!(props.get("text"), Some(&serde_json::json!("Hi")));
        }
    }

    #[test]
    fn broken_json_becomes_fallback_card_not_a_component() {
        let mut parser = Parser::new();
        let mut reg = registry::default();
        let source = "```livellm:alert\n{\"type\":\"info\"\n```";
        let doc = parser.parse(source, &mut reg);
        assert!(doc
            .blocks()
            .iter()
            .any(|b| matches!(b, Block::FallbackCard { .. })));
        assert!(!doc
            .blocks()
            .iter()
            .any(|b| matches!(b, Block::Component { .. })));
    }

    #[test]
    fn inline_directive_is_recognised() {
        let mut parser = Parser::new();
        let mut reg = registry::default();
        let source = "See `livellm:link-preview{\"url\":\"https://example.com\"}` for details.";
        let doc = parser.parse(source, &mut reg);
        assert!(doc.blocks().iter().any(
            |b| matches!(b, Block::Component { type_name, .. } if type_name == "link-preview")
        ));
    }

    #[test]
    fn unknown_inline_type_falls_back() {
        let mut parser = Parser::new();
        let mut reg = registry::default();
        let source = "Try `livellm:widget{}` here.";
        let doc = parser.parse(source, &mut reg);
        assert!(doc
            .blocks()
            .iter()
            .any(|b| matches!(b, Block::FallbackCard { .. })));
    }
}
