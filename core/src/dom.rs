//! A Rust-native stand-in for "the DOM".
//!
//! Outside of a browser there is nowhere for the rendered output to live, so
//! this module gives it one: a [`Document`] is an ordered sequence of
//! [`Block`]s, mutated the same way the source system mutates a real DOM
//! subtree (append text, insert a placeholder, replace a placeholder with
//! its finished component or a fallback/error card). A `Document` can be
//! walked directly by tests and host code, or flattened to an HTML string
//! for the static-render path.

use crate::directive::Props;
use std::fmt::Write as _;

/// A unique handle to a block within a [`Document`], stable across mutation
/// of other blocks. Used by the stream renderer to address the placeholder
/// it is about to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) usize);

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Rendered prose HTML produced by the parser from a markdown fragment.
    Text(String),
    /// A visible stand-in inserted while a streaming component's body is
    /// still arriving.
    Placeholder {
        /// The directive type this placeholder is waiting on.
        type_name: String,
        /// Host-facing placeholder markup from the component's descriptor.
        markup: String,
    },
    /// A fully materialised, schema-valid component.
    Component {
        /// The directive's type name.
        type_name: String,
        /// `livellm-<type_name>`, the tag a host renderer would use.
        tag_name: String,
        /// Defaults-applied, validated props.
        props: Props,
    },
    /// A directive that was well-formed but failed schema validation.
    ErrorCard {
        /// The directive's type name, if known.
        type_name: String,
        /// One message per violated schema rule.
        errors: Vec<String>,
        /// The raw directive body, for diagnosis.
        raw: String,
    },
    /// A directive that could not be honoured at all: malformed JSON,
    /// unknown type, oversize body, or an aborted stream.
    FallbackCard {
        /// Human-readable reason the directive could not be rendered.
        reason: String,
        /// The raw directive body, for diagnosis.
        raw: String,
    },
}

impl Block {
    /// Renders this block to an HTML fragment.
    pub fn to_html(&self) -> String {
        match self {
            Block::Text(html) => html.clone(),
            Block::Placeholder { type_name, markup } => {
                format!(
                    "<livellm-placeholder data-livellm=\"{}\">{}</livellm-placeholder>",
                    escape_attr(type_name),
                    markup
                )
            }
            Block::Component {
                type_name,
                tag_name,
                props,
            } => {
                let props_json =
                    serde_json::to_string(props).unwrap_or_else(|_| "{}".to_string());
                format!(
                    "<{tag} data-livellm=\"{ty}\" data-props=\"{props}\"></{tag}>",
                    tag = tag_name,
                    ty = escape_attr(type_name),
                    props = escape_attr(&props_json),
                )
            }
            Block::ErrorCard {
                type_name,
                errors,
                raw,
            } => {
                let mut list = String::new();
                for e in errors {
                    let _ = write!(list, "<li>{}</li>", escape_text(e));
                }
                format!(
                    "<div class=\"livellm-error-card\" data-livellm-type=\"{}\"><ul>{}</ul><pre>{}</pre></div>",
                    escape_attr(type_name),
                    list,
                    escape_text(raw)
                )
            }
            Block::FallbackCard { reason, raw } => format!(
                "<div class=\"livellm-fallback-card\"><p>{}</p><pre>{}</pre></div>",
                escape_text(reason),
                escape_text(raw)
            ),
        }
    }
}

/// An ordered sequence of rendered blocks — this crate's realization of a
/// "container" the host would otherwise hand the system a real DOM node for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
    actions_bound: bool,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the container as having its action delegation wired up. The
    /// host is responsible for the actual event listener; this flag is what
    /// lets the end-of-stream and static-render paths assert they reached
    /// that step.
    pub fn mark_actions_bound(&mut self) {
        self.actions_bound = true;
    }

    /// Whether [`Document::mark_actions_bound`] has been called.
    pub fn actions_bound(&self) -> bool {
        self.actions_bound
    }

    /// Appends a block, returning its stable id.
    pub fn push(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    /// Replaces the block at `id` in place. No-op if `id` is stale (the
    /// document was cleared since it was issued).
    pub fn replace(&mut self, id: BlockId, block: Block) {
        if let Some(slot) = self.blocks.get_mut(id.0) {
            *slot = block;
        }
    }

    /// Drops every block, returning the container to its initial state.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.actions_bound = false;
    }

    /// Read-only view of the blocks, in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Components of a given type currently present in the document.
    pub fn components_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a Props> + 'a {
        self.blocks.iter().filter_map(move |b| match b {
            Block::Component {
                type_name: t,
                props,
                ..
            } if t == type_name => Some(props),
            _ => None,
        })
    }

    /// Concatenated textual content of every `Text` block, stripped of HTML
    /// tags. This is what the "final DOM textual content" invariant in the
    /// testable-properties section checks against.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            if let Block::Text(html) = block {
                out.push_str(&strip_tags(html));
            }
        }
        out
    }

    /// Serializes the whole document to an HTML string, in order.
    pub fn to_html(&self) -> String {
        self.blocks.iter().map(Block::to_html).collect()
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Escapes a string for safe inclusion inside a double-quoted HTML
/// attribute. Mandatory for serialised props, per the directive grammar.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a string for safe inclusion as HTML text content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
