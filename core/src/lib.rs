//! # livellm-core
//!
//! Turns LLM-produced Markdown into a live, interactive document: a
//! streaming incremental parser that materialises embedded components as
//! their directive bodies arrive, a pattern-detection transformer that
//! enriches plain prose (tables, questions, addresses, code, links, step
//! lists, data series) into the same directive grammar, and the component
//! registry/schema layer that validates and defaults every directive
//! against its descriptor.
//!
//! ## Architecture Overview
//!
//! - **`dom`**: the Rust-native stand-in for "the DOM" — an ordered
//!   sequence of rendered blocks, mutated the way a real DOM subtree would
//!   be (append text, insert a placeholder, swap it for the finished
//!   component or a fallback/error card).
//! - **`directive`**: the directive grammar shared by every entry point —
//!   a type name, a JSON props object, and whether it was written as a
//!   fenced block or an inline span.
//! - **`registry`**: the catalogue of component descriptors (schema,
//!   placeholder, category, optional lazy loader) that directives are
//!   checked against.
//! - **`schema`**: pure property validation and defaulting, independent of
//!   the registry that owns a given schema.
//! - **`directive_resolve`**: the single directive-body resolution pipeline
//!   (size cap, identifier check, JSON parse, registry lookup, schema
//!   validation, defaulting) shared by the static parser, the stream
//!   renderer, and the mutation observer, so all three treat the same body
//!   identically.
//! - **`parser`**: the static renderer's Markdown pass — wraps the
//!   `markdown` tokenizer, protects directive spans from it, and resolves
//!   them via `directive_resolve`.
//! - **`stream`**: the incremental renderer — a character-driven state
//!   machine that keeps a `Document` live as chunks arrive, plus transport
//!   adapters for byte streams and message-oriented wire protocols.
//! - **`detect`** / **`transform`**: the seven built-in pattern detectors
//!   and the `Transformer` that runs them, resolves overlaps, and splices
//!   accepted matches into the source as directives.
//! - **`action`**: routes user interactions with a materialised component
//!   back to the host, with an optional preview/confirm step.
//! - **`observe`**: debounced re-scanning of a `Document` for directives a
//!   host mutated in without going through the parser or stream renderer.
//! - **`bus`**: the per-instance pub/sub hub every other module reports its
//!   lifecycle through, instead of an out-of-band side channel.
//! - **`scheduler`**: abstracts the host's frame-callback primitive so the
//!   stream renderer can coalesce text renders without depending on a real
//!   browser or a particular async runtime.
//! - **`wire`**: the streaming transport's wire format.
//! - **`config`**: host-supplied configuration and its defaults.
//! - **`render`**: the static (non-streaming) render entry point, built on
//!   top of `transform` and `parser`.
//! - **`error`**: domain-specific error types.
//!
//! ### Rendering pipeline
//!
//! ```text
//! Markdown source
//!     |
//!     +-> Transformer::transform (pattern detection, Auto mode only)
//!     |
//!     +-> Parser::parse / StreamRenderer::push (directive resolution)
//!     |
//!     +-> Document (ordered Text/Placeholder/Component/ErrorCard/FallbackCard blocks)
//!             |
//!             +-> Document::to_html
//! ```
//!
//! ## Concurrency model
//!
//! Every stateful type here (`Registry`, `Parser`, `Transformer`,
//! `StreamRenderer`, `Router`, `Observer`) is a plain owned value with its
//! own `EventBus`, not a shared global behind a lock. A host embedding this
//! crate in a multi-threaded server gives each request or session its own
//! instances; nothing here reaches across threads.
//!
//! ## Usage Example
//!
//! ```no_run
//! use livellm_core::registry;
//! use livellm_core::parser::Parser;
//!
//! let mut reg = registry::default();
//! let mut parser = Parser::new();
//! let document = parser.parse("Hello **world**", &mut reg);
//! println!("{}", document.to_html());
//! ```

#![deny(missing_docs)]

pub mod action;
pub mod bus;
pub mod config;
pub mod detect;
pub mod directive;
pub mod directive_resolve;
pub mod dom;
pub mod error;
pub mod observe;
pub mod parser;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod schema;
pub mod stream;
pub mod transform;
pub mod wire;
