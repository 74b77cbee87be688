//! The incremental parser: consumes a chunk at a time, classifies the
//! stream character by character, and keeps the [`dom::Document`] live as
//! new content arrives instead of waiting for the generation to finish.
//!
//! Plain text is rendered on a coalesced cadence (at most once per frame,
//! via a [`FrameScheduler`]) since re-parsing Markdown on every token would
//! waste work nobody can see between frames. Component lifecycle changes —
//! opening a placeholder, swapping it for the finished component or a
//! fallback — happen immediately, out of band from that cadence, since a
//! placeholder left stale even one frame looks broken.

use crate::bus::{Event, EventBus};
use crate::directive_resolve::resolve_directive;
use crate::dom::{Block, BlockId, Document};
use crate::parser;
use crate::registry::Registry;
use crate::scheduler::{FrameScheduler, ImmediateScheduler, ScheduledId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;

static COMPONENT_FENCE_INFO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^livellm:([A-Za-z_][A-Za-z0-9_-]*)$").expect("static fence info regex"));

/// The fence info-string line is rejected once it exceeds this length
/// without a newline; real directive type names are short identifiers.
const MAX_INFO_LINE_LEN: usize = 64;

/// Which part of a fenced component directive the renderer is currently
/// looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Nothing has arrived yet.
    Idle,
    /// Accumulating plain prose.
    Text,
    /// Saw three backticks; reading the fence's info string up to the
    /// newline, to decide whether this is a component directive.
    FenceMaybe,
    /// Inside a recognised component directive's JSON body.
    Component,
    /// `end()` (or `abort()`) has run; further chunks are ignored.
    Done,
}

struct Inner {
    document: Document,
    text_block_id: Option<BlockId>,
}

/// Drives a [`Document`] from a stream of text chunks, materialising
/// component directives as soon as their closing fence arrives.
pub struct StreamRenderer {
    state: StreamState,
    fence_accum: String,
    info_line: String,
    text_accum: String,
    component_json: String,
    component_type: String,
    placeholder_id: Option<BlockId>,
    aborted: bool,
    max_json_size: usize,
    inner: Rc<RefCell<Inner>>,
    scheduler: Box<dyn FrameScheduler>,
    pending_frame: Option<ScheduledId>,
    /// Lifecycle events (`stream:connected`, `stream:component:start`, ...).
    pub bus: EventBus,
}

impl Default for StreamRenderer {
    /// A renderer backed by an [`ImmediateScheduler`]: text renders happen
    /// synchronously on every `push`. Suitable for tests and for hosts with
    /// no real frame-callback primitive to drive cadence from.
    fn default() -> Self {
        Self::new(Box::new(ImmediateScheduler::new()))
    }
}

impl StreamRenderer {
    /// A renderer that coalesces text renders through `scheduler`.
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            state: StreamState::Idle,
            fence_accum: String::new(),
            info_line: String::new(),
            text_accum: String::new(),
            component_json: String::new(),
            component_type: String::new(),
            placeholder_id: None,
            aborted: false,
            max_json_size: crate::directive_resolve::DEFAULT_MAX_JSON_SIZE,
            inner: Rc::new(RefCell::new(Inner {
                document: Document::new(),
                text_block_id: None,
            })),
            scheduler,
            pending_frame: None,
            bus: EventBus::new(),
        }
    }

    /// Overrides the maximum accepted directive body size, in bytes.
    pub fn with_max_json_size(mut self, max_json_size: usize) -> Self {
        self.max_json_size = max_json_size;
        self
    }

    /// True once `end()` or `abort()` has run.
    pub fn is_done(&self) -> bool {
        self.state == StreamState::Done
    }

    /// True once `abort()` has run.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// A read-only snapshot of the document as it currently stands.
    pub fn document(&self) -> std::cell::Ref<'_, Document> {
        std::cell::Ref::map(self.inner.borrow(), |inner| &inner.document)
    }

    /// Feeds the next chunk of generated text into the state machine.
    /// No-op once the stream is done or aborted.
    pub fn push(&mut self, chunk: &str, registry: &mut Registry) {
        if self.aborted || self.state == StreamState::Done {
            return;
        }
        for c in chunk.chars() {
            self.process_char(c, registry);
        }
        if self.state != StreamState::Done {
            self.schedule_render();
        }
    }

    /// Signals normal end of stream: flushes any buffered text, resolves an
    /// in-flight component against whatever body it managed to accumulate
    /// (falling back to a fallback card if it never closed), and marks the
    /// container's actions bound.
    pub fn end(&mut self, registry: &mut Registry) {
        self.finalize(registry);
    }

    /// Signals an abnormal stop: identical finalisation to `end`, but marks
    /// the renderer aborted so any later `push` is rejected outright. No
    /// further DOM mutation or bus emission happens after this returns.
    pub fn abort(&mut self, registry: &mut Registry) {
        if self.state == StreamState::Done {
            self.aborted = true;
            return;
        }
        self.finalize(registry);
        self.aborted = true;
    }

    fn finalize(&mut self, registry: &mut Registry) {
        if self.state == StreamState::Done {
            return;
        }
        match self.state {
            StreamState::FenceMaybe => {
                self.text_accum.push_str("```");
                self.text_accum.push_str(&self.info_line);
                self.info_line.clear();
            }
            StreamState::Component => {
                let reason = "stream ended before the component's closing fence arrived";
                let block = Block::FallbackCard {
                    reason: reason.to_string(),
                    raw: self.component_json.clone(),
                };
                if let Some(id) = self.placeholder_id.take() {
                    self.inner.borrow_mut().document.replace(id, block);
                }
                self.component_json.clear();
                self.component_type.clear();
            }
            _ => {}
        }
        if !self.fence_accum.is_empty() {
            self.text_accum.push_str(&self.fence_accum);
            self.fence_accum.clear();
        }
        self.flush_text_immediate();
        self.inner.borrow_mut().document.mark_actions_bound();
        self.bus.emit(Event::StreamEnd);
        self.state = StreamState::Done;
    }

    fn process_char(&mut self, c: char, registry: &mut Registry) {
        match self.state {
            StreamState::Idle => {
                self.bus.emit(Event::StreamConnected);
                self.state = StreamState::Text;
                self.process_char(c, registry);
            }
            StreamState::Text => {
                if c == '`' {
                    self.fence_accum.push('`');
                    if self.fence_accum.len() == 3 {
                        self.fence_accum.clear();
                        self.info_line.clear();
                        self.state = StreamState::FenceMaybe;
                    }
                } else {
                    if !self.fence_accum.is_empty() {
                        self.text_accum.push_str(&self.fence_accum);
                        self.fence_accum.clear();
                    }
                    self.text_accum.push(c);
                }
            }
            StreamState::FenceMaybe => {
                if c == '\n' {
                    if let Some(caps) = COMPONENT_FENCE_INFO_RE.captures(self.info_line.trim_end_matches('\r')) {
                        let type_name = caps[1].to_string();
                        self.open_component(type_name, registry);
                    } else {
                        self.text_accum.push_str("```");
                        self.text_accum.push_str(&self.info_line);
                        self.text_accum.push('\n');
                        self.state = StreamState::Text;
                    }
                    self.info_line.clear();
                } else {
                    self.info_line.push(c);
                    if self.info_line.len() > MAX_INFO_LINE_LEN {
                        self.text_accum.push_str("```");
                        self.text_accum.push_str(&self.info_line);
                        self.info_line.clear();
                        self.state = StreamState::Text;
                    }
                }
            }
            StreamState::Component => {
                self.component_json.push(c);
                if self.component_json.ends_with("\n```") {
                    let body = self.component_json[..self.component_json.len() - 4].to_string();
                    self.close_component(body, registry);
                }
            }
            StreamState::Done => {}
        }
    }

    fn open_component(&mut self, type_name: String, registry: &mut Registry) {
        self.flush_text_immediate();
        self.inner.borrow_mut().text_block_id = None;
        let placeholder = registry.get_placeholder(&type_name).markup.clone();
        let id = self.inner.borrow_mut().document.push(Block::Placeholder {
            type_name: type_name.clone(),
            markup: placeholder,
        });
        self.placeholder_id = Some(id);
        self.bus.emit(Event::StreamComponentStart {
            type_name: type_name.clone(),
        });
        self.component_type = type_name;
        self.component_json.clear();
        self.state = StreamState::Component;
    }

    fn close_component(&mut self, body: String, registry: &mut Registry) {
        let outcome = resolve_directive(&self.component_type, &body, self.max_json_size, registry);
        let type_name = self.component_type.clone();
        if let Some(id) = self.placeholder_id.take() {
            self.inner.borrow_mut().document.replace(id, outcome.into_block());
        }
        self.bus.emit(Event::StreamComponentComplete { type_name });
        self.component_json.clear();
        self.component_type.clear();
        self.state = StreamState::Text;
    }

    /// Renders the current `text_accum` into its block right now, bypassing
    /// the frame scheduler. Used at component boundaries and at
    /// end-of-stream, where a stale render for even one frame is wrong.
    fn flush_text_immediate(&mut self) {
        if let Some(id) = self.pending_frame.take() {
            self.scheduler.cancel(id);
        }
        if self.text_accum.is_empty() {
            return;
        }
        let html = parser::render_text(&self.text_accum);
        let mut inner = self.inner.borrow_mut();
        match inner.text_block_id {
            Some(id) => inner.document.replace(id, Block::Text(html)),
            None => {
                let id = inner.document.push(Block::Text(html));
                inner.text_block_id = Some(id);
            }
        }
        drop(inner);
        self.text_accum.clear();
    }

    /// Schedules (or re-schedules, coalescing) a render of the current
    /// `text_accum` on the next frame.
    fn schedule_render(&mut self) {
        let inner = self.inner.clone();
        let html = parser::render_text(&self.text_accum);
        let id = self.scheduler.schedule(Box::new(move || {
            let mut inner = inner.borrow_mut();
            match inner.text_block_id {
                Some(id) => inner.document.replace(id, Block::Text(html)),
                None => {
                    let id = inner.document.push(Block::Text(html));
                    inner.text_block_id = Some(id);
                }
            }
        }));
        self.pending_frame = Some(id);
    }
}

/// Drives a [`StreamRenderer`] from concrete transports: a raw byte stream,
/// and the shared dispatch rules for message-oriented wire protocols
/// (Server-Sent Events and message-socket framing use the same per-frame
/// `{"type": ...}` shape, so one function serves both).
pub mod transport {
    use super::StreamRenderer;
    use crate::registry::Registry;
    use crate::wire::WireEvent;

    /// Feeds a byte-oriented transport (e.g. an HTTP response body) chunk by
    /// chunk. Chunks that aren't valid UTF-8 are logged and dropped rather
    /// than aborting the whole stream — a single torn multi-byte boundary
    /// shouldn't sink an otherwise-healthy generation.
    pub fn drive_byte_stream<I>(renderer: &mut StreamRenderer, registry: &mut Registry, chunks: I)
    where
        I: IntoIterator<Item = std::io::Result<Vec<u8>>>,
    {
        for chunk in chunks {
            if renderer.is_done() {
                break;
            }
            match chunk {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => renderer.push(&text, registry),
                    Err(e) => log::warn!("stream transport: dropping non-UTF-8 chunk: {e}"),
                },
                Err(e) => log::warn!("stream transport: dropping unreadable chunk: {e}"),
            }
        }
        if !renderer.is_done() {
            renderer.end(registry);
        }
    }

    /// Feeds a sequence of already-framed wire events (one JSON object per
    /// SSE `data:` line, or one per message-socket frame) and dispatches
    /// each by its `type`. Unparseable frames are logged and skipped.
    /// `on_metadata`/`on_error` let the host surface the two event kinds
    /// that don't map onto a `Document` mutation.
    pub fn drive_wire_events<I, M, E>(
        renderer: &mut StreamRenderer,
        registry: &mut Registry,
        frames: I,
        mut on_metadata: M,
        mut on_error: E,
    ) where
        I: IntoIterator<Item = String>,
        M: FnMut(&WireEvent),
        E: FnMut(&str, &str),
    {
        for frame in frames {
            if renderer.is_done() {
                break;
            }
            match WireEvent::parse(&frame) {
                Some(WireEvent::Token { token }) => renderer.push(&token, registry),
                Some(event @ WireEvent::Metadata { .. }) => on_metadata(&event),
                Some(WireEvent::Error {
                    code,
                    message,
                    recoverable,
                }) => {
                    on_error(&code, &message);
                    if !recoverable {
                        break;
                    }
                }
                Some(WireEvent::Done { .. }) => break,
                None => log::warn!("stream transport: skipping unparseable wire frame"),
            }
        }
        if !renderer.is_done() {
            renderer.end(registry);
        }
    }
}
