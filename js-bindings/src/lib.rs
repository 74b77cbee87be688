//! Node.js bindings over `livellm-core`: a static renderer and a streaming
//! session, both backed by a process-wide component registry so every
//! `Renderer`/`StreamSession` a host constructs shares the same catalogue
//! without re-registering built-ins on every call.

use livellm_core::action::{format_as_message, Action, Router};
use livellm_core::registry::{self, Registry};
use livellm_core::render::{render_to_string, IdentitySanitizer};
use livellm_core::scheduler::ImmediateScheduler;
use livellm_core::stream::StreamRenderer;
use livellm_core::transform::{Mode, Transformer};
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::sync::Mutex;

fn default_registry() -> Registry {
    registry::default()
}

/// A one-shot static renderer: the whole message is already available, so
/// there is no placeholder/component lifecycle to drive.
///
/// ```javascript
/// const { Renderer } = require('@livellm/core');
/// const renderer = new Renderer();
/// const html = renderer.render('# hello\n\n| a | b |\n|---|---|\n| 1 | 2 |\n', true);
/// ```
#[napi]
pub struct Renderer {
    registry: Mutex<Registry>,
}

#[napi]
impl Renderer {
    /// A renderer backed by the default component registry (the built-in
    /// alert/table-plus/choice/... set).
    #[napi(constructor)]
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(default_registry()),
        }
    }

    /// Renders `source` to an HTML string. When `use_transformer` is true,
    /// the seven built-in pattern detectors run first and enrich plain
    /// Markdown (tables, numbered questions, ...) into directives before
    /// parsing.
    #[napi]
    pub fn render(&self, source: String, use_transformer: bool) -> Result<String> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| Error::new(Status::GenericFailure, "registry lock poisoned"))?;
        let mut transformer = Transformer::new(Mode::Auto);
        if use_transformer {
            transformer.register_builtins();
        }
        let transformer_ref = if use_transformer { Some(&mut transformer) } else { None };
        let html = render_to_string(&source, &mut registry, transformer_ref, &IdentitySanitizer);
        Ok(html)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A streaming render session: feed it chunks as they arrive from the
/// model, read back the document's current HTML after each push, and end
/// or abort it once the generation is done.
///
/// ```javascript
/// const { StreamSession } = require('@livellm/core');
/// const session = new StreamSession();
/// session.push('```livellm:alert\n{"text":"hi"}\n```\n');
/// session.end();
/// console.log(session.html());
/// ```
#[napi]
pub struct StreamSession {
    renderer: Mutex<StreamRenderer>,
    registry: Mutex<Registry>,
}

#[napi]
impl StreamSession {
    /// A session with a fresh document, backed by the default registry and
    /// an immediate (synchronous) render cadence — Node has no animation
    /// frame primitive to coalesce against.
    #[napi(constructor)]
    pub fn new() -> Self {
        Self {
            renderer: Mutex::new(StreamRenderer::new(Box::new(ImmediateScheduler::new()))),
            registry: Mutex::new(default_registry()),
        }
    }

    /// Feeds the next chunk of generated text into the session.
    #[napi]
    pub fn push(&self, chunk: String) -> Result<()> {
        let mut renderer = lock(&self.renderer)?;
        let mut registry = lock(&self.registry)?;
        renderer.push(&chunk, &mut registry);
        Ok(())
    }

    /// Signals normal end of stream.
    #[napi]
    pub fn end(&self) -> Result<()> {
        let mut renderer = lock(&self.renderer)?;
        let mut registry = lock(&self.registry)?;
        renderer.end(&mut registry);
        Ok(())
    }

    /// Signals an abnormal stop (e.g. the host cancelled the generation).
    #[napi]
    pub fn abort(&self) -> Result<()> {
        let mut renderer = lock(&self.renderer)?;
        let mut registry = lock(&self.registry)?;
        renderer.abort(&mut registry);
        Ok(())
    }

    /// True once `end` or `abort` has run.
    #[napi]
    pub fn is_done(&self) -> Result<bool> {
        Ok(lock(&self.renderer)?.is_done())
    }

    /// The document's current HTML.
    #[napi]
    pub fn html(&self) -> Result<String> {
        Ok(lock(&self.renderer)?.document().to_html())
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| Error::new(Status::GenericFailure, "lock poisoned"))
}

/// Routes a host-confirmed or auto-sent user action and formats it as a
/// transcript-ready message. Exposed as a free function since a router's
/// auto-send policy is a per-call decision, not session state the JS side
/// needs to hold onto.
#[napi(object)]
pub struct JsAction {
    /// The directive type name of the component that raised this action.
    pub component: String,
    /// The kind of interaction, e.g. `"select"`, `"confirm"`, `"cancel"`.
    pub action: String,
    /// The value the user picked or entered, as a JSON string.
    pub value_json: String,
    /// Human-readable label for the chosen value.
    pub label: String,
    /// Which materialised component instance raised this action.
    pub component_id: String,
}

/// Formats an action as a short human-readable transcript message, sending
/// it immediately (no preview/confirm step — that belongs to the host's own
/// UI, not this binding).
#[napi]
pub fn dispatch_action(action: JsAction) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(&action.value_json)
        .map_err(|e| Error::new(Status::InvalidArg, format!("invalid value_json: {e}")))?;
    let mut router = Router::new(true);
    let mut message = String::new();
    router.dispatch(
        Action {
            component: action.component,
            action: action.action,
            value,
            label: action.label,
            metadata: livellm_core::action::ActionMetadata::now(action.component_id),
        },
        &mut |a| message = format_as_message(a),
    );
    Ok(message)
}
