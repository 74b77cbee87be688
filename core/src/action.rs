//! Routes a user's interaction with a materialised component (choosing an
//! option, confirming a prompt) back to the host.
//!
//! Some actions should reach the host immediately; others — the ones a
//! conversation shouldn't silently act on, like confirming a purchase —
//! should sit in a preview state until the host (or a second user gesture)
//! confirms or cancels them. [`Router`] implements both flows over the same
//! [`Action`] shape rather than splitting into two APIs.

use crate::bus::{Event, EventBus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

/// Host-facing metadata attached to every action, independent of what kind
/// of action it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Which materialised component instance raised this action.
    #[serde(rename = "componentId")]
    pub component_id: String,
    /// Milliseconds since the Unix epoch when the action was raised.
    pub timestamp: u64,
    /// For actions raised from a `choice`/`confirm` component, the question
    /// text it was answering.
    #[serde(rename = "questionContext", skip_serializing_if = "Option::is_none")]
    pub question_context: Option<String>,
}

impl ActionMetadata {
    /// Builds metadata stamped with the current wall-clock time.
    pub fn now(component_id: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            component_id: component_id.into(),
            timestamp,
            question_context: None,
        }
    }

    /// Builder: attach the question this action answers.
    pub fn with_question_context(mut self, question: impl Into<String>) -> Self {
        self.question_context = Some(question.into());
        self
    }
}

/// One user interaction with a materialised component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The directive type name of the component that raised this action.
    pub component: String,
    /// The kind of interaction, e.g. `"select"`, `"confirm"`, `"cancel"`.
    pub action: String,
    /// The value the user picked or entered.
    pub value: Value,
    /// Human-readable label, usually recomputed from the component's
    /// current props (e.g. the chosen option's display text) rather than
    /// carried over verbatim from when the action was first raised.
    pub label: String,
    /// Host-facing context about where this action came from.
    pub metadata: ActionMetadata,
}

/// Routes [`Action`]s to a host callback, either immediately or behind an
/// explicit confirm/cancel step.
pub struct Router {
    /// When true, every dispatched action is sent immediately; when false,
    /// it is held in `pending` until `confirm` or `cancel` is called.
    pub auto_send: bool,
    pending: Option<Action>,
    /// Lifecycle events (`action:sent`, `action:previewing`, `action:cancelled`).
    pub bus: EventBus,
    /// Per-component `label` recomputation templates, keyed by directive
    /// type name. See [`Router::set_label_template`].
    label_templates: BTreeMap<String, String>,
}

impl Router {
    /// A router with the given auto-send policy and nothing pending.
    pub fn new(auto_send: bool) -> Self {
        Self {
            auto_send,
            pending: None,
            bus: EventBus::new(),
            label_templates: BTreeMap::new(),
        }
    }

    /// Registers a label template for `component`: every action raised by
    /// that directive type has its `label` recomputed from `template`
    /// before it is previewed or sent. The only placeholder is `{value}`,
    /// replaced with the action's value rendered as plain text.
    pub fn set_label_template(&mut self, component: impl Into<String>, template: impl Into<String>) {
        self.label_templates.insert(component.into(), template.into());
    }

    /// True while an action is awaiting `confirm`/`cancel`.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// A read-only look at the pending action, if any.
    pub fn pending(&self) -> Option<&Action> {
        self.pending.as_ref()
    }

    /// Routes `action`: sends it immediately if `auto_send` is set,
    /// otherwise holds it for confirmation. Replaces any previously pending
    /// action without sending it (the UI only ever shows one preview at a
    /// time).
    pub fn dispatch(&mut self, mut action: Action, send: &mut dyn FnMut(&Action)) {
        self.recompute_label(&mut action);
        if self.auto_send {
            self.deliver(action, send);
        } else {
            self.bus.emit(Event::ActionPreviewing {
                action: action.action.clone(),
            });
            self.pending = Some(action);
        }
    }

    /// Applies `component`'s registered label template to `action.label`,
    /// if one is registered. A no-op when no template matches.
    fn recompute_label(&self, action: &mut Action) {
        if let Some(template) = self.label_templates.get(&action.component) {
            action.label = template.replace("{value}", &value_to_text(&action.value));
        }
    }

    /// Sends the pending action, if any. Returns whether there was one.
    pub fn confirm(&mut self, send: &mut dyn FnMut(&Action)) -> bool {
        match self.pending.take() {
            Some(action) => {
                self.deliver(action, send);
                true
            }
            None => false,
        }
    }

    /// Discards the pending action without sending it. Returns whether
    /// there was one.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(action) => {
                self.bus.emit(Event::ActionCancelled {
                    action: action.action,
                });
                true
            }
            None => false,
        }
    }

    fn deliver(&mut self, action: Action, send: &mut dyn FnMut(&Action)) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| send(&action)));
        if result.is_err() {
            log::error!("host action callback panicked for action \"{}\"", action.action);
        }
        self.bus.emit(Event::ActionSent {
            action: action.action,
        });
    }
}

/// Formats an action as a short human-readable message, e.g. for echoing
/// the user's choice back into a transcript. Dispatches on `action.action`
/// since each kind reads naturally in a different shape.
pub fn format_as_message(action: &Action) -> String {
    match action.action.as_str() {
        "select" => format!("{}: {}", action.label, value_to_text(&action.value)),
        "confirm" => format!("Confirmed: {}", action.label),
        "cancel" => format!("Cancelled: {}", action.label),
        other => format!("{} ({}): {}", action.label, other, value_to_text(&action.value)),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_action(kind: &str) -> Action {
        Action {
            component: "choice".into(),
            action: kind.into(),
            value: json!("yes"),
            label: "Yes".into(),
            metadata: ActionMetadata::now("choice-1"),
        }
    }

    #[test]
    fn auto_send_router_delivers_immediately() {
        let mut router = Router::new(true);
        let mut sent = Vec::new();
        router.dispatch(sample_action("select"), &mut |a| sent.push(a.clone()));
        assert_eq!(sent.len(), 1);
        assert!(!router.has_pending());
    }

    #[test]
    fn preview_router_holds_until_confirmed() {
        let mut router = Router::new(false);
        let mut sent = Vec::new();
        router.dispatch(sample_action("confirm"), &mut |a| sent.push(a.clone()));
        assert!(sent.is_empty());
        assert!(router.has_pending());
        assert!(router.confirm(&mut |a| sent.push(a.clone())));
        assert_eq!(sent.len(), 1);
        assert!(!router.has_pending());
    }

    #[test]
    fn cancelling_a_preview_never_sends_it() {
        let mut router = Router::new(false);
        let mut sent = Vec::new();
        router.dispatch(sample_action("confirm"), &mut |a| sent.push(a.clone()));
        assert!(router.cancel());
        assert!(sent.is_empty());
        assert!(!router.confirm(&mut |a| sent.push(a.clone())));
    }

    #[test]
    fn a_panicking_host_callback_does_not_stop_the_sent_event() {
        let mut router = Router::new(true);
        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let events_handle = events.clone();
        router
            .bus
            .on(crate::bus::EventKind::ActionSent, move |_| events_handle.borrow_mut().push(()));
        router.dispatch(sample_action("select"), &mut |_| panic!("host blew up"));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn a_registered_label_template_recomputes_the_label_before_sending() {
        let mut router = Router::new(true);
        router.set_label_template("choice", "You picked {value}");
        let mut sent = Vec::new();
        let mut action = sample_action("select");
        action.value = json!("opt_1");
        action.label = "stale label".into();
        router.dispatch(action, &mut |a| sent.push(a.clone()));
        assert_eq!(sent[0].label, "You picked opt_1");
    }

    #[test]
    fn an_unregistered_component_keeps_its_dispatched_label() {
        let mut router = Router::new(true);
        let mut sent = Vec::new();
        router.dispatch(sample_action("select"), &mut |a| sent.push(a.clone()));
        assert_eq!(sent[0].label, "Yes");
    }

    #[test]
    fn format_as_message_reads_naturally_per_kind() {
        assert_eq!(format_as_message(&sample_action("select")), "Yes: yes");
        assert_eq!(format_as_message(&sample_action("confirm")), "Confirmed: Yes");
        assert_eq!(format_as_message(&sample_action("cancel")), "Cancelled: Yes");
    }
}
