//! Watches for directive-shaped content a host wrote into a container
//! without going through [`crate::parser`] or [`crate::stream`] — for
//! example, appending a pre-rendered transcript chunk straight into the
//! DOM. Re-scanning on every host mutation would be wasteful when several
//! mutations land in the same tick, so [`Observer`] debounces through a
//! [`FrameScheduler`] and only re-resolves directive bodies it hasn't seen
//! before.
//!
//! A directive is identified by its exact raw text (type name plus JSON
//! body), not by its position or its surrounding nodes: if a host mutates
//! text around an already-resolved directive without changing the
//! directive's own text, the observer leaves it alone. Only a change to the
//! directive's own raw body causes it to be re-resolved.

use crate::dom::Block;
use crate::parser;
use crate::registry::Registry;
use crate::scheduler::{FrameScheduler, ScheduledId};
use std::collections::HashSet;

/// Debounced re-scanner for host-mutated content.
pub struct Observer {
    scheduler: Box<dyn FrameScheduler>,
    pending: Option<ScheduledId>,
    seen: HashSet<String>,
}

impl Observer {
    /// An observer with nothing seen yet, debouncing through `scheduler`.
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            pending: None,
            seen: HashSet::new(),
        }
    }

    /// Notifies the observer that `source` changed. Debounced: calling this
    /// again before the scheduled scan fires replaces it rather than
    /// queuing a second one. `on_resolved` receives each newly materialised
    /// block, in source order.
    pub fn notify(&mut self, source: String, on_scan: Box<dyn FnOnce(String)>) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
        let id = self.scheduler.schedule(Box::new(move || on_scan(source)));
        self.pending = Some(id);
    }

    /// Scans `source` for fenced block directives, resolves every one whose
    /// exact raw text hasn't been seen before, and returns the newly
    /// materialised blocks in source order. Already-seen directive text is
    /// skipped, so calling this repeatedly on unchanged content is a no-op.
    pub fn scan(&mut self, source: &str, registry: &mut Registry) -> Vec<Block> {
        let mut resolved = Vec::new();
        for (_, _, type_name, body) in parser::find_block_directives(source) {
            let key = format!("{type_name}\u{0}{body}");
            if self.seen.contains(&key) {
                continue;
            }
            self.seen.insert(key);
            let outcome = crate::directive_resolve::resolve_directive(
                &type_name,
                &body,
                crate::directive_resolve::DEFAULT_MAX_JSON_SIZE,
                registry,
            );
            resolved.push(outcome.into_block());
        }
        resolved
    }

    /// Forgets every directive seen so far, so the next `scan` re-resolves
    /// everything. Useful when the host discards and rebuilds a container
    /// wholesale rather than incrementally mutating it.
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::scheduler::ImmediateScheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notify_runs_the_scan_callback() {
        let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        observer.notify(
            "```livellm:alert\n{\"text\":\"hi\"}\n```\n".to_string(),
            Box::new(move |source| *s.borrow_mut() = Some(source)),
        );
        assert!(seen.borrow().is_some());
    }

    #[test]
    fn resolves_a_newly_appended_directive() {
        let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
        let mut reg = registry::default();
        let source = "```livellm:alert\n{\"text\":\"hi\"}\n```\n";
        let blocks = observer.scan(source, &mut reg);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Block::Component { .. }));
    }

    #[test]
    fn does_not_reprocess_an_unchanged_directive() {
        let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
        let mut reg = registry::default();
        let source = "```livellm:alert\n{\"text\":\"hi\"}\n```\n";
        observer.scan(source, &mut reg);
        let blocks = observer.scan(source, &mut reg);
        assert!(blocks.is_empty());
    }

    #[test]
    fn reprocesses_once_the_directives_own_text_changes() {
        let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
        let mut reg = registry::default();
        observer.scan("```livellm:alert\n{\"text\":\"hi\"}\n```\n", &mut reg);
        let blocks = observer.scan("```livellm:alert\n{\"text\":\"bye\"}\n```\n", &mut reg);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn surrounding_text_changes_alone_do_not_trigger_reprocessing() {
        let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
        let mut reg = registry::default();
        observer.scan("Intro.\n\n```livellm:alert\n{\"text\":\"hi\"}\n```\n", &mut reg);
        let blocks = observer.scan(
            "Intro, now longer.\n\n```livellm:alert\n{\"text\":\"hi\"}\n```\n",
            &mut reg,
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn reset_forgets_everything_seen() {
        let mut observer = Observer::new(Box::new(ImmediateScheduler::new()));
        let mut reg = registry::default();
        let source = "```livellm:alert\n{\"text\":\"hi\"}\n```\n";
        observer.scan(source, &mut reg);
        observer.reset();
        let blocks = observer.scan(source, &mut reg);
        assert_eq!(blocks.len(), 1);
    }
}
