// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Listener bindings shared between the runtime and running interpreters.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use babylon_runtime::{EventFilter, SharedListener, Subscription, TagSet};
use babylon_source::SourceSection;

struct Binding {
    id: u64,
    filter: EventFilter,
    input_filter: Option<EventFilter>,
    listener: SharedListener,
}

/// A listener selected for one node, with the filter for its inputs.
#[derive(Clone)]
pub(crate) struct Hook {
    pub listener: SharedListener,
    pub input_filter: Option<EventFilter>,
}

#[derive(Default)]
pub(crate) struct Instrumenter {
    bindings: RefCell<Vec<Binding>>,
    next_id: Cell<u64>,
}

impl Instrumenter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn attach(
        self: &Rc<Self>,
        filter: EventFilter,
        input_filter: Option<EventFilter>,
        listener: SharedListener,
    ) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.bindings.borrow_mut().push(Binding {
            id,
            filter,
            input_filter,
            listener,
        });
        trace!(binding = id, "listener attached");

        let weak: Weak<Instrumenter> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(instrumenter) = weak.upgrade() {
                instrumenter.bindings.borrow_mut().retain(|b| b.id != id);
                trace!(binding = id, "listener detached");
            }
        })
    }

    pub fn is_active(&self) -> bool {
        !self.bindings.borrow().is_empty()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Listeners interested in a node. Cloned out so listeners can attach or
    /// detach while being notified.
    pub fn hooks_for(&self, section: &SourceSection, tags: TagSet) -> Vec<Hook> {
        self.bindings
            .borrow()
            .iter()
            .filter(|b| b.filter.matches(section, tags))
            .map(|b| Hook {
                listener: Rc::clone(&b.listener),
                input_filter: b.input_filter.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_runtime::{ExecutionListener, Tag};
    use babylon_source::{Source, Span};
    use std::cell::RefCell;

    struct Nop;
    impl ExecutionListener for Nop {}

    #[test]
    fn subscriptions_release_their_binding() {
        let instrumenter = Instrumenter::new();
        let section = Source::new("a.bab", "x").section(Span::new(0, 1)).unwrap();
        let stmt = TagSet::of(&[Tag::Statement]);

        let listener: SharedListener = Rc::new(RefCell::new(Nop));
        let sub = instrumenter.attach(EventFilter::new().tag_is(Tag::Statement), None, listener);
        assert_eq!(instrumenter.hooks_for(&section, stmt).len(), 1);
        assert!(instrumenter
            .hooks_for(&section, TagSet::of(&[Tag::Expression]))
            .is_empty());

        drop(sub);
        assert!(!instrumenter.is_active());
    }
}
