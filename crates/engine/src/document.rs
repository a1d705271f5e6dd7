//! The document collaborator.
//!
//! Components never own elements. They read and write a narrow attribute
//! surface (`tabindex`), move focus, request synthetic clicks and register
//! listeners through this trait. Hosts provide the implementation; the engine
//! ships [`crate::memory::MemoryDocument`].

use keynav_types::{ElementId, EventKind, ListenerId, attributes};

use crate::selector::Selector;

/// Result of offering an event to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The component does not handle this event.
    Ignored,
    /// The component handled the event; `prevent_default` reports whether
    /// the host's default action (scrolling, native tab order) must be
    /// suppressed.
    Handled { prevent_default: bool },
}

impl EventOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, EventOutcome::Handled { .. })
    }

    pub fn prevents_default(&self) -> bool {
        matches!(self, EventOutcome::Handled { prevent_default: true })
    }
}

/// Host document interface.
pub trait Document {
    /// Document root; document-level listeners attach here.
    fn root(&self) -> ElementId;

    /// Whether `id` refers to an element of this document.
    fn contains_element(&self, id: ElementId) -> bool;

    fn parent(&self, id: ElementId) -> Option<ElementId>;

    /// Children in document order.
    fn children(&self, id: ElementId) -> Vec<ElementId>;

    /// Lowercase tag name.
    fn tag_name(&self, id: ElementId) -> Option<String>;

    fn attribute(&self, id: ElementId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &str);

    fn remove_attribute(&mut self, id: ElementId, name: &str);

    /// Moves input focus to `id`.
    fn focus(&mut self, id: ElementId);

    /// Element currently holding input focus.
    fn active_element(&self) -> Option<ElementId>;

    /// Requests a synthetic click on `id`. Hosts deliver it back to listeners
    /// once the current handler returns.
    fn click(&mut self, id: ElementId);

    /// Drains clicks requested since the last call, in request order.
    fn take_synthetic_clicks(&mut self) -> Vec<ElementId>;

    fn add_event_listener(&mut self, target: ElementId, kind: EventKind) -> ListenerId;

    /// Removes a listener; returns `false` when it was not registered.
    fn remove_event_listener(&mut self, id: ListenerId) -> bool;

    fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        let Some(tag) = self.tag_name(id) else {
            return false;
        };
        selector.matches_with(&tag, &|name| self.attribute(id, name))
    }

    /// Descendants of `scope` (excluding `scope`) matching `selector`, in
    /// document order.
    fn query_selector_all(&self, scope: ElementId, selector: &Selector) -> Vec<ElementId> {
        let mut found = Vec::new();
        let mut stack: Vec<ElementId> = self.children(scope).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            if self.matches(id, selector) {
                found.push(id);
            }
            stack.extend(self.children(id).into_iter().rev());
        }
        found
    }

    fn query_selector(&self, scope: ElementId, selector: &Selector) -> Option<ElementId> {
        self.query_selector_all(scope, selector).into_iter().next()
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn tab_index(&self, id: ElementId) -> Option<String> {
        self.attribute(id, attributes::TABINDEX)
    }
}

/// Listeners one component registered, detached together on teardown.
#[derive(Debug, Default, Clone)]
pub struct ListenerSet {
    entries: Vec<(ElementId, EventKind, ListenerId)>,
}

impl ListenerSet {
    pub fn attach(&mut self, doc: &mut dyn Document, target: ElementId, kind: EventKind) {
        let id = doc.add_event_listener(target, kind);
        self.entries.push((target, kind, id));
    }

    /// Removes every listener in the set; returns how many the document
    /// still knew about.
    pub fn detach_all(&mut self, doc: &mut dyn Document) -> usize {
        self.entries
            .drain(..)
            .filter(|(_, _, id)| doc.remove_event_listener(*id))
            .count()
    }

    /// Whether an event of `kind` on `target` reaches one of these listeners
    /// as it bubbles towards the root.
    pub fn covers(&self, doc: &dyn Document, target: ElementId, kind: EventKind) -> bool {
        self.entries
            .iter()
            .any(|(element, k, _)| *k == kind && doc.contains(*element, target))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
