//! Tab and Shift+Tab cycling bounded to a container.

use keynav_types::{CanonicalKey, ElementId, EventKind, KeyboardEvent};
use keynav_util::SelectorConfig;
use tracing::debug;

use crate::document::{Document, EventOutcome, ListenerSet};
use crate::error::KeynavError;
use crate::normalize;
use crate::selector::Selector;

const COMPONENT: &str = "focus trap";

/// Elements a trap cycles through when no explicit list is given.
pub const DEFAULT_ACTIVATABLE: &str = "a[href]:not([disabled]), button:not([disabled]), \
     textarea:not([disabled]), input:not([disabled]), select:not([disabled]), \
     [tabindex=\"0\"], [data-knw-activatable]";

#[derive(Debug, Clone)]
pub struct FocusTrapOptions {
    /// Explicit item list; otherwise the container is queried on init.
    pub items: Option<Vec<ElementId>>,
    /// Replaces [`DEFAULT_ACTIVATABLE`].
    pub activatable: Option<String>,
    pub auto_init: bool,
}

impl Default for FocusTrapOptions {
    fn default() -> Self {
        Self {
            items: None,
            activatable: None,
            auto_init: true,
        }
    }
}

impl FocusTrapOptions {
    pub fn from_config(selectors: &SelectorConfig) -> Self {
        Self {
            activatable: selectors.activatable.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct FocusTrap {
    container: ElementId,
    explicit: Option<Vec<ElementId>>,
    selector: Selector,
    items: Vec<ElementId>,
    listeners: ListenerSet,
    initialized: bool,
}

impl FocusTrap {
    pub fn new(doc: &mut dyn Document, container: ElementId, options: FocusTrapOptions) -> Result<Self, KeynavError> {
        if !doc.contains_element(container) {
            return Err(KeynavError::UnknownElement {
                component: COMPONENT,
                element: container,
            });
        }
        let source = options.activatable.unwrap_or_else(|| DEFAULT_ACTIVATABLE.to_string());
        let selector = Selector::parse(&source).map_err(|source_error| KeynavError::InvalidSelector {
            selector: source.clone(),
            source: source_error,
        })?;
        let mut trap = Self {
            container,
            explicit: options.items,
            selector,
            items: Vec::new(),
            listeners: ListenerSet::default(),
            initialized: false,
        };
        if options.auto_init {
            trap.init(doc);
        }
        Ok(trap)
    }

    /// Resolves the item list and listens for keydowns on the container.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.initialized {
            return;
        }
        self.refresh(doc);
        self.listeners.attach(doc, self.container, EventKind::KeyDown);
        self.initialized = true;
        debug!(container = %self.container, items = self.items.len(), "focus trap initialized");
    }

    /// Re-resolves the item list.
    pub fn refresh(&mut self, doc: &dyn Document) {
        self.items = match &self.explicit {
            Some(items) => items.clone(),
            None => doc.query_selector_all(self.container, &self.selector),
        };
    }

    pub fn teardown(&mut self, doc: &mut dyn Document) -> usize {
        let removed = self.listeners.detach_all(doc);
        self.initialized = false;
        removed
    }

    /// Wraps Tab on the last item to the first and Shift+Tab on the first
    /// item to the last. Every other Tab keeps its native behavior.
    pub fn handle_key(&self, doc: &mut dyn Document, event: &KeyboardEvent) -> EventOutcome {
        if normalize::canonical_key(event) != Some(CanonicalKey::Tab) {
            return EventOutcome::Ignored;
        }
        let (Some(first), Some(last)) = (self.items.first().copied(), self.items.last().copied()) else {
            return EventOutcome::Ignored;
        };
        let focused = doc.active_element();
        // Direction follows Shift alone, whatever else is held.
        let wrap_to = if event.shift_key {
            (focused == Some(first)).then_some(last)
        } else {
            (focused == Some(last)).then_some(first)
        };
        match wrap_to {
            Some(target) => {
                doc.focus(target);
                EventOutcome::Handled { prevent_default: true }
            }
            None => EventOutcome::Ignored,
        }
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn items(&self) -> &[ElementId] {
        &self.items
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn listens(&self, doc: &dyn Document, target: ElementId, kind: EventKind) -> bool {
        self.listeners.covers(doc, target, kind)
    }
}
