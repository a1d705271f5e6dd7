//! Event routing for a document and its attached components.
//!
//! [`KeynavHost`] stands in for the browser event loop: it owns the
//! document, offers each key or click event to every component whose
//! listeners the event reaches (in attachment order), then delivers the
//! synthetic clicks those components requested back as click events.
//! Handler failures are logged and swallowed so one broken component never
//! takes the others down.

use std::fmt;

use keynav_types::{ElementId, EventKind, KeyboardEvent, ScopeSignal, attributes};
use keynav_util::KeynavConfig;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::bus::ScopeBus;
use crate::document::{Document, EventOutcome};
use crate::error::KeynavError;
use crate::focus_trap::{FocusTrap, FocusTrapOptions};
use crate::hotkeys::{HotkeyOptions, HotkeyRegistry, HotkeyScope};
use crate::navigator::{ListNavigator, ListNavigatorBuilder, lists_from_document};
use crate::selector::Selector;

/// Upper bound on click delivery rounds per dispatched event; a click
/// handler that keeps requesting clicks is cut off here.
const MAX_CLICK_ROUNDS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component-{}", self.0)
    }
}

#[derive(Debug)]
pub enum Component {
    List(ListNavigator),
    Hotkeys(HotkeyRegistry),
    Trap(FocusTrap),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::List(_) => "list",
            Component::Hotkeys(_) => "hotkeys",
            Component::Trap(_) => "focus-trap",
        }
    }

    fn listens(&self, doc: &dyn Document, target: ElementId, kind: EventKind) -> bool {
        match self {
            Component::List(nav) => nav.listens(doc, target, kind),
            Component::Hotkeys(registry) => registry.listens(doc, target, kind),
            Component::Trap(trap) => trap.listens(doc, target, kind),
        }
    }

    fn teardown(&mut self, doc: &mut dyn Document) -> usize {
        match self {
            Component::List(nav) => nav.teardown(doc),
            Component::Hotkeys(registry) => registry.teardown(doc),
            Component::Trap(trap) => trap.teardown(doc),
        }
    }
}

/// What happened while dispatching one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The host must suppress its default action (scrolling, native tab).
    pub prevent_default: bool,
    /// Components that handled the event, in dispatch order.
    pub claimed_by: Vec<ComponentId>,
    /// Synthetic clicks delivered as a consequence, in delivery order.
    pub clicks: Vec<ElementId>,
}

impl DispatchOutcome {
    pub fn is_claimed(&self) -> bool {
        !self.claimed_by.is_empty()
    }
}

#[derive(Debug)]
pub struct KeynavHost<D: Document> {
    document: D,
    bus: ScopeBus,
    components: Vec<(ComponentId, Component)>,
    next_id: u64,
}

impl<D: Document> KeynavHost<D> {
    pub fn new(document: D) -> Self {
        Self {
            document,
            bus: ScopeBus::new(),
            components: Vec::new(),
            next_id: 0,
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn bus(&self) -> &ScopeBus {
        &self.bus
    }

    fn push(&mut self, component: Component) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        debug!(component = %id, kind = component.kind(), "attached component");
        self.components.push((id, component));
        id
    }

    pub fn attach_list(&mut self, builder: ListNavigatorBuilder) -> Result<ComponentId, KeynavError> {
        let navigator = builder.build(&mut self.document)?;
        Ok(self.push(Component::List(navigator)))
    }

    pub fn attach_hotkeys(&mut self, options: HotkeyOptions) -> Result<ComponentId, KeynavError> {
        let registry = HotkeyRegistry::new(&mut self.document, &self.bus, options)?;
        Ok(self.push(Component::Hotkeys(registry)))
    }

    pub fn attach_focus_trap(
        &mut self,
        container: ElementId,
        options: FocusTrapOptions,
    ) -> Result<ComponentId, KeynavError> {
        let trap = FocusTrap::new(&mut self.document, container, options)?;
        Ok(self.push(Component::Trap(trap)))
    }

    /// Attaches one navigator per list container, a document-wide hotkey
    /// registry and an inactive registry per `dialog`, all configured from
    /// `config`. Dialog hotkeys stay silent until their dialog is announced.
    pub fn attach_from_config(&mut self, config: &KeynavConfig) -> Result<Vec<ComponentId>, KeynavError> {
        let mut ids = self.attach_lists_from_config(config)?;
        ids.push(self.attach_hotkeys(HotkeyOptions::from_config(&config.selectors))?);
        let dialog = Selector::parse(attributes::DIALOG).map_err(|source| KeynavError::InvalidSelector {
            selector: attributes::DIALOG.to_string(),
            source,
        })?;
        let root = self.document.root();
        for container in self.document.query_selector_all(root, &dialog) {
            let options = HotkeyOptions::from_config(&config.selectors)
                .container(container)
                .scope(HotkeyScope::Dialog);
            ids.push(self.attach_hotkeys(options)?);
        }
        Ok(ids)
    }

    /// Attaches one navigator per list container matched by the configured
    /// list selector.
    pub fn attach_lists_from_config(&mut self, config: &KeynavConfig) -> Result<Vec<ComponentId>, KeynavError> {
        let template = ListNavigator::builder().with_config(config);
        let navigators = lists_from_document(
            &mut self.document,
            &config.selectors.list,
            &config.selectors.list_item,
            &template,
        )?;
        Ok(navigators
            .into_iter()
            .map(|navigator| self.push(Component::List(navigator)))
            .collect())
    }

    /// Tears a component down and forgets it.
    pub fn detach(&mut self, id: ComponentId) -> bool {
        let Some(index) = self.components.iter().position(|(candidate, _)| *candidate == id) else {
            return false;
        };
        let (_, mut component) = self.components.remove(index);
        let removed = component.teardown(&mut self.document);
        debug!(component = %id, listeners = removed, "detached component");
        true
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.iter().map(|(id, _)| *id).collect()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, component)| component)
    }

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, component)| component)
    }

    pub fn list(&self, id: ComponentId) -> Option<&ListNavigator> {
        match self.component(id)? {
            Component::List(nav) => Some(nav),
            _ => None,
        }
    }

    pub fn list_mut(&mut self, id: ComponentId) -> Option<&mut ListNavigator> {
        match self.component_mut(id)? {
            Component::List(nav) => Some(nav),
            _ => None,
        }
    }

    /// Runs `f` against a navigator together with the document it navigates.
    pub fn with_list<R>(&mut self, id: ComponentId, f: impl FnOnce(&mut ListNavigator, &mut D) -> R) -> Option<R> {
        let document = &mut self.document;
        for (candidate, component) in &mut self.components {
            if *candidate == id
                && let Component::List(nav) = component
            {
                return Some(f(nav, document));
            }
        }
        None
    }

    pub fn hotkeys(&self, id: ComponentId) -> Option<&HotkeyRegistry> {
        match self.component(id)? {
            Component::Hotkeys(registry) => Some(registry),
            _ => None,
        }
    }

    pub fn hotkey_registries(&self) -> impl Iterator<Item = (ComponentId, &HotkeyRegistry)> {
        self.components.iter().filter_map(|(id, component)| match component {
            Component::Hotkeys(registry) => Some((*id, registry)),
            _ => None,
        })
    }

    pub fn focus_trap(&self, id: ComponentId) -> Option<&FocusTrap> {
        match self.component(id)? {
            Component::Trap(trap) => Some(trap),
            _ => None,
        }
    }

    /// Broadcasts a scope signal to every hotkey registry on this host.
    pub fn publish(&self, signal: ScopeSignal) -> usize {
        self.bus.publish(signal)
    }

    /// Offers a keydown to every component it reaches, then delivers the
    /// synthetic clicks they requested. A keydown without a target is a
    /// document-level event.
    pub fn dispatch_key(&mut self, event: &KeyboardEvent) -> DispatchOutcome {
        let target = event.target.unwrap_or_else(|| self.document.root());
        let mut outcome = DispatchOutcome::default();
        for (id, component) in &mut self.components {
            if !component.listens(&self.document, target, EventKind::KeyDown) {
                continue;
            }
            let result = match component {
                Component::List(nav) => nav.handle_key(&mut self.document, event),
                Component::Hotkeys(registry) => Ok(registry.handle_key(&mut self.document, event)),
                Component::Trap(trap) => Ok(trap.handle_key(&mut self.document, event)),
            };
            match result {
                Ok(handled) => record(&mut outcome, *id, handled),
                Err(err) => error!(component = %id, error = ?err, "key handler failed"),
            }
        }
        self.deliver_clicks(&mut outcome);
        outcome
    }

    /// Delivers a click to every navigator it reaches, then any synthetic
    /// clicks that follow from it.
    pub fn dispatch_click(&mut self, target: ElementId) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        self.click_components(target, &mut outcome);
        self.deliver_clicks(&mut outcome);
        outcome
    }

    fn click_components(&mut self, target: ElementId, outcome: &mut DispatchOutcome) {
        for (id, component) in &mut self.components {
            if !component.listens(&self.document, target, EventKind::Click) {
                continue;
            }
            if let Component::List(nav) = component {
                let handled = nav.handle_click(&mut self.document, target);
                record(outcome, *id, handled);
            }
        }
    }

    fn deliver_clicks(&mut self, outcome: &mut DispatchOutcome) {
        for _ in 0..MAX_CLICK_ROUNDS {
            let clicks = self.document.take_synthetic_clicks();
            if clicks.is_empty() {
                return;
            }
            for click in clicks {
                debug!(target = %click, "delivering synthetic click");
                outcome.clicks.push(click);
                self.click_components(click, outcome);
            }
        }
        let dropped = self.document.take_synthetic_clicks();
        if !dropped.is_empty() {
            warn!(dropped = dropped.len(), "synthetic click chain too long; dropping remaining clicks");
        }
    }
}

fn record(outcome: &mut DispatchOutcome, id: ComponentId, handled: EventOutcome) {
    if handled.is_handled() {
        if !outcome.claimed_by.contains(&id) {
            outcome.claimed_by.push(id);
        }
        outcome.prevent_default |= handled.prevents_default();
    }
}
