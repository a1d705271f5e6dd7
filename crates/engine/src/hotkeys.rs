//! Declarative hotkeys with global and dialog scoping.
//!
//! A [`HotkeyRegistry`] reads `[alt+|ctrl+](letter|digit|escape)` declarations
//! from the elements of a container, listens for keydowns document-wide and
//! clicks the bound trigger when a declared combo is pressed. Registries
//! coordinate through a [`ScopeBus`]: announcing a dialog silences every other
//! registry; announcing the global scope re-enables global registries and
//! silences dialogs.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::IndexMap;
use keynav_types::{CanonicalKey, ElementId, EventKind, KeyboardEvent, Modifier, ScopeSignal, attributes};
use keynav_util::SelectorConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::bus::{ScopeBus, ScopeState, Subscription};
use crate::document::{Document, EventOutcome, ListenerSet};
use crate::error::{DeclarationError, KeynavError};
use crate::normalize::{self, NormalizedKey};
use crate::selector::Selector;

const COMPONENT: &str = "hotkey registry";

/// Tags whose keydowns never fire hotkeys, Escape excepted.
const INPUT_TAGS: [&str; 3] = ["input", "textarea", "select"];

static HOTKEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(alt|ctrl)\+)?([a-z0-9]|escape)$").expect("hotkey regex should compile"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hotkey {0:?}")]
pub struct InvalidHotkey(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyModifier {
    Alt,
    Ctrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyKey {
    /// Lowercase ASCII letter or digit.
    Char(char),
    Escape,
}

/// A parsed hotkey declaration such as `alt+s`, `7` or `escape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HotkeyCombo {
    pub modifier: Option<HotkeyModifier>,
    pub key: HotkeyKey,
}

impl HotkeyCombo {
    /// Combo for a normalized keydown. Shift contributes no prefix; keys that
    /// cannot be declared yield `None`.
    pub fn from_key(normalized: NormalizedKey) -> Option<Self> {
        let key = match normalized.key? {
            CanonicalKey::Escape => HotkeyKey::Escape,
            key @ CanonicalKey::Char(ch) if key.is_alphanumeric() => HotkeyKey::Char(ch.to_ascii_lowercase()),
            _ => return None,
        };
        let modifier = match normalized.modifier {
            Some(Modifier::Alt) => Some(HotkeyModifier::Alt),
            Some(Modifier::Ctrl) => Some(HotkeyModifier::Ctrl),
            Some(Modifier::Shift) | None => None,
        };
        Some(Self { modifier, key })
    }
}

impl fmt::Display for HotkeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(HotkeyModifier::Alt) => f.write_str("alt+")?,
            Some(HotkeyModifier::Ctrl) => f.write_str("ctrl+")?,
            None => {}
        }
        match self.key {
            HotkeyKey::Char(ch) => write!(f, "{ch}"),
            HotkeyKey::Escape => f.write_str("escape"),
        }
    }
}

impl FromStr for HotkeyCombo {
    type Err = InvalidHotkey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let captures = HOTKEY_PATTERN
            .captures(&lowered)
            .ok_or_else(|| InvalidHotkey(s.to_string()))?;
        let modifier = match captures.get(1).map(|m| m.as_str()) {
            Some("alt") => Some(HotkeyModifier::Alt),
            Some("ctrl") => Some(HotkeyModifier::Ctrl),
            _ => None,
        };
        let key = match captures.get(2).map(|m| m.as_str()) {
            Some("escape") => HotkeyKey::Escape,
            Some(single) => single
                .chars()
                .next()
                .map(HotkeyKey::Char)
                .ok_or_else(|| InvalidHotkey(s.to_string()))?,
            None => return Err(InvalidHotkey(s.to_string())),
        };
        Ok(Self { modifier, key })
    }
}

impl TryFrom<String> for HotkeyCombo {
    type Error = InvalidHotkey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HotkeyCombo> for String {
    fn from(combo: HotkeyCombo) -> Self {
        combo.to_string()
    }
}

/// One parsed declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub combo: HotkeyCombo,
    pub declared_on: ElementId,
    /// Element clicked when the combo fires.
    pub trigger: ElementId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotkeyScope {
    #[default]
    Global,
    Dialog,
}

#[derive(Debug, Clone)]
pub struct HotkeyOptions {
    /// Container holding the declarations; the document root when `None`.
    pub container: Option<ElementId>,
    pub key_attribute: String,
    pub target_attribute: String,
    pub scope: HotkeyScope,
    /// Initial active flag; global registries start active, dialogs do not.
    pub active: Option<bool>,
    pub auto_init: bool,
}

impl Default for HotkeyOptions {
    fn default() -> Self {
        Self {
            container: None,
            key_attribute: attributes::HOTKEY_KEY.to_string(),
            target_attribute: attributes::HOTKEY_TARGET.to_string(),
            scope: HotkeyScope::Global,
            active: None,
            auto_init: true,
        }
    }
}

impl HotkeyOptions {
    pub fn from_config(selectors: &SelectorConfig) -> Self {
        Self {
            key_attribute: selectors.hotkey_attribute.clone(),
            target_attribute: selectors.hotkey_target_attribute.clone(),
            ..Self::default()
        }
    }

    pub fn container(mut self, container: ElementId) -> Self {
        self.container = Some(container);
        self
    }

    pub fn scope(mut self, scope: HotkeyScope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug)]
pub struct HotkeyRegistry {
    key_attribute: String,
    target_attribute: String,
    bindings: IndexMap<HotkeyCombo, Binding>,
    diagnostics: Vec<DeclarationError>,
    state: Rc<ScopeState>,
    bus: ScopeBus,
    subscription: Option<Subscription>,
    listeners: ListenerSet,
    initialized: bool,
}

impl HotkeyRegistry {
    pub fn new(doc: &mut dyn Document, bus: &ScopeBus, options: HotkeyOptions) -> Result<Self, KeynavError> {
        let container = options.container.unwrap_or_else(|| doc.root());
        if !doc.contains_element(container) {
            return Err(KeynavError::UnknownElement {
                component: COMPONENT,
                element: container,
            });
        }
        let is_global = options.scope == HotkeyScope::Global;
        let active = options.active.unwrap_or(is_global);
        let mut registry = Self {
            key_attribute: options.key_attribute,
            target_attribute: options.target_attribute,
            bindings: IndexMap::new(),
            diagnostics: Vec::new(),
            state: ScopeState::new(container, is_global, active),
            bus: bus.clone(),
            subscription: None,
            listeners: ListenerSet::default(),
            initialized: false,
        };
        if options.auto_init {
            registry.init(doc);
        }
        Ok(registry)
    }

    /// Active registry for `container` (the whole document when `None`).
    pub fn global(doc: &mut dyn Document, bus: &ScopeBus, container: Option<ElementId>) -> Result<Self, KeynavError> {
        let options = HotkeyOptions {
            container,
            ..HotkeyOptions::default()
        };
        Self::new(doc, bus, options)
    }

    /// Inactive registry scoped to a dialog container.
    pub fn dialog(doc: &mut dyn Document, bus: &ScopeBus, container: ElementId) -> Result<Self, KeynavError> {
        let options = HotkeyOptions::default()
            .container(container)
            .scope(HotkeyScope::Dialog);
        Self::new(doc, bus, options)
    }

    /// Parses declarations, listens for keydowns on the document root and
    /// subscribes to scope signals. No-op when already initialized.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.initialized {
            debug!(container = %self.container(), "hotkey registry already initialized");
            return;
        }
        self.parse(doc);
        let root = doc.root();
        self.listeners.attach(doc, root, EventKind::KeyDown);
        self.subscription = Some(self.bus.subscribe(Rc::clone(&self.state)));
        self.initialized = true;
        debug!(
            container = %self.container(),
            bindings = self.bindings.len(),
            global = self.is_global(),
            "hotkey registry initialized"
        );
    }

    /// Re-reads every declaration, keeping listeners and subscription.
    pub fn rebuild(&mut self, doc: &mut dyn Document) {
        if self.initialized {
            self.parse(doc);
        } else {
            self.init(doc);
        }
    }

    /// Detaches the keydown listener and unsubscribes from the bus.
    pub fn teardown(&mut self, doc: &mut dyn Document) -> usize {
        let removed = self.listeners.detach_all(doc);
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.initialized = false;
        removed
    }

    fn parse(&mut self, doc: &dyn Document) {
        self.bindings.clear();
        self.diagnostics.clear();
        let container = self.container();
        let declared = doc.query_selector_all(container, &Selector::attribute(&self.key_attribute));
        for element in declared {
            if inside_nested_dialog(doc, container, element) {
                debug!(element = %element, "declaration belongs to a nested dialog");
                continue;
            }
            match self.parse_declaration(doc, container, element) {
                Ok(binding) => {
                    if let Some(previous) = self.bindings.insert(binding.combo, binding.clone()) {
                        debug!(
                            combo = %binding.combo,
                            replaced = %previous.declared_on,
                            by = %binding.declared_on,
                            "duplicate hotkey declaration; last one wins"
                        );
                    }
                }
                Err(diagnostic) => {
                    warn!(element = %diagnostic.element(), error = %diagnostic, "skipping hotkey declaration");
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn parse_declaration(
        &self,
        doc: &dyn Document,
        container: ElementId,
        element: ElementId,
    ) -> Result<Binding, DeclarationError> {
        let value = doc
            .attribute(element, &self.key_attribute)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| DeclarationError::Missing {
                element,
                attribute: self.key_attribute.clone(),
            })?;
        let combo: HotkeyCombo = value
            .parse()
            .map_err(|_| DeclarationError::Invalid { element, value })?;

        let target = doc
            .attribute(element, &self.target_attribute)
            .filter(|selector| !selector.trim().is_empty());
        let trigger = match target {
            None => element,
            Some(selector) => {
                let parsed = Selector::parse(&selector).map_err(|reason| DeclarationError::InvalidTarget {
                    element,
                    combo: combo.to_string(),
                    selector: selector.clone(),
                    reason: reason.to_string(),
                })?;
                doc.query_selector(container, &parsed)
                    .ok_or_else(|| DeclarationError::UnresolvedTarget {
                        element,
                        combo: combo.to_string(),
                        selector,
                    })?
            }
        };

        Ok(Binding {
            combo,
            declared_on: element,
            trigger,
        })
    }

    /// Clicks the trigger bound to the pressed combo.
    ///
    /// Inactive registries, unbound combos and keys typed into form controls
    /// (Escape excepted) are ignored. Hotkeys never prevent the default
    /// action.
    pub fn handle_key(&self, doc: &mut dyn Document, event: &KeyboardEvent) -> EventOutcome {
        if !self.state.is_active() {
            return EventOutcome::Ignored;
        }
        let normalized = normalize::normalize(event);
        let Some(key) = normalized.key else {
            return EventOutcome::Ignored;
        };
        if key != CanonicalKey::Escape && is_input_target(doc, event.target) {
            return EventOutcome::Ignored;
        }
        let Some(combo) = HotkeyCombo::from_key(normalized) else {
            return EventOutcome::Ignored;
        };
        let Some(binding) = self.bindings.get(&combo) else {
            return EventOutcome::Ignored;
        };
        if !doc.contains_element(binding.trigger) {
            error!(combo = %combo, trigger = %binding.trigger, "hotkey trigger is no longer in the document");
            return EventOutcome::Ignored;
        }
        debug!(combo = %combo, trigger = %binding.trigger, "hotkey fired");
        doc.click(binding.trigger);
        EventOutcome::Handled { prevent_default: false }
    }

    /// Publishes this registry's own scope: its dialog container, or the
    /// global scope. Returns how many registries were notified.
    pub fn announce(&self) -> usize {
        let signal = if self.is_global() {
            ScopeSignal::ActivateGlobal
        } else {
            ScopeSignal::ActivateDialog(self.container())
        };
        self.bus.publish(signal)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn binding(&self, combo: &HotkeyCombo) -> Option<&Binding> {
        self.bindings.get(combo)
    }

    pub fn diagnostics(&self) -> &[DeclarationError] {
        &self.diagnostics
    }

    pub fn container(&self) -> ElementId {
        self.state.container()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_global(&self) -> bool {
        self.state.is_global()
    }

    pub fn set_active(&self, active: bool) {
        self.state.set_active(active);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn listens(&self, doc: &dyn Document, target: ElementId, kind: EventKind) -> bool {
        self.listeners.covers(doc, target, kind)
    }
}

/// Whether a `dialog` element sits between `container` and `element`.
fn inside_nested_dialog(doc: &dyn Document, container: ElementId, element: ElementId) -> bool {
    let mut current = doc.parent(element);
    while let Some(id) = current {
        if id == container {
            return false;
        }
        if doc.tag_name(id).is_some_and(|tag| tag.eq_ignore_ascii_case(attributes::DIALOG)) {
            return true;
        }
        current = doc.parent(id);
    }
    false
}

fn is_input_target(doc: &dyn Document, target: Option<ElementId>) -> bool {
    target
        .and_then(|target| doc.tag_name(target))
        .is_some_and(|tag| INPUT_TAGS.iter().any(|input| tag.eq_ignore_ascii_case(input)))
}
