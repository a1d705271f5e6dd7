//! Demo application state.
//!
//! [`App`] owns a [`KeynavHost`] over an in-memory document and plays the
//! part of the browser around it: it forwards terminal keys as keydowns,
//! performs the default actions nobody prevented (native Tab order, Enter and
//! Space on buttons and links) and opens or closes dialogs when elements
//! carrying [`DIALOG_OPEN`] / [`DIALOG_CLOSE`] get clicked.

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keynav_engine::{
    ComponentId, DEFAULT_ACTIVATABLE, DispatchOutcome, Document, FocusTrapOptions, HotkeyOptions, HotkeyScope,
    KeynavHost, MemoryDocument, Selector, normalize,
};
use keynav_types::{CanonicalKey, ElementId, KeyboardEvent, ScopeSignal, attributes};
use keynav_util::KeynavConfig;
use tracing::{debug, info, warn};

use crate::input;

/// Clicking an element with this attribute opens the dialog its value selects.
pub const DIALOG_OPEN: &str = "data-knw-dialog-open";

/// Clicking an element with this attribute closes the dialog around it.
pub const DIALOG_CLOSE: &str = "data-knw-dialog-close";

#[derive(Debug, Clone, Copy)]
struct OpenDialog {
    container: ElementId,
    trap: ComponentId,
    opener: Option<ElementId>,
}

/// A hotkey currently able to fire, for the hint bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyHint {
    pub combo: String,
    pub label: String,
}

#[derive(Debug)]
pub struct App {
    host: KeynavHost<MemoryDocument>,
    config: KeynavConfig,
    lists: Vec<ComponentId>,
    open_dialogs: Vec<OpenDialog>,
    tab_stops: Selector,
    status: String,
    last_outcome: Option<DispatchOutcome>,
    should_quit: bool,
}

impl App {
    /// Attaches list navigators for every configured list container, a
    /// global hotkey registry over `<main>` (or the whole document) and one
    /// dialog registry per `<dialog>`, then focuses the first tab stop.
    pub fn new(document: MemoryDocument, config: KeynavConfig) -> Result<Self> {
        let mut host = KeynavHost::new(document);
        let lists = host
            .attach_lists_from_config(&config)
            .context("failed to attach list navigators")?;

        let root = host.document().root();
        let main = host
            .document()
            .query_selector(root, &Selector::parse("main")?)
            .unwrap_or(root);
        host.attach_hotkeys(HotkeyOptions::from_config(&config.selectors).container(main))
            .context("failed to attach global hotkeys")?;

        let dialogs = host.document().query_selector_all(root, &Selector::parse(attributes::DIALOG)?);
        for dialog in dialogs {
            let options = HotkeyOptions::from_config(&config.selectors)
                .container(dialog)
                .scope(HotkeyScope::Dialog);
            host.attach_hotkeys(options)
                .with_context(|| format!("failed to attach hotkeys for dialog {dialog}"))?;
        }

        let source = config.selectors.activatable.as_deref().unwrap_or(DEFAULT_ACTIVATABLE);
        let tab_stops =
            Selector::parse(source).with_context(|| format!("invalid activatable selector {source:?}"))?;

        let mut app = Self {
            host,
            config,
            lists,
            open_dialogs: Vec::new(),
            tab_stops,
            status: "Ready".to_string(),
            last_outcome: None,
            should_quit: false,
        };
        if let Some(first) = app.tab_order().first().copied() {
            app.host.document_mut().focus(first);
        }
        info!(lists = app.lists.len(), "demo document attached");
        Ok(app)
    }

    pub fn document(&self) -> &MemoryDocument {
        self.host.document()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_outcome(&self) -> Option<&DispatchOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Topmost open dialog.
    pub fn open_dialog(&self) -> Option<ElementId> {
        self.open_dialogs.last().map(|open| open.container)
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Bindings of every registry that is currently active.
    pub fn hotkey_hints(&self) -> Vec<HotkeyHint> {
        let doc = self.host.document();
        self.host
            .hotkey_registries()
            .filter(|(_, registry)| registry.is_active())
            .flat_map(|(_, registry)| registry.bindings())
            .map(|binding| HotkeyHint {
                combo: binding.combo.to_string(),
                label: element_label(doc, binding.declared_on),
            })
            .collect()
    }

    /// Feeds one terminal key press through the document.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return Ok(());
        }
        let target = self.host.document().active_element();
        let Some(event) = input::to_keyboard_event(&key, target) else {
            return Ok(());
        };
        let mut outcome = self.host.dispatch_key(&event);
        if !outcome.prevent_default {
            self.default_action(&event, &mut outcome);
        }
        self.follow_clicks(&outcome.clicks)?;
        self.status = self.describe(&event, &outcome);
        self.last_outcome = Some(outcome);
        Ok(())
    }

    fn default_action(&mut self, event: &KeyboardEvent, outcome: &mut DispatchOutcome) {
        match normalize(event).key {
            Some(CanonicalKey::Tab) => self.native_tab(event.shift_key),
            Some(CanonicalKey::Enter | CanonicalKey::Space) => {
                if let Some(target) = event.target
                    && is_clickable(self.host.document(), target)
                {
                    let followed = self.host.dispatch_click(target);
                    outcome.clicks.push(target);
                    outcome.clicks.extend(followed.clicks);
                }
            }
            _ => {}
        }
    }

    /// Moves focus along the rendered tab stops in document order.
    fn native_tab(&mut self, backwards: bool) {
        let stops = self.tab_order();
        if stops.is_empty() {
            return;
        }
        let current = self
            .host
            .document()
            .active_element()
            .and_then(|active| stops.iter().position(|stop| *stop == active));
        let next = match (current, backwards) {
            (Some(index), false) => (index + 1) % stops.len(),
            (Some(index), true) => (index + stops.len() - 1) % stops.len(),
            (None, false) => 0,
            (None, true) => stops.len() - 1,
        };
        self.host.document_mut().focus(stops[next]);
    }

    fn tab_order(&self) -> Vec<ElementId> {
        let doc = self.host.document();
        doc.query_selector_all(doc.root(), &self.tab_stops)
            .into_iter()
            .filter(|element| is_rendered(doc, *element))
            .collect()
    }

    fn follow_clicks(&mut self, clicks: &[ElementId]) -> Result<()> {
        for &clicked in clicks {
            let doc = self.host.document();
            let opens = doc.attribute(clicked, DIALOG_OPEN);
            let closes = doc.attribute(clicked, DIALOG_CLOSE).is_some();
            if let Some(selector) = opens {
                let parsed = Selector::parse(&selector)
                    .with_context(|| format!("invalid {DIALOG_OPEN} selector {selector:?} on {clicked}"))?;
                let dialog = doc.query_selector(doc.root(), &parsed);
                match dialog {
                    Some(dialog) => self.open(dialog, Some(clicked))?,
                    None => warn!(selector = %selector, opener = %clicked, "dialog opener matches nothing"),
                }
            } else if closes && let Some(dialog) = self.dialog_around(clicked) {
                self.close(dialog);
            }
        }
        Ok(())
    }

    fn dialog_around(&self, element: ElementId) -> Option<ElementId> {
        let doc = self.host.document();
        self.open_dialogs
            .iter()
            .rev()
            .find(|open| doc.contains(open.container, element))
            .map(|open| open.container)
    }

    /// Shows `dialog`, traps focus inside it and hands hotkeys to its registry.
    pub fn open(&mut self, dialog: ElementId, opener: Option<ElementId>) -> Result<()> {
        if self.open_dialogs.iter().any(|open| open.container == dialog) {
            return Ok(());
        }
        self.host.document_mut().remove_attribute(dialog, attributes::HIDDEN);
        let trap = self
            .host
            .attach_focus_trap(dialog, FocusTrapOptions::from_config(&self.config.selectors))
            .with_context(|| format!("failed to trap focus in dialog {dialog}"))?;
        self.host.publish(ScopeSignal::ActivateDialog(dialog));
        if let Some(first) = self.host.focus_trap(trap).and_then(|trap| trap.items().first().copied()) {
            self.host.document_mut().focus(first);
        }
        self.open_dialogs.push(OpenDialog {
            container: dialog,
            trap,
            opener,
        });
        debug!(dialog = %dialog, "opened dialog");
        Ok(())
    }

    /// Hides `dialog`, releases its trap and returns hotkeys to whatever is
    /// underneath. Focus goes back to the element that opened it.
    pub fn close(&mut self, dialog: ElementId) {
        let Some(index) = self.open_dialogs.iter().position(|open| open.container == dialog) else {
            return;
        };
        let closed = self.open_dialogs.remove(index);
        self.host.detach(closed.trap);
        self.host.document_mut().set_attribute(dialog, attributes::HIDDEN, "");
        let signal = match self.open_dialogs.last() {
            Some(top) => ScopeSignal::ActivateDialog(top.container),
            None => ScopeSignal::ActivateGlobal,
        };
        self.host.publish(signal);
        if let Some(opener) = closed.opener {
            self.host.document_mut().focus(opener);
        }
        debug!(dialog = %dialog, "closed dialog");
    }

    fn describe(&self, event: &KeyboardEvent, outcome: &DispatchOutcome) -> String {
        let doc = self.host.document();
        let key = normalize(event)
            .chord()
            .map(|chord| chord.to_string())
            .unwrap_or_else(|| event.key.clone().unwrap_or_default());
        if let Some(&clicked) = outcome.clicks.last() {
            return format!("{key}: activated {}", element_label(doc, clicked));
        }
        match doc.active_element() {
            Some(focused) if outcome.is_claimed() => format!("{key}: focus on {}", element_label(doc, focused)),
            Some(focused) if event.target != Some(focused) => {
                format!("{key}: focus on {}", element_label(doc, focused))
            }
            _ => format!("{key}: no handler"),
        }
    }
}

/// Text of an element, or a `<tag#id>` placeholder when it has none.
pub fn element_label(doc: &MemoryDocument, element: ElementId) -> String {
    if let Some(text) = doc.text(element).filter(|text| !text.trim().is_empty()) {
        return text.to_string();
    }
    let tag = doc.tag_name(element).unwrap_or_default();
    match doc.attribute(element, attributes::ID) {
        Some(id) => format!("<{tag}#{id}>"),
        None => format!("<{tag}>"),
    }
}

/// False when the element or any ancestor carries `hidden`.
pub fn is_rendered(doc: &dyn Document, element: ElementId) -> bool {
    let mut current = Some(element);
    while let Some(node) = current {
        if doc.attribute(node, attributes::HIDDEN).is_some() {
            return false;
        }
        current = doc.parent(node);
    }
    true
}

fn is_clickable(doc: &dyn Document, element: ElementId) -> bool {
    doc.tag_name(element)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("button") || tag.eq_ignore_ascii_case("a"))
}
