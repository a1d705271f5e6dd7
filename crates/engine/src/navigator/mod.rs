//! Roving-focus list navigation.
//!
//! A [`ListNavigator`] keeps an ordered view of the items of one list and
//! maps key chords to operations through its [`OperationTable`]. Its only
//! observable output is the `tabindex` attribute of items (`"0"` on the single
//! active item, `"-1"` elsewhere), document focus, and synthetic clicks.
//!
//! ```no_run
//! use keynav_engine::{Document, ListNavigator, MemoryDocument};
//!
//! let mut doc = MemoryDocument::new();
//! let root = doc.root();
//! let list = doc.append_with(root, "ul", &[("data-knw-list", "")]);
//! let items: Vec<_> = ["A", "B", "C"]
//!     .iter()
//!     .map(|_| doc.append_with(list, "li", &[("data-knw-list-item", "")]))
//!     .collect();
//! let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc)?;
//! assert_eq!(nav.active_item(&doc), Some(items[0]));
//! # Ok::<(), keynav_engine::KeynavError>(())
//! ```

mod operations;
mod source;

use std::time::{Duration, Instant};

use anyhow::Context;
use indexmap::IndexMap;
use keynav_types::{ElementId, EventKind, KeyChord, KeyboardEvent, attributes};
use keynav_util::KeynavConfig;
use tracing::debug;

pub use operations::{BuiltinOperation, CustomOperation, Disposition, Handler, Operation, OperationFn, OperationTable};
pub use source::{DEFAULT_CACHE_TTL, ItemSource};

use crate::document::{Document, EventOutcome, ListenerSet};
use crate::error::KeynavError;
use crate::normalize;
use crate::selector::Selector;

const COMPONENT: &str = "list navigator";

#[derive(Debug, Clone)]
enum SourceSpec {
    Static(Vec<ElementId>),
    Live { container: ElementId, selector: String },
}

/// Configures and builds a [`ListNavigator`].
#[derive(Debug, Clone)]
pub struct ListNavigatorBuilder {
    source: Option<SourceSpec>,
    cache_ttl: Duration,
    operations: OperationTable,
    auto_init: bool,
}

impl Default for ListNavigatorBuilder {
    fn default() -> Self {
        Self {
            source: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            operations: OperationTable::default(),
            auto_init: true,
        }
    }
}

impl ListNavigatorBuilder {
    /// Navigates a fixed snapshot of items, in the given order.
    pub fn static_items(mut self, items: impl IntoIterator<Item = ElementId>) -> Self {
        self.source = Some(SourceSpec::Static(items.into_iter().collect()));
        self
    }

    /// Navigates whatever `selector` matches inside `container`, re-queried
    /// once the cached result is older than the cache TTL.
    pub fn live_query(mut self, container: ElementId, selector: impl Into<String>) -> Self {
        self.source = Some(SourceSpec::Live {
            container,
            selector: selector.into(),
        });
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Overrides an existing operation or adds a new one. Malformed additions
    /// are dropped without error.
    pub fn custom_operation(mut self, name: &str, operation: CustomOperation) -> Self {
        self.operations.apply(name, operation);
        self
    }

    /// Rebinds operation keys by name.
    pub fn key_overrides(mut self, overrides: &IndexMap<String, Vec<KeyChord>>) -> Self {
        for (name, keys) in overrides {
            self.operations.apply(name, CustomOperation::new().keys(keys.iter().copied()));
        }
        self
    }

    /// Applies cache TTL and key overrides from a loaded configuration.
    pub fn with_config(self, config: &KeynavConfig) -> Self {
        self.cache_ttl(config.cache_ttl()).key_overrides(&config.key_overrides)
    }

    /// Whether `build` initializes the navigator right away (default `true`).
    pub fn auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = auto_init;
        self
    }

    pub fn build(self, doc: &mut dyn Document) -> Result<ListNavigator, KeynavError> {
        let source = match self.source {
            None => return Err(KeynavError::MissingItems { component: COMPONENT }),
            Some(SourceSpec::Static(items)) => {
                if let Some(missing) = items.iter().find(|item| !doc.contains_element(**item)) {
                    return Err(KeynavError::UnknownElement {
                        component: COMPONENT,
                        element: *missing,
                    });
                }
                ItemSource::snapshot(items)
            }
            Some(SourceSpec::Live { container, selector }) => {
                if !doc.contains_element(container) {
                    return Err(KeynavError::UnknownElement {
                        component: COMPONENT,
                        element: container,
                    });
                }
                let parsed = Selector::parse(&selector)
                    .map_err(|source| KeynavError::InvalidSelector { selector, source })?;
                ItemSource::live(container, parsed, self.cache_ttl)
            }
        };

        let mut navigator = ListNavigator {
            source,
            operations: self.operations,
            focused: None,
            listeners: ListenerSet::default(),
            initialized: false,
        };
        if self.auto_init {
            navigator.init(doc);
        }
        Ok(navigator)
    }
}

#[derive(Debug)]
pub struct ListNavigator {
    source: ItemSource,
    operations: OperationTable,
    focused: Option<ElementId>,
    listeners: ListenerSet,
    initialized: bool,
}

impl ListNavigator {
    pub fn builder() -> ListNavigatorBuilder {
        ListNavigatorBuilder::default()
    }

    /// Attaches listeners and marks the entry point: the pre-marked active
    /// item, else the first item. No-op when already initialized.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.initialized {
            debug!("list navigator already initialized");
            return;
        }
        match self.source.container() {
            Some(container) => {
                self.listeners.attach(doc, container, EventKind::KeyDown);
                self.listeners.attach(doc, container, EventKind::Click);
            }
            None => {
                for item in self.items(doc) {
                    self.listeners.attach(doc, item, EventKind::KeyDown);
                    self.listeners.attach(doc, item, EventKind::Click);
                }
            }
        }
        let entry = match self.active_item(doc) {
            Some(active) => Some(active),
            None => self.first(doc),
        };
        if let Some(entry) = entry {
            self.activate_item(doc, entry);
        }
        self.initialized = true;
        debug!(listeners = self.listeners.len(), entry = ?entry, "list navigator initialized");
    }

    /// Detaches exactly the listeners `init` attached. Returns how many were
    /// removed.
    pub fn teardown(&mut self, doc: &mut dyn Document) -> usize {
        let removed = self.listeners.detach_all(doc);
        self.initialized = false;
        removed
    }

    /// Re-scans from scratch: drops the cache and removals, then
    /// re-initializes.
    pub fn rebuild(&mut self, doc: &mut dyn Document) {
        self.teardown(doc);
        self.source.reset();
        self.focused = None;
        self.init(doc);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn items(&mut self, doc: &dyn Document) -> Vec<ElementId> {
        self.items_at(doc, Instant::now())
    }

    pub fn items_at(&mut self, doc: &dyn Document, now: Instant) -> Vec<ElementId> {
        self.source.items_at(doc, now)
    }

    /// Item last moved to with `focus_item`.
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    /// Whether an event of `kind` on `target` reaches this navigator.
    pub fn listens(&self, doc: &dyn Document, target: ElementId, kind: EventKind) -> bool {
        self.listeners.covers(doc, target, kind)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The tracked item that is `target` or contains it.
    pub fn item_for(&mut self, doc: &dyn Document, target: ElementId) -> Option<ElementId> {
        let items = self.items(doc);
        let mut current = Some(target);
        while let Some(id) = current {
            if items.contains(&id) {
                return Some(id);
            }
            current = doc.parent(id);
        }
        None
    }

    pub fn active_item(&mut self, doc: &dyn Document) -> Option<ElementId> {
        self.items(doc).into_iter().find(|item| is_active(doc, *item))
    }

    pub fn first(&mut self, doc: &dyn Document) -> Option<ElementId> {
        self.items(doc).first().copied()
    }

    pub fn last(&mut self, doc: &dyn Document) -> Option<ElementId> {
        self.items(doc).last().copied()
    }

    /// Item after `item`, wrapping to the first. Unknown items yield the
    /// first item.
    pub fn next_of(&mut self, doc: &dyn Document, item: ElementId) -> Option<ElementId> {
        let items = self.items(doc);
        match items.iter().position(|candidate| *candidate == item) {
            Some(index) => items.get(index + 1).or_else(|| items.first()).copied(),
            None => items.first().copied(),
        }
    }

    /// Item before `item`, wrapping to the last. Unknown items yield the
    /// first item.
    pub fn prev_of(&mut self, doc: &dyn Document, item: ElementId) -> Option<ElementId> {
        let items = self.items(doc);
        match items.iter().position(|candidate| *candidate == item) {
            Some(0) => items.last().copied(),
            Some(index) => items.get(index - 1).copied(),
            None => items.first().copied(),
        }
    }

    /// Makes `item` keyboard reachable and focuses it.
    pub fn focus_item(&mut self, doc: &mut dyn Document, item: ElementId) {
        let tab_index = doc.tab_index(item);
        if !matches!(
            tab_index.as_deref(),
            Some(attributes::TABINDEX_ACTIVE) | Some(attributes::TABINDEX_ROVING)
        ) {
            doc.set_attribute(item, attributes::TABINDEX, attributes::TABINDEX_ROVING);
        }
        doc.focus(item);
        self.focused = Some(item);
    }

    /// Marks `item` as the single active item. Writes nothing for an item
    /// that is already the only active one.
    pub fn activate_item(&mut self, doc: &mut dyn Document, item: ElementId) {
        for other in self.items(doc) {
            if other != item && is_active(doc, other) {
                self.deactivate_item(doc, other);
            }
        }
        if !is_active(doc, item) {
            doc.set_attribute(item, attributes::TABINDEX, attributes::TABINDEX_ACTIVE);
            debug!(item = %item, "activated list item");
        }
    }

    pub fn deactivate_item(&mut self, doc: &mut dyn Document, item: ElementId) {
        if doc.tab_index(item).as_deref() != Some(attributes::TABINDEX_ROVING) {
            doc.set_attribute(item, attributes::TABINDEX, attributes::TABINDEX_ROVING);
        }
    }

    /// Stops tracking `item`; the element itself stays in the document.
    ///
    /// Removing the active item hands the active marker to the previous
    /// item, so a non-empty list always keeps one entry point.
    pub fn remove_item(&mut self, doc: &mut dyn Document, item: ElementId) -> bool {
        let was_active = is_active(doc, item);
        let successor = self.prev_of(doc, item).filter(|prev| *prev != item);
        if !self.source.remove(doc, item, Instant::now()) {
            return false;
        }
        if self.focused == Some(item) {
            self.focused = None;
        }
        if was_active {
            self.deactivate_item(doc, item);
            if let Some(next) = successor.or_else(|| self.first(doc)) {
                self.activate_item(doc, next);
            }
        }
        true
    }

    /// Runs every operation bound to the event's chord.
    ///
    /// Modifier-only and unrecognized keys are ignored. A failing custom
    /// handler stops the dispatch and its error is returned.
    pub fn handle_key(&mut self, doc: &mut dyn Document, event: &KeyboardEvent) -> anyhow::Result<EventOutcome> {
        if normalize::is_modifier_only(event) {
            return Ok(EventOutcome::Ignored);
        }
        let Some(chord) = normalize::normalize(event).chord() else {
            return Ok(EventOutcome::Ignored);
        };
        let matched = self.operations.matching(&chord);
        if matched.is_empty() {
            return Ok(EventOutcome::Ignored);
        }

        let mut prevent_default = false;
        for (name, handler) in matched {
            debug!(operation = %name, key = %chord, "running list operation");
            let disposition = match handler {
                Handler::Builtin(operation) => self.run_builtin(doc, operation, event),
                Handler::Custom(run) => {
                    run(self, doc, event).with_context(|| format!("list operation {name} failed"))?
                }
            };
            prevent_default |= disposition == Disposition::PreventDefault;
        }
        Ok(EventOutcome::Handled { prevent_default })
    }

    /// Runs a built-in operation against the item holding the event target.
    /// Custom handlers may call this to extend a built-in.
    pub fn run_builtin(
        &mut self,
        doc: &mut dyn Document,
        operation: BuiltinOperation,
        event: &KeyboardEvent,
    ) -> Disposition {
        let current = event.target.and_then(|target| self.item_for(doc, target));
        match operation {
            BuiltinOperation::Activate => {
                if let Some(item) = current {
                    doc.click(item);
                }
            }
            BuiltinOperation::Next => {
                let next = match current {
                    Some(item) => self.next_of(doc, item),
                    None => self.first(doc),
                };
                if let Some(next) = next {
                    self.focus_item(doc, next);
                }
            }
            BuiltinOperation::Prev => {
                let prev = match current {
                    Some(item) => self.prev_of(doc, item),
                    None => self.first(doc),
                };
                if let Some(prev) = prev {
                    self.focus_item(doc, prev);
                }
            }
            BuiltinOperation::First => {
                if let Some(first) = self.first(doc) {
                    self.focus_item(doc, first);
                }
            }
            BuiltinOperation::Last => {
                if let Some(last) = self.last(doc) {
                    self.focus_item(doc, last);
                }
            }
            BuiltinOperation::Remove => {
                if let Some(item) = current {
                    if let Some(prev) = self.prev_of(doc, item) {
                        self.focus_item(doc, prev);
                    }
                    self.remove_item(doc, item);
                    debug!(item = %item, "removed list item");
                }
            }
        }
        Disposition::PreventDefault
    }

    /// Click on an item focuses and then activates it.
    pub fn handle_click(&mut self, doc: &mut dyn Document, target: ElementId) -> EventOutcome {
        let Some(item) = self.item_for(doc, target) else {
            return EventOutcome::Ignored;
        };
        self.focus_item(doc, item);
        self.activate_item(doc, item);
        EventOutcome::Handled { prevent_default: false }
    }
}

fn is_active(doc: &dyn Document, item: ElementId) -> bool {
    doc.tab_index(item).as_deref() == Some(attributes::TABINDEX_ACTIVE)
}

/// Builds one static-snapshot navigator per list container, each configured
/// from `template`.
pub fn lists_from_document(
    doc: &mut dyn Document,
    list_selector: &str,
    item_selector: &str,
    template: &ListNavigatorBuilder,
) -> Result<Vec<ListNavigator>, KeynavError> {
    let lists = parse_selector(list_selector)?;
    let items = parse_selector(item_selector)?;
    let root = doc.root();
    let containers = doc.query_selector_all(root, &lists);
    let mut navigators = Vec::with_capacity(containers.len());
    for container in containers {
        let found = doc.query_selector_all(container, &items);
        navigators.push(template.clone().static_items(found).build(doc)?);
    }
    debug!(lists = navigators.len(), "built list navigators from document");
    Ok(navigators)
}

fn parse_selector(selector: &str) -> Result<Selector, KeynavError> {
    Selector::parse(selector).map_err(|source| KeynavError::InvalidSelector {
        selector: selector.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    fn fixture(marked: Option<usize>) -> (MemoryDocument, ElementId, Vec<ElementId>) {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let ul = doc.append_with(root, "ul", &[("data-knw-list", "")]);
        let items = (0..3)
            .map(|index| {
                let tab_index = if marked == Some(index) { "0" } else { "-1" };
                doc.append_with(ul, "li", &[("data-knw-list-item", ""), ("tabindex", tab_index)])
            })
            .collect();
        (doc, ul, items)
    }

    fn active_count(doc: &MemoryDocument, items: &[ElementId]) -> usize {
        items.iter().filter(|item| is_active(doc, **item)).count()
    }

    #[test]
    fn build_without_source_fails() {
        let mut doc = MemoryDocument::new();
        let err = ListNavigator::builder().build(&mut doc).unwrap_err();
        assert!(matches!(err, KeynavError::MissingItems { .. }));
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn build_rejects_unknown_elements_and_bad_selectors() {
        let mut doc = MemoryDocument::new();
        let err = ListNavigator::builder()
            .static_items([ElementId(42)])
            .build(&mut doc)
            .unwrap_err();
        assert!(matches!(err, KeynavError::UnknownElement { element: ElementId(42), .. }));

        let root = doc.root();
        let err = ListNavigator::builder()
            .live_query(root, "ul li")
            .build(&mut doc)
            .unwrap_err();
        assert!(matches!(err, KeynavError::InvalidSelector { .. }));
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn init_prefers_pre_marked_item() {
        let (mut doc, _, items) = fixture(Some(1));
        let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
        assert_eq!(nav.active_item(&doc), Some(items[1]));
        assert_eq!(active_count(&doc, &items), 1);
    }

    #[test]
    fn init_is_idempotent() {
        let (mut doc, _, items) = fixture(None);
        let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
        let listeners = doc.listener_count();
        let writes = doc.attribute_writes();
        nav.init(&mut doc);
        assert_eq!(doc.listener_count(), listeners);
        assert_eq!(doc.attribute_writes(), writes);
    }

    #[test]
    fn activating_collapses_duplicate_markers() {
        let (mut doc, _, items) = fixture(None);
        doc.set_attribute(items[0], "tabindex", "0");
        doc.set_attribute(items[2], "tabindex", "0");
        let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
        assert_eq!(active_count(&doc, &items), 1);
        nav.activate_item(&mut doc, items[1]);
        assert_eq!(active_count(&doc, &items), 1);
        assert_eq!(nav.active_item(&doc), Some(items[1]));
    }

    #[test]
    fn focus_makes_unmarked_items_reachable() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let item = doc.append(root, "li");
        let mut nav = ListNavigator::builder()
            .static_items([item])
            .auto_init(false)
            .build(&mut doc)
            .unwrap();
        nav.focus_item(&mut doc, item);
        assert_eq!(doc.tab_index(item).as_deref(), Some("-1"));
        assert_eq!(doc.active_element(), Some(item));
        assert_eq!(nav.focused(), Some(item));
    }

    #[test]
    fn neighbours_wrap_and_unknown_items_go_first() {
        let (mut doc, _, items) = fixture(None);
        let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
        assert_eq!(nav.next_of(&doc, items[2]), Some(items[0]));
        assert_eq!(nav.prev_of(&doc, items[0]), Some(items[2]));
        assert_eq!(nav.next_of(&doc, ElementId(999)), Some(items[0]));
        assert_eq!(nav.prev_of(&doc, ElementId(999)), Some(items[0]));
    }

    #[test]
    fn empty_list_operations_are_no_ops() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let ul = doc.append(root, "ul");
        let mut nav = ListNavigator::builder()
            .live_query(ul, "[data-knw-list-item]")
            .build(&mut doc)
            .unwrap();
        let outcome = nav.handle_key(&mut doc, &KeyboardEvent::key(ul, "ArrowDown")).unwrap();
        assert!(outcome.prevents_default());
        assert_eq!(doc.active_element(), None);
        assert_eq!(doc.attribute_writes(), 0);
    }

    #[test]
    fn tab_and_modifier_only_keys_are_ignored() {
        let (mut doc, _, items) = fixture(None);
        let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
        let tab = nav.handle_key(&mut doc, &KeyboardEvent::key(items[0], "Tab")).unwrap();
        assert_eq!(tab, EventOutcome::Ignored);
        let shift = nav
            .handle_key(&mut doc, &KeyboardEvent::key(items[0], "Shift").with_shift())
            .unwrap();
        assert_eq!(shift, EventOutcome::Ignored);
        let unknown = nav.handle_key(&mut doc, &KeyboardEvent::key(items[0], "F7")).unwrap();
        assert_eq!(unknown, EventOutcome::Ignored);
    }

    #[test]
    fn click_focuses_then_activates() {
        let (mut doc, _, items) = fixture(None);
        let mut nav = ListNavigator::builder().static_items(items.clone()).build(&mut doc).unwrap();
        let outcome = nav.handle_click(&mut doc, items[2]);
        assert_eq!(outcome, EventOutcome::Handled { prevent_default: false });
        assert_eq!(nav.focused(), Some(items[2]));
        assert_eq!(nav.active_item(&doc), Some(items[2]));
        assert_eq!(active_count(&doc, &items), 1);
    }

    #[test]
    fn failing_custom_handler_reports_operation_name() {
        let (mut doc, _, items) = fixture(None);
        let mut nav = ListNavigator::builder()
            .static_items(items.clone())
            .custom_operation(
                "NEXT",
                CustomOperation::new().handler(|_, _, _| Err(anyhow::anyhow!("boom"))),
            )
            .build(&mut doc)
            .unwrap();
        let err = nav
            .handle_key(&mut doc, &KeyboardEvent::key(items[0], "ArrowDown"))
            .unwrap_err();
        assert!(err.to_string().contains("NEXT"));
    }

    #[test]
    fn lists_from_document_builds_one_navigator_per_container() {
        let (mut doc, _, items) = fixture(None);
        let root = doc.root();
        let second = doc.append_with(root, "ol", &[("data-knw-list", "")]);
        let lone = doc.append_with(second, "li", &[("data-knw-list-item", "")]);
        let template = ListNavigator::builder().cache_ttl(Duration::ZERO);
        let mut navs = lists_from_document(&mut doc, "[data-knw-list]", "[data-knw-list-item]", &template).unwrap();
        assert_eq!(navs.len(), 2);
        assert_eq!(navs[0].items(&doc), items);
        assert_eq!(navs[1].items(&doc), vec![lone]);
        assert_eq!(doc.tab_index(lone).as_deref(), Some("0"));
    }
}
