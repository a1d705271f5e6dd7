//! Attribute names and values that make up the declarative markup contract.
//!
//! Markup authors mark list containers, list items, hotkey triggers and extra
//! focus-trap targets with these attributes. The activation marker is the
//! `tabindex` attribute itself: `"0"` marks the roving-tabindex target and
//! `"-1"` marks an item reachable only through script.

/// Marks an element as a navigable list container.
pub const LIST: &str = "data-knw-list";

/// Marks a descendant of a list container as a navigable item.
pub const LIST_ITEM: &str = "data-knw-list-item";

/// Declares a hotkey combination on an element (e.g. `alt+s`).
pub const HOTKEY_KEY: &str = "data-knw-hotkeys-key";

/// Optional selector resolving the element that a hotkey should click when it
/// differs from the declaring element.
pub const HOTKEY_TARGET: &str = "data-knw-hotkeys-target";

/// Marks extra elements as focus-trap targets.
pub const ACTIVATABLE: &str = "data-knw-activatable";

/// Roving tabindex attribute.
pub const TABINDEX: &str = "tabindex";

/// `tabindex` value of the single active item.
pub const TABINDEX_ACTIVE: &str = "0";

/// `tabindex` value of every other item.
pub const TABINDEX_ROVING: &str = "-1";

/// Tag of dialog containers. Hotkeys declared inside one belong to that
/// dialog's registry, never to an enclosing registry.
pub const DIALOG: &str = "dialog";

/// Element id attribute, used by `#id` selectors.
pub const ID: &str = "id";

/// Class list attribute, used by `.class` selectors.
pub const CLASS: &str = "class";

/// Elements carrying this attribute are not rendered by hosts.
pub const HIDDEN: &str = "hidden";

/// Disabled form controls are skipped by the default focus-trap selector.
pub const DISABLED: &str = "disabled";
