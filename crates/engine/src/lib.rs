//! # Keynav Engine
//!
//! Keyboard interaction for HTML-like documents: roving-focus list navigation,
//! declarative hotkeys with global and dialog scoping, and focus traps for
//! modal containers.
//!
//! ## Key Features
//!
//! - **List navigation**: arrow/Home/End/Delete semantics over a static or live
//!   item set, with a pluggable operation table
//! - **Hotkeys**: `[alt+|ctrl+](letter|digit|escape)` declarations read from
//!   element attributes, silenced inside form controls
//! - **Scoping**: dialog and global registries coordinate through a
//!   caller-owned broadcast bus
//! - **Focus traps**: Tab and Shift+Tab wrap inside a container
//!
//! ## Usage
//!
//! ```rust
//! use keynav_engine::{Document, HotkeyOptions, KeynavHost, ListNavigator, MemoryDocument};
//! use keynav_types::KeyboardEvent;
//!
//! let mut doc = MemoryDocument::new();
//! let root = doc.root();
//! let list = doc.append_with(root, "ul", &[("data-knw-list", "")]);
//! let a = doc.append_with(list, "li", &[("data-knw-list-item", "")]);
//! let b = doc.append_with(list, "li", &[("data-knw-list-item", "")]);
//!
//! let mut host = KeynavHost::new(doc);
//! host.attach_list(ListNavigator::builder().static_items([a, b]))?;
//! host.attach_hotkeys(HotkeyOptions::default())?;
//!
//! let outcome = host.dispatch_key(&KeyboardEvent::key(a, "ArrowDown"));
//! assert!(outcome.prevent_default);
//! assert_eq!(host.document().active_element(), Some(b));
//! # Ok::<(), keynav_engine::KeynavError>(())
//! ```
//!
//! ## Architecture
//!
//! - **`normalize`**: raw keyboard events to canonical keys and one modifier
//! - **`navigator`**: the list navigator, its operation table and item sources
//! - **`hotkeys`**: hotkey declarations, dispatch and scoping
//! - **`bus`**: the scope broadcast shared by hotkey registries
//! - **`focus_trap`**: Tab cycling bounded to a container
//! - **`document`** / **`selector`** / **`memory`**: the document collaborator,
//!   its selector language and an in-memory implementation
//! - **`host`**: event routing over one document and its components

pub mod bus;
pub mod document;
pub mod error;
pub mod focus_trap;
pub mod host;
pub mod hotkeys;
pub mod memory;
pub mod navigator;
pub mod normalize;
pub mod selector;

pub use bus::{ScopeBus, ScopeState, Subscription};
pub use document::{Document, EventOutcome, ListenerSet};
pub use error::{DeclarationError, KeynavError};
pub use focus_trap::{DEFAULT_ACTIVATABLE, FocusTrap, FocusTrapOptions};
pub use host::{Component, ComponentId, DispatchOutcome, KeynavHost};
pub use hotkeys::{Binding, HotkeyCombo, HotkeyKey, HotkeyModifier, HotkeyOptions, HotkeyRegistry, HotkeyScope, InvalidHotkey};
pub use memory::{DocumentSpec, ElementSpec, MemoryDocument};
pub use navigator::{
    BuiltinOperation, CustomOperation, Disposition, ItemSource, ListNavigator, ListNavigatorBuilder, OperationTable,
    lists_from_document,
};
pub use normalize::{NormalizedKey, normalize};
pub use selector::{Selector, SelectorError};
