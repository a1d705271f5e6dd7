//! Element handles, listener handles and raw keyboard events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an element owned by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for a listener registered on a document, used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Event topics components listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    KeyDown,
    Click,
}

/// A keydown as reported by the host, in any mix of modern and legacy fields.
///
/// `key` carries the modern key name, `code` the physical key name (only
/// consulted for `Space`), `which` the legacy numeric code. Modifier flags
/// mirror the boolean fields of a browser keyboard event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub target: Option<ElementId>,
    pub key: Option<String>,
    pub code: Option<String>,
    pub which: Option<u16>,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub meta_key: bool,
}

impl KeyboardEvent {
    /// Keydown with a modern key name on `target`.
    pub fn key(target: ElementId, key: impl Into<String>) -> Self {
        Self {
            target: Some(target),
            key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Keydown that only carries a legacy numeric code.
    pub fn legacy(target: ElementId, which: u16) -> Self {
        Self {
            target: Some(target),
            which: Some(which),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift_key = true;
        self
    }
}

/// Broadcast topics coordinating global and dialog-scoped hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeSignal {
    /// The registry bound to this container becomes the only active one.
    ActivateDialog(ElementId),
    /// Global registries become active, dialog registries inactive.
    ActivateGlobal,
}

impl ScopeSignal {
    pub fn topic(&self) -> &'static str {
        match self {
            ScopeSignal::ActivateDialog(_) => "activate-dialog",
            ScopeSignal::ActivateGlobal => "activate-global",
        }
    }
}
