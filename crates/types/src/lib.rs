//! # Keynav Types
//!
//! Shared vocabulary for the keynav workspace: canonical key names, key
//! chords, element and listener handles, raw keyboard events, scope signals
//! and the declarative attribute names read from documents.
//!
//! Nothing in this crate performs I/O or holds state; it is safe to depend on
//! from every other crate in the workspace.

pub mod attributes;
pub mod event;
pub mod keys;

pub use event::{ElementId, EventKind, KeyboardEvent, ListenerId, ScopeSignal};
pub use keys::{CanonicalKey, KeyChord, Modifier, ParseKeyError};
