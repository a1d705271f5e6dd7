//! Key event normalization.
//!
//! Turns a raw [`KeyboardEvent`] into a [`CanonicalKey`] plus at most one
//! [`Modifier`]. Pure functions, no state.

use keynav_types::{CanonicalKey, KeyChord, KeyboardEvent, Modifier};
use keynav_util::legacy_keycodes;

/// Legacy codes reported for Shift, Control and Alt pressed on their own.
const MODIFIER_CODES: [u16; 3] = [16, 17, 18];

const MODIFIER_KEY_NAMES: [&str; 5] = ["Shift", "Alt", "Control", "Meta", "AltGraph"];

/// Result of normalizing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedKey {
    /// `None` when the event does not map to any canonical key.
    pub key: Option<CanonicalKey>,
    pub modifier: Option<Modifier>,
}

impl NormalizedKey {
    /// Chord form of the event, or `None` for unrecognized keys.
    pub fn chord(&self) -> Option<KeyChord> {
        self.key.map(|key| KeyChord {
            modifier: self.modifier,
            key,
        })
    }

    pub fn is_recognized(&self) -> bool {
        self.key.is_some()
    }
}

pub fn normalize(event: &KeyboardEvent) -> NormalizedKey {
    NormalizedKey {
        key: canonical_key(event),
        modifier: modifier(event),
    }
}

/// Resolves the canonical key. The physical `Space` code wins, then the
/// modern key name, then the legacy numeric code.
pub fn canonical_key(event: &KeyboardEvent) -> Option<CanonicalKey> {
    if event.code.as_deref() == Some("Space") {
        return Some(CanonicalKey::Space);
    }
    if is_modifier_only(event) {
        return None;
    }
    match event.key.as_deref() {
        Some(name) if !name.is_empty() && name != "Unidentified" => CanonicalKey::from_key_name(name),
        _ => event
            .which
            .and_then(legacy_keycodes::code_to_name)
            .and_then(CanonicalKey::from_key_name),
    }
}

/// First held modifier in priority order Alt, Shift, Ctrl.
pub fn modifier(event: &KeyboardEvent) -> Option<Modifier> {
    if event.alt_key {
        Some(Modifier::Alt)
    } else if event.shift_key {
        Some(Modifier::Shift)
    } else if event.ctrl_key {
        Some(Modifier::Ctrl)
    } else {
        None
    }
}

/// True when the key pressed is itself a modifier.
pub fn is_modifier_only(event: &KeyboardEvent) -> bool {
    match event.key.as_deref() {
        Some(name) if !name.is_empty() && name != "Unidentified" => MODIFIER_KEY_NAMES.contains(&name),
        _ => event.which.is_some_and(|code| MODIFIER_CODES.contains(&code)),
    }
}
