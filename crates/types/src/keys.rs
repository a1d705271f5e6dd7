//! Canonical key names, modifiers and key chords.
//!
//! A [`CanonicalKey`] is the normalized, enumeration-constrained name for a
//! physical key press. Anything outside the enumeration is "unrecognized" and
//! is represented by the absence of a key (`None`) rather than coerced into a
//! near match.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a key, modifier or chord string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
    #[error("empty key name")]
    Empty,
    #[error("unrecognized key name: {0}")]
    UnknownKey(String),
    #[error("unrecognized modifier: {0}")]
    UnknownModifier(String),
}

/// Normalized key name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CanonicalKey {
    Escape,
    Enter,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Delete,
    Tab,
    /// A single printable character, always lowercase.
    Char(char),
}

impl CanonicalKey {
    /// Resolves a modern `KeyboardEvent.key`-style name, accepting the legacy
    /// aliases older input sources report (`Esc`, `Up`, `Spacebar`, ...).
    ///
    /// Returns `None` for names outside the canonical enumeration.
    pub fn from_key_name(name: &str) -> Option<Self> {
        if name == " " {
            return Some(CanonicalKey::Space);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_control() {
                return None;
            }
            return Some(CanonicalKey::Char(ch.to_lowercase().next().unwrap_or(ch)));
        }
        let key = match name.to_ascii_lowercase().as_str() {
            "escape" | "esc" => CanonicalKey::Escape,
            "enter" | "return" => CanonicalKey::Enter,
            "space" | "spacebar" => CanonicalKey::Space,
            "arrowup" | "up" => CanonicalKey::ArrowUp,
            "arrowdown" | "down" => CanonicalKey::ArrowDown,
            "arrowleft" | "left" => CanonicalKey::ArrowLeft,
            "arrowright" | "right" => CanonicalKey::ArrowRight,
            "home" => CanonicalKey::Home,
            "end" => CanonicalKey::End,
            "delete" | "del" => CanonicalKey::Delete,
            "tab" => CanonicalKey::Tab,
            _ => return None,
        };
        Some(key)
    }

    /// Canonical spelling used in key tables and diagnostics.
    pub fn name(&self) -> String {
        match self {
            CanonicalKey::Escape => "Escape".into(),
            CanonicalKey::Enter => "Enter".into(),
            CanonicalKey::Space => "Space".into(),
            CanonicalKey::ArrowUp => "ArrowUp".into(),
            CanonicalKey::ArrowDown => "ArrowDown".into(),
            CanonicalKey::ArrowLeft => "ArrowLeft".into(),
            CanonicalKey::ArrowRight => "ArrowRight".into(),
            CanonicalKey::Home => "Home".into(),
            CanonicalKey::End => "End".into(),
            CanonicalKey::Delete => "Delete".into(),
            CanonicalKey::Tab => "Tab".into(),
            CanonicalKey::Char(ch) => ch.to_string(),
        }
    }

    /// True for single ASCII letters and digits.
    pub fn is_alphanumeric(&self) -> bool {
        matches!(self, CanonicalKey::Char(ch) if ch.is_ascii_alphanumeric())
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for CanonicalKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseKeyError::Empty);
        }
        CanonicalKey::from_key_name(s).ok_or_else(|| ParseKeyError::UnknownKey(s.to_string()))
    }
}

impl TryFrom<String> for CanonicalKey {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonicalKey> for String {
    fn from(key: CanonicalKey) -> Self {
        key.name()
    }
}

/// Modifier held alongside a key. Only one is ever reported per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Alt,
    Ctrl,
    Shift,
}

impl Modifier {
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Alt => "Alt",
            Modifier::Ctrl => "Ctrl",
            Modifier::Shift => "Shift",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modifier {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alt" => Ok(Modifier::Alt),
            "ctrl" | "control" => Ok(Modifier::Ctrl),
            "shift" => Ok(Modifier::Shift),
            _ => Err(ParseKeyError::UnknownModifier(s.to_string())),
        }
    }
}

/// A canonical key with an optional single modifier prefix, written
/// `Modifier+Key` (e.g. `Shift+ArrowDown`) or just `Key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyChord {
    pub modifier: Option<Modifier>,
    pub key: CanonicalKey,
}

impl KeyChord {
    pub const fn new(key: CanonicalKey) -> Self {
        Self { modifier: None, key }
    }

    pub const fn with_modifier(modifier: Modifier, key: CanonicalKey) -> Self {
        Self {
            modifier: Some(modifier),
            key,
        }
    }
}

impl From<CanonicalKey> for KeyChord {
    fn from(key: CanonicalKey) -> Self {
        KeyChord::new(key)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(modifier) => write!(f, "{}+{}", modifier, self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

impl FromStr for KeyChord {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseKeyError::Empty);
        }
        if let Some((prefix, rest)) = trimmed.split_once('+')
            && !prefix.is_empty()
            && !rest.is_empty()
        {
            let modifier = prefix.parse::<Modifier>()?;
            let key = rest.parse::<CanonicalKey>()?;
            return Ok(KeyChord::with_modifier(modifier, key));
        }
        trimmed.parse::<CanonicalKey>().map(KeyChord::new)
    }
}

impl TryFrom<String> for KeyChord {
    type Error = ParseKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyChord> for String {
    fn from(chord: KeyChord) -> Self {
        chord.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_named_keys_and_aliases() {
        assert_eq!(CanonicalKey::from_key_name("ArrowDown"), Some(CanonicalKey::ArrowDown));
        assert_eq!(CanonicalKey::from_key_name("Down"), Some(CanonicalKey::ArrowDown));
        assert_eq!(CanonicalKey::from_key_name("Esc"), Some(CanonicalKey::Escape));
        assert_eq!(CanonicalKey::from_key_name(" "), Some(CanonicalKey::Space));
        assert_eq!(CanonicalKey::from_key_name("Spacebar"), Some(CanonicalKey::Space));
    }

    #[test]
    fn lowercases_printable_characters() {
        assert_eq!(CanonicalKey::from_key_name("S"), Some(CanonicalKey::Char('s')));
        assert_eq!(CanonicalKey::from_key_name("7"), Some(CanonicalKey::Char('7')));
        assert_eq!(CanonicalKey::from_key_name("?"), Some(CanonicalKey::Char('?')));
    }

    #[test]
    fn unknown_names_are_not_coerced() {
        assert_eq!(CanonicalKey::from_key_name("PageDown"), None);
        assert_eq!(CanonicalKey::from_key_name("Shift"), None);
        assert_eq!(CanonicalKey::from_key_name("\u{8}"), None);
        assert!(matches!("F13".parse::<CanonicalKey>(), Err(ParseKeyError::UnknownKey(_))));
    }

    #[test]
    fn parses_chords_with_and_without_modifier() {
        let chord: KeyChord = "Shift+ArrowDown".parse().unwrap();
        assert_eq!(chord, KeyChord::with_modifier(Modifier::Shift, CanonicalKey::ArrowDown));
        assert_eq!(chord.to_string(), "Shift+ArrowDown");

        let plain: KeyChord = "Enter".parse().unwrap();
        assert_eq!(plain, KeyChord::new(CanonicalKey::Enter));

        let plus: KeyChord = "+".parse().unwrap();
        assert_eq!(plus, KeyChord::new(CanonicalKey::Char('+')));

        let ctrl_plus: KeyChord = "control++".parse().unwrap();
        assert_eq!(ctrl_plus, KeyChord::with_modifier(Modifier::Ctrl, CanonicalKey::Char('+')));
    }

    #[test]
    fn rejects_unknown_modifier() {
        let err = "Hyper+x".parse::<KeyChord>().unwrap_err();
        assert_eq!(err, ParseKeyError::UnknownModifier("Hyper".into()));
    }

    #[test]
    fn chords_serialize_as_strings() {
        let chords: Vec<KeyChord> = serde_json::from_str(r#"["j", "Alt+Home"]"#).unwrap();
        assert_eq!(chords[0], KeyChord::new(CanonicalKey::Char('j')));
        assert_eq!(chords[1], KeyChord::with_modifier(Modifier::Alt, CanonicalKey::Home));
        assert_eq!(serde_json::to_string(&chords).unwrap(), r#"["j","Alt+Home"]"#);
    }
}
