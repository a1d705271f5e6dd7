//! The navigator's operation table.
//!
//! Operations are named entries mapping a set of key chords to a handler.
//! The six built-ins cover roving focus; callers may rebind their keys,
//! replace their handlers, or add operations of their own.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use keynav_types::{CanonicalKey, KeyChord, KeyboardEvent};
use tracing::debug;

use super::ListNavigator;
use crate::document::Document;

/// What a handler wants done with the host's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    PreventDefault,
    AllowDefault,
}

/// Caller-supplied operation body.
pub type OperationFn = Rc<dyn Fn(&mut ListNavigator, &mut dyn Document, &KeyboardEvent) -> anyhow::Result<Disposition>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinOperation {
    Activate,
    Next,
    Prev,
    First,
    Last,
    Remove,
}

impl BuiltinOperation {
    pub const ALL: [BuiltinOperation; 6] = [
        BuiltinOperation::Activate,
        BuiltinOperation::Next,
        BuiltinOperation::Prev,
        BuiltinOperation::First,
        BuiltinOperation::Last,
        BuiltinOperation::Remove,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinOperation::Activate => "ACTIVATE",
            BuiltinOperation::Next => "NEXT",
            BuiltinOperation::Prev => "PREV",
            BuiltinOperation::First => "FIRST",
            BuiltinOperation::Last => "LAST",
            BuiltinOperation::Remove => "REMOVE",
        }
    }

    pub fn default_keys(&self) -> Vec<KeyChord> {
        let keys: &[CanonicalKey] = match self {
            BuiltinOperation::Activate => &[CanonicalKey::Enter, CanonicalKey::Space],
            BuiltinOperation::Next => &[CanonicalKey::ArrowDown, CanonicalKey::ArrowRight],
            BuiltinOperation::Prev => &[CanonicalKey::ArrowUp, CanonicalKey::ArrowLeft],
            BuiltinOperation::First => &[CanonicalKey::Home],
            BuiltinOperation::Last => &[CanonicalKey::End],
            BuiltinOperation::Remove => &[CanonicalKey::Delete],
        };
        keys.iter().copied().map(KeyChord::new).collect()
    }
}

#[derive(Clone)]
pub enum Handler {
    Builtin(BuiltinOperation),
    Custom(OperationFn),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Builtin(op) => f.debug_tuple("Builtin").field(op).finish(),
            Handler::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub keys: Vec<KeyChord>,
    pub handler: Handler,
}

/// Override or addition requested by a caller. Both parts are optional when
/// overriding an existing operation; a new operation needs both.
#[derive(Clone, Default)]
pub struct CustomOperation {
    pub keys: Option<Vec<KeyChord>>,
    pub handler: Option<OperationFn>,
}

impl CustomOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(mut self, keys: impl IntoIterator<Item = KeyChord>) -> Self {
        self.keys = Some(keys.into_iter().collect());
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ListNavigator, &mut dyn Document, &KeyboardEvent) -> anyhow::Result<Disposition> + 'static,
    {
        self.handler = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for CustomOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOperation")
            .field("keys", &self.keys)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Ordered operation name to operation map. Names are uppercase.
#[derive(Debug, Clone)]
pub struct OperationTable {
    operations: IndexMap<String, Operation>,
}

impl Default for OperationTable {
    fn default() -> Self {
        let operations = BuiltinOperation::ALL
            .iter()
            .map(|op| {
                (
                    op.name().to_string(),
                    Operation {
                        keys: op.default_keys(),
                        handler: Handler::Builtin(*op),
                    },
                )
            })
            .collect();
        Self { operations }
    }
}

impl OperationTable {
    /// Applies an override or addition. Returns whether the table changed.
    ///
    /// New operations without a non-empty key list and a handler are dropped.
    pub fn apply(&mut self, name: &str, custom: CustomOperation) -> bool {
        let name = name.trim().to_ascii_uppercase();
        if let Some(existing) = self.operations.get_mut(&name) {
            let mut changed = false;
            if let Some(keys) = custom.keys {
                existing.keys = keys;
                changed = true;
            }
            if let Some(handler) = custom.handler {
                existing.handler = Handler::Custom(handler);
                changed = true;
            }
            return changed;
        }
        match custom {
            CustomOperation {
                keys: Some(keys),
                handler: Some(handler),
            } if !keys.is_empty() => {
                self.operations.insert(
                    name,
                    Operation {
                        keys,
                        handler: Handler::Custom(handler),
                    },
                );
                true
            }
            _ => {
                debug!(operation = %name, "ignoring custom operation without keys or handler");
                false
            }
        }
    }

    /// Handlers whose key set contains `chord`, in table order.
    pub fn matching(&self, chord: &KeyChord) -> Vec<(String, Handler)> {
        self.operations
            .iter()
            .filter(|(_, op)| op.keys.contains(chord))
            .map(|(name, op)| (name.clone(), op.handler.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(&name.to_ascii_uppercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynav_types::Modifier;

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    #[test]
    fn default_table_binds_builtin_keys() {
        let table = OperationTable::default();
        assert_eq!(table.len(), 6);
        let matched = table.matching(&chord("ArrowRight"));
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].0, "NEXT");
        assert!(table.matching(&chord("Tab")).is_empty());
        assert!(table.matching(&chord("Shift+ArrowDown")).is_empty());
    }

    #[test]
    fn overrides_keys_of_existing_operations() {
        let mut table = OperationTable::default();
        assert!(table.apply("next", CustomOperation::new().keys([chord("j")])));
        assert_eq!(table.get("NEXT").unwrap().keys, vec![chord("j")]);
        assert!(matches!(
            table.get("NEXT").unwrap().handler,
            Handler::Builtin(BuiltinOperation::Next)
        ));
    }

    #[test]
    fn adds_well_formed_new_operations() {
        let mut table = OperationTable::default();
        let custom = CustomOperation::new()
            .keys([KeyChord::with_modifier(Modifier::Shift, CanonicalKey::ArrowDown)])
            .handler(|_, _, _| Ok(Disposition::PreventDefault));
        assert!(table.apply("jump", custom));
        assert_eq!(table.names().last(), Some("JUMP"));
    }

    #[test]
    fn silently_rejects_malformed_new_operations() {
        let mut table = OperationTable::default();
        assert!(!table.apply("EMPTY", CustomOperation::new().keys(Vec::new()).handler(|_, _, _| Ok(Disposition::AllowDefault))));
        assert!(!table.apply("NO_HANDLER", CustomOperation::new().keys([chord("x")])));
        assert!(!table.apply("NO_KEYS", CustomOperation::new().handler(|_, _, _| Ok(Disposition::AllowDefault))));
        assert_eq!(table.len(), 6);
    }
}
