//! Error types for the keynav engine.

use keynav_types::ElementId;
use thiserror::Error;

use crate::selector::SelectorError;

/// Construction-time failures. Nothing is attached when one of these is
/// returned.
#[derive(Debug, Error)]
pub enum KeynavError {
    #[error("{component} requires an item list or item source")]
    MissingItems { component: &'static str },

    #[error("{component} references element {element} which is not in the document")]
    UnknownElement { component: &'static str, element: ElementId },

    #[error("invalid selector {selector:?}: {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: SelectorError,
    },

    #[error("document could not be parsed: {0}")]
    DocumentFormat(String),
}

/// A malformed hotkey declaration. The declaring element is skipped and the
/// rest of the batch proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("element {element} has no {attribute} declaration")]
    Missing { element: ElementId, attribute: String },

    #[error("element {element} declares invalid hotkey {value:?}")]
    Invalid { element: ElementId, value: String },

    #[error("hotkey {combo} on element {element} has an invalid target selector {selector:?}: {reason}")]
    InvalidTarget {
        element: ElementId,
        combo: String,
        selector: String,
        reason: String,
    },

    #[error("hotkey {combo} on element {element} targets {selector:?} which matches nothing")]
    UnresolvedTarget { element: ElementId, combo: String, selector: String },
}

impl DeclarationError {
    /// Element whose declaration was rejected.
    pub fn element(&self) -> ElementId {
        match self {
            DeclarationError::Missing { element, .. }
            | DeclarationError::Invalid { element, .. }
            | DeclarationError::InvalidTarget { element, .. }
            | DeclarationError::UnresolvedTarget { element, .. } => *element,
        }
    }
}
