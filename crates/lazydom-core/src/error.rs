use std::rc::Rc;

use crate::value::Value;

/// Errors surfaced by element construction, property access and tree mutation.
///
/// Messages follow the wording browsers use for the matching `DOMException`s so
/// lazy and materialized paths read the same to callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomError {
    #[error("createElement called with unknown type: {descriptor}")]
    UnsupportedType { descriptor: String },

    #[error("Failed to execute '{}' on 'Node': {}", .method, not_a_child_reason(.method))]
    NotAChild { method: &'static str },

    #[error("Failed to execute '{method}' on 'Node': The new child element contains the parent.")]
    Hierarchy { method: &'static str },

    #[error("element is already backed by a different node")]
    AlreadyMaterialized,

    #[error("property '{key}' is read-only")]
    ReadOnly { key: Rc<str> },

    #[error("invalid value for '{key}': expected {expected}, got {found}")]
    InvalidValue {
        key: Rc<str>,
        expected: &'static str,
        found: &'static str,
    },

    #[error("no real tree is installed on this thread")]
    NotInstalled,

    #[error("native tree error: {0}")]
    Native(String),
}

impl DomError {
    pub fn not_a_child(method: &'static str) -> Self {
        Self::NotAChild { method }
    }

    pub fn read_only(key: impl Into<Rc<str>>) -> Self {
        Self::ReadOnly { key: key.into() }
    }

    pub fn invalid_value(key: impl Into<Rc<str>>, expected: &'static str, found: &Value) -> Self {
        Self::InvalidValue {
            key: key.into(),
            expected,
            found: found.type_name(),
        }
    }

    /// Returns true for the error raised when removing something that is not a child.
    pub fn is_not_a_child(&self) -> bool {
        matches!(self, Self::NotAChild { .. })
    }
}

fn not_a_child_reason(method: &str) -> &'static str {
    match method {
        "insertBefore" => {
            "The node before which the new node is to be inserted is not a child of this node."
        }
        _ => "The node to be removed is not a child of this node.",
    }
}
