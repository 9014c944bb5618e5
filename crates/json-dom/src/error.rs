//! Error type shared by every tree operation.

use json_dom_pointer::{Pointer, PointerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    /// Pointer text or parameters are malformed.
    #[error(transparent)]
    Pointer(#[from] PointerError),

    /// Pointer resolution hit a missing key, a non-vector node, or climbed
    /// above the evaluator root.
    #[error("{message}")]
    ReferenceNotFound {
        message: String,
        pointer: String,
        level: Option<usize>,
    },

    /// The node being attached is not an orphan of the target document.
    #[error("invalid subject node: {0}")]
    InvalidSubjectNode(String),

    /// A reference node (insert-before, base, context) is not positioned
    /// where the operation requires.
    #[error("invalid reference node: {0}")]
    InvalidReferenceNode(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("cannot modify a vector with an active iterator")]
    WriteForbidden,

    #[error("list of nodes to add must contain at least one node")]
    EmptyNodeList,

    #[error("invalid node value: {0}")]
    InvalidNodeValue(String),

    #[error("decoding JSON string failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("maximum nesting depth of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },
}

impl DomError {
    /// Reference-not-found at a path component.
    pub(crate) fn not_found_at(reason: &str, pointer: &Pointer, level: usize) -> Self {
        let component = pointer.path().get(level).map(String::as_str).unwrap_or_default();
        DomError::ReferenceNotFound {
            message: format!(
                "{reason} while evaluating pointer '{pointer}' at component '{component}' \
                 (path component index {level})"
            ),
            pointer: pointer.to_string(),
            level: Some(level),
        }
    }

    /// Reference-not-found while climbing the relative prefix.
    pub(crate) fn prefix_overflow(pointer: &Pointer, level: usize) -> Self {
        DomError::ReferenceNotFound {
            message: format!(
                "Relative pointer prefix overflows context node nesting level {level} \
                 while evaluating pointer '{pointer}'"
            ),
            pointer: pointer.to_string(),
            level: Some(level),
        }
    }

    /// The failing level of a reference-not-found error.
    pub fn level(&self) -> Option<usize> {
        match self {
            DomError::ReferenceNotFound { level, .. } => *level,
            _ => None,
        }
    }
}
