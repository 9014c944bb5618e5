//! Node identity, keys and kinds.
//!
//! # Node Types
//!
//! | Kind      | Payload                 | Children                         |
//! |-----------|-------------------------|----------------------------------|
//! | `Null`    | none                    | none                             |
//! | `Boolean` | `bool`                  | none                             |
//! | `Number`  | `serde_json::Number`    | none                             |
//! | `String`  | `String`                | none                             |
//! | `Array`   | -                       | keyed `0..count-1` in list order |
//! | `Object`  | -                       | unique string keys               |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Number, Value};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Document`](crate::Document) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of a node inside its owning document.
///
/// Handles are plain `Copy` values; equality is node identity. A handle
/// outlives its node only as a stale value: once the node is discarded the
/// handle is rejected, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) document: DocumentId,
    pub(crate) slot: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    /// The document owning this node.
    pub fn document(&self) -> DocumentId {
        self.document
    }
}

/// Position or name of a node within its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Index(usize),
    Name(String),
}

impl NodeKey {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            NodeKey::Index(i) => Some(*i),
            NodeKey::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            NodeKey::Index(_) => None,
            NodeKey::Name(n) => Some(n),
        }
    }

    /// JSON projection: a number for indices, a string for names.
    pub fn to_value(&self) -> Value {
        match self {
            NodeKey::Index(i) => Value::from(*i),
            NodeKey::Name(n) => Value::from(n.as_str()),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Index(i) => write!(f, "{i}"),
            NodeKey::Name(n) => f.write_str(n),
        }
    }
}

impl From<usize> for NodeKey {
    fn from(index: usize) -> Self {
        NodeKey::Index(index)
    }
}

impl From<&str> for NodeKey {
    fn from(name: &str) -> Self {
        NodeKey::Name(name.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(name: String) -> Self {
        NodeKey::Name(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Boolean => "boolean",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        }
    }

    /// Array or object.
    pub fn is_vector(&self) -> bool {
        matches!(self, NodeKind::Array | NodeKind::Object)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a leaf node.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> NodeKind {
        match self {
            Scalar::Null => NodeKind::Null,
            Scalar::Bool(_) => NodeKind::Boolean,
            Scalar::Number(_) => NodeKind::Number,
            Scalar::String(_) => NodeKind::String,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_unique() {
        let a = DocumentId::next();
        let b = DocumentId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_display_and_value() {
        assert_eq!(NodeKey::Index(3).to_string(), "3");
        assert_eq!(NodeKey::from("a/b").to_string(), "a/b");
        assert_eq!(NodeKey::Index(3).to_value(), Value::from(3));
        assert_eq!(NodeKey::from("x").to_value(), Value::from("x"));
        assert_eq!(NodeKey::from("x").as_index(), None);
        assert_eq!(NodeKey::from(7usize).as_index(), Some(7));
    }

    #[test]
    fn test_scalar_kinds() {
        assert_eq!(Scalar::Null.kind(), NodeKind::Null);
        assert_eq!(Scalar::from(true).kind(), NodeKind::Boolean);
        assert_eq!(Scalar::from(Number::from(1)).kind(), NodeKind::Number);
        assert_eq!(Scalar::from("s").to_value(), Value::from("s"));
        assert!(NodeKind::Object.is_vector());
        assert!(!NodeKind::String.is_vector());
    }
}
