//! Building node trees from host values.
//!
//! A [`NodeFactory`] classifies each [`HostValue`] into a node kind. The
//! scalar cases are shared; factories differ in how they read sequences and
//! serializable host objects.
//!
//! Construction is atomic: a failed build discards every node it allocated.

use indexmap::IndexMap;
use serde_json::Number;
use tracing::trace;

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKey, Scalar};

mod host_value;
pub use host_value::{HostKey, HostValue, JsonSerializable};

mod safe_factory;
pub use safe_factory::SafeNodeFactory;

mod unsafe_factory;
pub use unsafe_factory::UnsafeNodeFactory;

/// Options for node construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Skip unsupported child values instead of failing. An unsupported
    /// root value fails regardless.
    pub ignore_invalid_values: bool,
}

pub trait NodeFactory {
    /// Node for a keyed sequence, `None` when unsupported.
    fn sequence_node(
        &self,
        document: &Document,
        items: &IndexMap<HostKey, HostValue>,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError>;

    /// Node for a serializable host object, `None` when unsupported.
    fn serializable_node(
        &self,
        document: &Document,
        value: &dyn JsonSerializable,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError>;

    /// Build an orphan subtree for `value` in `document`.
    fn create_node(
        &self,
        document: &Document,
        value: &HostValue,
        options: &BuildOptions,
    ) -> Result<NodeId, DomError> {
        document.atomically(|| {
            self.try_create_node(document, value, options)?
                .ok_or_else(|| unsupported(value))
        })
    }

    /// Classify and build `value`; `Ok(None)` when it is unsupported.
    fn try_create_node(
        &self,
        document: &Document,
        value: &HostValue,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        let scalar = match value {
            HostValue::Null => Scalar::Null,
            HostValue::Bool(b) => Scalar::Bool(*b),
            HostValue::Number(n) => Scalar::Number(n.clone()),
            HostValue::Float(f) => match Number::from_f64(*f) {
                Some(n) => Scalar::Number(n),
                None => return Ok(None),
            },
            HostValue::String(s) => Scalar::String(s.clone()),
            HostValue::Sequence(items) => return self.sequence_node(document, items, options),
            HostValue::Record(members) => return self.property_map_node(document, members, options),
            HostValue::Serializable(inner) => {
                return self.serializable_node(document, inner.as_ref(), options)
            }
            HostValue::Bytes(_) => return Ok(None),
        };
        Ok(Some(document.create_scalar(scalar)))
    }

    /// Build a child value, honoring `ignore_invalid_values`.
    fn child_node(
        &self,
        document: &Document,
        value: &HostValue,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        match self.try_create_node(document, value, options)? {
            Some(node) => Ok(Some(node)),
            None if options.ignore_invalid_values => {
                trace!(
                    target: "json_dom::factory",
                    value = value.describe(),
                    "skipping unsupported value"
                );
                Ok(None)
            }
            None => Err(unsupported(value)),
        }
    }

    /// Array over `values` in order.
    fn packed_array_node<'v>(
        &self,
        document: &Document,
        values: &mut dyn Iterator<Item = &'v HostValue>,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        let array = document.create_array();
        let mut position = 0;
        for value in values {
            if let Some(child) = self.child_node(document, value, options)? {
                document.append_node(array, child, NodeKey::Index(position))?;
                position += 1;
            }
        }
        Ok(Some(array))
    }

    /// Object over `(name, value)` members in order.
    fn property_map_node(
        &self,
        document: &Document,
        members: &IndexMap<String, HostValue>,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        let object = document.create_object();
        for (name, value) in members {
            if let Some(child) = self.child_node(document, value, options)? {
                document.append_node(object, child, NodeKey::from(name.as_str()))?;
            }
        }
        Ok(Some(object))
    }
}

fn unsupported(value: &HostValue) -> DomError {
    DomError::InvalidNodeValue(format!("Unsupported value of type {}", value.describe()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        let doc = Document::new();
        let options = BuildOptions::default();
        for value in [json!(null), json!(true), json!(-3), json!(2.5), json!("s")] {
            let node = SafeNodeFactory
                .create_node(&doc, &HostValue::from(&value), &options)
                .unwrap();
            assert_eq!(doc.value(node), value);
        }
    }

    #[test]
    fn test_unsupported_root_fails_even_when_ignoring() {
        let doc = Document::new();
        let options = BuildOptions {
            ignore_invalid_values: true,
        };
        for value in [HostValue::Float(f64::NAN), HostValue::Bytes(vec![1])] {
            let err = SafeNodeFactory.create_node(&doc, &value, &options).unwrap_err();
            assert!(matches!(err, DomError::InvalidNodeValue(_)));
        }
    }

    #[test]
    fn test_skip_invalid_children() {
        let doc = Document::new();
        let value = HostValue::record([
            ("a", HostValue::from(1i64)),
            ("b", HostValue::Float(f64::INFINITY)),
            (
                "c",
                HostValue::sequence([HostValue::Bytes(vec![]), HostValue::from("x")]),
            ),
        ]);
        let options = BuildOptions {
            ignore_invalid_values: true,
        };
        let node = SafeNodeFactory.create_node(&doc, &value, &options).unwrap();
        assert_eq!(doc.value(node), json!({"a": 1, "c": ["x"]}));
    }

    #[test]
    fn test_failed_build_rolls_back() {
        let doc = Document::new();
        let before = doc.node_count();
        let value = HostValue::sequence([
            HostValue::from(1i64),
            HostValue::sequence([HostValue::from("deep"), HostValue::Bytes(vec![])]),
        ]);
        let err = SafeNodeFactory
            .create_node(&doc, &value, &BuildOptions::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid node value: Unsupported value of type bytes"
        );
        assert_eq!(doc.node_count(), before);
    }
}
