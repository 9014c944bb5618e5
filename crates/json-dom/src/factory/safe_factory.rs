use indexmap::IndexMap;

use super::{BuildOptions, HostKey, HostValue, JsonSerializable, NodeFactory};
use crate::document::Document;
use crate::error::DomError;
use crate::node::NodeId;

/// Factory for trusted decoder output.
///
/// Every sequence is an array and every record an object; serializable host
/// objects never come out of a decoder and are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeNodeFactory;

impl NodeFactory for SafeNodeFactory {
    fn sequence_node(
        &self,
        document: &Document,
        items: &IndexMap<HostKey, HostValue>,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        self.packed_array_node(document, &mut items.values(), options)
    }

    fn serializable_node(
        &self,
        _document: &Document,
        _value: &dyn JsonSerializable,
        _options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Point;

    impl JsonSerializable for Point {
        fn json_serialize(&self) -> HostValue {
            HostValue::from(json!({"x": 1}))
        }
    }

    #[test]
    fn test_sequences_are_always_arrays() {
        let doc = Document::new();
        let mut items = IndexMap::new();
        items.insert(HostKey::Name("k".into()), HostValue::from(1i64));
        items.insert(HostKey::Index(7), HostValue::from(2i64));
        let node = SafeNodeFactory
            .create_node(&doc, &HostValue::Sequence(items), &BuildOptions::default())
            .unwrap();
        assert_eq!(doc.value(node), json!([1, 2]));
    }

    #[test]
    fn test_serializable_is_rejected() {
        let doc = Document::new();
        let value = HostValue::Serializable(Box::new(Point));
        let err = SafeNodeFactory
            .create_node(&doc, &value, &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, DomError::InvalidNodeValue(_)));
    }
}
