use indexmap::IndexMap;

use super::{BuildOptions, HostKey, HostValue, JsonSerializable, NodeFactory};
use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKey};

/// Factory for hand-built host input.
///
/// A sequence keyed exactly `0, 1, 2, ...` in order becomes an array; any
/// other sequence becomes an object with stringified keys. Serializable host
/// objects are unwrapped and their JSON form classified in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsafeNodeFactory;

fn is_packed(items: &IndexMap<HostKey, HostValue>) -> bool {
    items
        .keys()
        .enumerate()
        .all(|(i, key)| matches!(key, HostKey::Index(k) if usize::try_from(*k) == Ok(i)))
}

impl NodeFactory for UnsafeNodeFactory {
    fn sequence_node(
        &self,
        document: &Document,
        items: &IndexMap<HostKey, HostValue>,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        if is_packed(items) {
            return self.packed_array_node(document, &mut items.values(), options);
        }

        let object = document.create_object();
        for (key, value) in items {
            if let Some(child) = self.child_node(document, value, options)? {
                document.append_node(object, child, NodeKey::Name(key.to_string()))?;
            }
        }
        Ok(Some(object))
    }

    fn serializable_node(
        &self,
        document: &Document,
        value: &dyn JsonSerializable,
        options: &BuildOptions,
    ) -> Result<Option<NodeId>, DomError> {
        self.try_create_node(document, &value.json_serialize(), options)
    }
}
