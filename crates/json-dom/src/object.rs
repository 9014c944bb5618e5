//! Object view: children keyed by unique property names.

use std::ops::Deref;

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKey, NodeKind};
use crate::vector::VectorNode;

#[derive(Debug, Clone, Copy)]
pub struct ObjectNode<'d>(VectorNode<'d>);

impl<'d> Deref for ObjectNode<'d> {
    type Target = VectorNode<'d>;

    fn deref(&self) -> &VectorNode<'d> {
        &self.0
    }
}

impl Document {
    /// View `node` as an object.
    pub fn object(&self, node: NodeId) -> Result<ObjectNode<'_>, DomError> {
        let vector = self.vector(node)?;
        match vector.kind() {
            NodeKind::Object => Ok(ObjectNode(vector)),
            kind => Err(DomError::InvalidSubjectNode(format!(
                "Expecting object, got {kind}"
            ))),
        }
    }
}

impl<'d> ObjectNode<'d> {
    pub fn has(&self, name: &str) -> bool {
        self.contains_key(&NodeKey::from(name))
    }

    pub fn get(&self, name: &str) -> Result<NodeId, DomError> {
        self.child(&NodeKey::from(name))
            .ok_or_else(|| missing_property(name))
    }

    /// Bind `name` to `node`. An existing property keeps its position and
    /// the displaced child is returned; a new one is appended.
    pub fn set(&self, name: &str, node: NodeId) -> Result<Option<NodeId>, DomError> {
        match self.child(&NodeKey::from(name)) {
            Some(old) => self.document.replace_node(self.id, node, old).map(Some),
            None => {
                self.document.append_node(self.id, node, NodeKey::from(name))?;
                Ok(None)
            }
        }
    }

    pub fn remove(&self, name: &str) -> Result<NodeId, DomError> {
        let node = self.get(name)?;
        self.document.remove_node(self.id, node)
    }

    /// Property names in list order.
    pub fn names(&self) -> Vec<String> {
        self.document
            .child_ids(self.id)
            .into_iter()
            .filter_map(|child| self.document.key(child))
            .map(|key| key.to_string())
            .collect()
    }
}

fn missing_property(name: &str) -> DomError {
    DomError::InvalidKey(format!("Property '{name}' does not exist on the object"))
}
