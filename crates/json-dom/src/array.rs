//! Array view: children keyed `0..count-1` in list order.

use std::ops::Deref;

use json_dom_pointer::is_valid_index;

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKey, NodeKind};
use crate::vector::VectorNode;

#[derive(Debug, Clone, Copy)]
pub struct ArrayNode<'d>(VectorNode<'d>);

impl<'d> Deref for ArrayNode<'d> {
    type Target = VectorNode<'d>;

    fn deref(&self) -> &VectorNode<'d> {
        &self.0
    }
}

impl Document {
    /// View `node` as an array.
    pub fn array(&self, node: NodeId) -> Result<ArrayNode<'_>, DomError> {
        let vector = self.vector(node)?;
        match vector.kind() {
            NodeKind::Array => Ok(ArrayNode(vector)),
            kind => Err(DomError::InvalidSubjectNode(format!(
                "Expecting array, got {kind}"
            ))),
        }
    }
}

impl<'d> ArrayNode<'d> {
    /// Child at `index`.
    pub fn item(&self, index: usize) -> Result<NodeId, DomError> {
        self.child(&NodeKey::Index(index))
            .ok_or_else(|| out_of_bounds(index))
    }

    /// Child at a textual index, as addressed by a pointer segment.
    pub fn get(&self, index: &str) -> Result<NodeId, DomError> {
        if !is_valid_index(index) {
            return Err(DomError::InvalidKey(format!(
                "Index '{index}' is not a non-negative integer without leading zeros"
            )));
        }
        let position = index
            .parse::<usize>()
            .map_err(|_| DomError::InvalidKey(format!("Index '{index}' is out of range")))?;
        self.item(position)
    }

    /// Replace the child at `index`, or append when `index` is the count.
    /// Returns the replaced child.
    pub fn set(&self, index: usize, node: NodeId) -> Result<Option<NodeId>, DomError> {
        if index == self.count() {
            self.push(node)?;
            return Ok(None);
        }
        let old = self.item(index)?;
        self.replace(node, old).map(Some)
    }

    pub fn push(&self, node: NodeId) -> Result<(), DomError> {
        self.push_all(&[node])
    }

    /// Append the nodes in order. Either all are attached or none.
    pub fn push_all(&self, nodes: &[NodeId]) -> Result<(), DomError> {
        let start = self.count();
        let entries = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (*node, NodeKey::Index(start + i)))
            .collect();
        self.document.insert_nodes(self.id, entries, None)
    }

    /// Remove and return the last child.
    pub fn pop(&self) -> Result<Option<NodeId>, DomError> {
        match self.last_child() {
            Some(node) => self.remove(node).map(Some),
            None => Ok(None),
        }
    }

    /// Remove and return the first child.
    pub fn shift(&self) -> Result<Option<NodeId>, DomError> {
        match self.first_child() {
            Some(node) => self.remove(node).map(Some),
            None => Ok(None),
        }
    }

    /// Prepend the nodes, keeping their relative order.
    pub fn unshift(&self, nodes: &[NodeId]) -> Result<(), DomError> {
        match self.first_child() {
            None => self.push_all(nodes),
            Some(first) => {
                let entries = nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| (*node, NodeKey::Index(i)))
                    .collect();
                self.document.insert_nodes(self.id, entries, Some(first))
            }
        }
    }

    /// Insert `node` before the child `before`, or append when `None`.
    pub fn insert(&self, node: NodeId, before: Option<NodeId>) -> Result<(), DomError> {
        let Some(reference) = before else {
            return self.push(node);
        };
        let position = self.document.child_position(self.id, reference)?;
        self.document
            .insert_nodes(self.id, vec![(node, NodeKey::Index(position))], Some(reference))
    }

    pub fn remove(&self, node: NodeId) -> Result<NodeId, DomError> {
        self.document.remove_node(self.id, node)
    }

    /// Put `new` in the place of the child `old`, returning `old`.
    pub fn replace(&self, new: NodeId, old: NodeId) -> Result<NodeId, DomError> {
        self.document.replace_node(self.id, new, old)
    }

    pub fn replace_at(&self, new: NodeId, index: usize) -> Result<NodeId, DomError> {
        let old = self.item(index)?;
        self.replace(new, old)
    }
}

fn out_of_bounds(index: usize) -> DomError {
    DomError::InvalidKey(format!("Index '{index}' is outside the bounds of the array"))
}
