use json_dom_pointer::{is_valid_index, Pointer};

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKey, NodeKind};

/// Result of evaluating a pointer: a node, or for `N#` pointers the key of
/// the node reached (`None` when that node has no parent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    Node(NodeId),
    Key(Option<NodeKey>),
}

impl Evaluated {
    pub fn into_node(self) -> Option<NodeId> {
        match self {
            Evaluated::Node(node) => Some(node),
            Evaluated::Key(_) => None,
        }
    }

    pub fn into_key(self) -> Option<NodeKey> {
        match self {
            Evaluated::Node(_) => None,
            Evaluated::Key(key) => key,
        }
    }
}

/// Resolves pointers against a fixed root node.
///
/// Absolute pointers start at the root. Relative pointers start at a context
/// node (the root by default), climb their prefix levels without passing the
/// root, then follow their path.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvaluator<'d> {
    document: &'d Document,
    root: NodeId,
}

impl<'d> PointerEvaluator<'d> {
    pub fn new(document: &'d Document, root: NodeId) -> Result<Self, DomError> {
        if !document.owns(root) {
            return Err(DomError::InvalidReferenceNode(
                "Pointer evaluator root node does not belong to the document".to_string(),
            ));
        }
        Ok(Self { document, root })
    }

    /// Evaluator rooted at the document root.
    pub fn from_document(document: &'d Document) -> Result<Self, DomError> {
        let root = document.root().ok_or_else(|| {
            DomError::InvalidReferenceNode("Pointer evaluator requires a document root".to_string())
        })?;
        Ok(Self { document, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn evaluate_str(&self, pointer: &str, context: Option<NodeId>) -> Result<Evaluated, DomError> {
        self.evaluate(&Pointer::parse(pointer)?, context)
    }

    pub fn evaluate(&self, pointer: &Pointer, context: Option<NodeId>) -> Result<Evaluated, DomError> {
        let Some(levels) = pointer.relative_levels() else {
            return self.evaluate_path(pointer, self.root).map(Evaluated::Node);
        };

        let context = context.unwrap_or(self.root);
        if context != self.root {
            self.validate_context(context)?;
        }

        let mut current = context;
        for level in 0..levels {
            if current == self.root {
                return Err(DomError::prefix_overflow(pointer, level));
            }
            current = match self.document.parent(current) {
                Some(parent) => parent,
                None => return Err(DomError::prefix_overflow(pointer, level)),
            };
        }

        let target = self.evaluate_path(pointer, current)?;
        if pointer.is_key_lookup() {
            return Ok(Evaluated::Key(self.document.key(target)));
        }
        Ok(Evaluated::Node(target))
    }

    fn validate_context(&self, context: NodeId) -> Result<(), DomError> {
        if !self.document.owns(context) {
            return Err(DomError::InvalidReferenceNode(
                "Context node for relative pointer evaluation does not belong to the same \
                 document as the evaluator root node"
                    .to_string(),
            ));
        }
        if !self.document.contains(self.root, context) {
            return Err(DomError::InvalidReferenceNode(
                "Context node for relative pointer evaluation is not a child of the root node"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn evaluate_path(&self, pointer: &Pointer, start: NodeId) -> Result<NodeId, DomError> {
        let mut current = start;
        for (level, component) in pointer.path().iter().enumerate() {
            current = match self.document.kind(current) {
                NodeKind::Object => self
                    .document
                    .child(current, &NodeKey::from(component.as_str()))
                    .ok_or_else(|| {
                        DomError::not_found_at("The referenced property does not exist", pointer, level)
                    })?,
                NodeKind::Array => {
                    let index = array_index(component).ok_or_else(|| {
                        DomError::not_found_at(
                            "Array member must be referenced by integer index without leading zero",
                            pointer,
                            level,
                        )
                    })?;
                    self.document
                        .child(current, &NodeKey::Index(index))
                        .ok_or_else(|| {
                            DomError::not_found_at("The referenced index does not exist", pointer, level)
                        })?
                }
                kind => {
                    return Err(DomError::not_found_at(
                        &format!("Expecting object or array, got {kind}"),
                        pointer,
                        level,
                    ))
                }
            };
        }
        Ok(current)
    }
}

fn array_index(component: &str) -> Option<usize> {
    if !is_valid_index(component) {
        return None;
    }
    component.parse().ok()
}
