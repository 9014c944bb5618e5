use json_dom_pointer::Pointer;

use crate::document::Document;
use crate::error::DomError;
use crate::node::NodeId;

/// Produces pointers addressing nodes beneath a fixed root node.
///
/// # Example
///
/// ```
/// use json_dom::{Document, PointerGenerator};
///
/// let doc = Document::parse(r#"{"a":{"b":[1,2]},"c":3}"#).unwrap();
/// let target = doc.evaluate_pointer("/a/b/1", None).unwrap().into_node().unwrap();
/// let base = doc.evaluate_pointer("/c", None).unwrap().into_node().unwrap();
///
/// let generator = PointerGenerator::from_document(&doc).unwrap();
/// assert_eq!(generator.generate_absolute_pointer(target).unwrap().to_string(), "/a/b/1");
/// assert_eq!(generator.generate_relative_pointer(target, base).unwrap().to_string(), "1/a/b/1");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PointerGenerator<'d> {
    document: &'d Document,
    root: NodeId,
}

impl<'d> PointerGenerator<'d> {
    pub fn new(document: &'d Document, root: NodeId) -> Result<Self, DomError> {
        if !document.owns(root) {
            return Err(DomError::InvalidReferenceNode(
                "Pointer generator root node does not belong to the document".to_string(),
            ));
        }
        Ok(Self { document, root })
    }

    /// Generator rooted at the document root.
    pub fn from_document(document: &'d Document) -> Result<Self, DomError> {
        let root = document.root().ok_or_else(|| {
            DomError::InvalidReferenceNode("Pointer generator requires a document root".to_string())
        })?;
        Ok(Self { document, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn generate_absolute_pointer(&self, target: NodeId) -> Result<Pointer, DomError> {
        let path = self.node_path(target).ok_or_else(target_outside_root)?;
        Ok(Pointer::absolute(self.keys(&path)))
    }

    /// Shortest relative pointer from `base` to `target`: climb to their
    /// nearest common ancestor, then descend.
    pub fn generate_relative_pointer(&self, target: NodeId, base: NodeId) -> Result<Pointer, DomError> {
        let mut target_path = self.node_path(target).ok_or_else(target_outside_root)?;
        let mut base_path = self.node_path(base).ok_or_else(|| {
            DomError::InvalidReferenceNode(
                "Base node for pointer is not a child of the generator root node".to_string(),
            )
        })?;

        while !target_path.is_empty() && target_path.last() == base_path.last() {
            target_path.pop();
            base_path.pop();
        }

        Ok(Pointer::relative(base_path.len(), self.keys(&target_path)))
    }

    /// Nodes from `node` up to, but excluding, the root. `None` when `node`
    /// is not the root or one of its descendants.
    fn node_path(&self, node: NodeId) -> Option<Vec<NodeId>> {
        if !self.document.owns(node) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = node;
        while current != self.root {
            path.push(current);
            current = self.document.parent(current)?;
        }
        Some(path)
    }

    /// Keys of a root-ward node path, root end first.
    fn keys(&self, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .rev()
            .filter_map(|node| self.document.key(*node))
            .map(|key| key.to_string())
            .collect()
    }
}

fn target_outside_root() -> DomError {
    DomError::InvalidSubjectNode(
        "Target node for pointer is not a child of the generator root node".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Document {
        Document::parse(r#"{"a":{"b":[1,{"c":2}]},"d/e":[true]}"#).unwrap()
    }

    fn at(doc: &Document, pointer: &str) -> NodeId {
        doc.evaluate_pointer(pointer, None).unwrap().into_node().unwrap()
    }

    #[test]
    fn test_absolute() {
        let doc = setup();
        let generator = PointerGenerator::from_document(&doc).unwrap();
        for pointer in ["", "/a", "/a/b/1/c", "/d~1e/0"] {
            let node = at(&doc, pointer);
            assert_eq!(generator.generate_absolute_pointer(node).unwrap().to_string(), pointer);
        }
    }

    #[test]
    fn test_relative() {
        let doc = setup();
        let generator = PointerGenerator::from_document(&doc).unwrap();
        let cases = [
            ("/a/b/1/c", "/a/b/0", "1/1/c"),
            ("/a/b/0", "/a/b/1/c", "2/0"),
            ("/a", "/a", "0"),
            ("/a/b", "/a", "0/b"),
            ("/a", "/a/b/1", "2"),
            ("/d~1e/0", "/a/b", "2/d~1e/0"),
        ];
        for (target, base, expected) in cases {
            let pointer = generator
                .generate_relative_pointer(at(&doc, target), at(&doc, base))
                .unwrap();
            assert_eq!(pointer.to_string(), expected, "{target} from {base}");
        }
    }

    #[test]
    fn test_nodes_outside_root() {
        let doc = setup();
        let a = at(&doc, "/a");
        let generator = PointerGenerator::new(&doc, a).unwrap();
        let outside = at(&doc, "/d~1e");
        let inside = at(&doc, "/a/b");

        assert!(matches!(
            generator.generate_absolute_pointer(outside),
            Err(DomError::InvalidSubjectNode(_))
        ));
        assert!(matches!(
            generator.generate_relative_pointer(outside, inside),
            Err(DomError::InvalidSubjectNode(_))
        ));
        assert!(matches!(
            generator.generate_relative_pointer(inside, outside),
            Err(DomError::InvalidReferenceNode(_))
        ));

        let other = setup();
        let foreign = at(&other, "/a/b");
        assert!(generator.generate_absolute_pointer(foreign).is_err());
        assert_eq!(
            generator.generate_absolute_pointer(inside).unwrap().to_string(),
            "/b"
        );
    }
}
