//! Structural operations shared by arrays and objects.
//!
//! Every mutation runs its checks before touching the arena, so a failed
//! call leaves the tree exactly as it was. Array keys are renumbered here:
//! inserting shifts the suffix up, removing shifts it down.

use serde_json::Value;

use crate::arena::Arena;
use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKey, NodeKind};

// ── Checks ────────────────────────────────────────────────────────────────

impl Document {
    fn check_writable(&self, arena: &Arena, vector: NodeId) -> Result<(), DomError> {
        if !arena.contains(vector) {
            return Err(DomError::InvalidSubjectNode(
                "Vector node belongs to a different document".to_string(),
            ));
        }
        match arena.vector(vector) {
            Some(data) if data.active_iterators > 0 => Err(DomError::WriteForbidden),
            Some(_) => Ok(()),
            None => Err(DomError::InvalidSubjectNode(format!(
                "Expecting array or object, got {}",
                arena[vector].kind()
            ))),
        }
    }

    /// Nodes about to be attached under `vector`: orphans of this document,
    /// distinct, neither the root nor an ancestor of `vector`.
    fn check_subjects(&self, arena: &Arena, vector: NodeId, nodes: &[NodeId]) -> Result<(), DomError> {
        for (i, &node) in nodes.iter().enumerate() {
            if !arena.contains(node) {
                return Err(DomError::InvalidSubjectNode(
                    "Node belongs to a different document".to_string(),
                ));
            }
            if arena[node].parent.is_some() {
                return Err(DomError::InvalidSubjectNode(
                    "Node already present in the document".to_string(),
                ));
            }
            if self.root() == Some(node) {
                return Err(DomError::InvalidSubjectNode(
                    "Node is the root of the document".to_string(),
                ));
            }
            if nodes[..i].contains(&node) {
                return Err(DomError::InvalidSubjectNode(
                    "Node appears more than once in the list of nodes to add".to_string(),
                ));
            }
            if std::iter::successors(Some(vector), |n| arena[*n].parent).any(|n| n == node) {
                return Err(DomError::InvalidSubjectNode(
                    "Node cannot be attached beneath itself".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_reference_child(&self, arena: &Arena, vector: NodeId, reference: NodeId) -> Result<(), DomError> {
        if !arena.contains(reference) || arena[reference].parent != Some(vector) {
            return Err(DomError::InvalidReferenceNode(
                "Reference node not present in children of this node".to_string(),
            ));
        }
        Ok(())
    }

    /// Position of `child` among the children of the array `vector`.
    pub(crate) fn child_position(&self, vector: NodeId, child: NodeId) -> Result<usize, DomError> {
        let arena = self.arena.borrow();
        self.check_reference_child(&arena, vector, child)?;
        Ok(arena[child]
            .key
            .as_ref()
            .and_then(NodeKey::as_index)
            .unwrap_or_default())
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Attach an orphan as the last child under `key`.
    pub fn append_node(&self, vector: NodeId, node: NodeId, key: NodeKey) -> Result<NodeId, DomError> {
        self.insert_nodes(vector, vec![(node, key)], None)?;
        Ok(node)
    }

    /// Attach an orphan before `before`, or last when `before` is `None`.
    pub fn insert_node(
        &self,
        vector: NodeId,
        node: NodeId,
        key: NodeKey,
        before: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.insert_nodes(vector, vec![(node, key)], before)?;
        Ok(node)
    }

    /// Attach a run of orphans in order before `before`. Array keys at and
    /// after `before` are shifted up by the number of nodes attached.
    pub(crate) fn insert_nodes(
        &self,
        vector: NodeId,
        entries: Vec<(NodeId, NodeKey)>,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        if entries.is_empty() {
            return Err(DomError::EmptyNodeList);
        }

        let mut arena = self.arena.borrow_mut();
        self.check_writable(&arena, vector)?;
        let nodes: Vec<NodeId> = entries.iter().map(|(node, _)| *node).collect();
        self.check_subjects(&arena, vector, &nodes)?;
        if let Some(reference) = before {
            self.check_reference_child(&arena, vector, reference)?;
        }
        let start = match before {
            Some(reference) => arena[reference].key.as_ref().and_then(NodeKey::as_index),
            None => None,
        };
        check_keys(&arena, vector, &entries, start)?;

        let count = entries.len();
        for (node, key) in entries {
            link(&mut arena, vector, node, key, before);
        }
        if arena[vector].kind() == NodeKind::Array {
            shift_keys(&mut arena, before, count as isize);
        }
        Ok(())
    }

    /// Put `new` in the place of the child `old`, returning `old` detached.
    pub fn replace_node(&self, vector: NodeId, new: NodeId, old: NodeId) -> Result<NodeId, DomError> {
        let mut arena = self.arena.borrow_mut();
        self.check_writable(&arena, vector)?;
        self.check_subjects(&arena, vector, &[new])?;
        self.check_reference_child(&arena, vector, old)?;

        let record = &arena[old];
        let (key, prev, next) = (record.key.clone(), record.prev, record.next);
        if let Some(k) = &key {
            if let Some(data) = arena.vector_mut(vector) {
                data.index.set(k, new);
                if data.first == Some(old) {
                    data.first = Some(new);
                }
                if data.last == Some(old) {
                    data.last = Some(new);
                }
            }
        }
        if let Some(p) = prev {
            arena[p].next = Some(new);
        }
        if let Some(n) = next {
            arena[n].prev = Some(new);
        }
        arena[new].set_references(Some(vector), key, prev, next);
        arena[old].clear_references();
        Ok(old)
    }

    /// Detach the child `node`, returning it as an orphan.
    pub fn remove_node(&self, vector: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        let mut arena = self.arena.borrow_mut();
        self.check_writable(&arena, vector)?;
        if !arena.contains(node) || arena[node].parent != Some(vector) {
            return Err(DomError::InvalidSubjectNode(
                "Node is not a child of this node".to_string(),
            ));
        }

        let next = arena[node].next;
        unlink(&mut arena, vector, node);
        if arena[vector].kind() == NodeKind::Array {
            shift_keys(&mut arena, next, -1);
        }
        Ok(node)
    }

    /// Remove every child, last first.
    pub fn clear_children(&self, vector: NodeId) -> Result<(), DomError> {
        self.check_writable(&self.arena.borrow(), vector)?;
        while let Some(last) = self.last_child(vector) {
            self.remove_node(vector, last)?;
        }
        Ok(())
    }

    // ── Iteration ─────────────────────────────────────────────────────────

    /// Guarded iterator over the children of a vector node.
    pub fn children(&self, vector: NodeId) -> Result<Children<'_>, DomError> {
        Ok(self.vector(vector)?.children())
    }

    fn begin_iteration(&self, vector: NodeId) -> Option<NodeId> {
        let mut arena = self.arena.borrow_mut();
        let data = arena.vector_mut(vector)?;
        data.active_iterators += 1;
        data.first
    }

    fn end_iteration(&self, vector: NodeId) {
        let mut arena = self.arena.borrow_mut();
        if let Some(data) = arena.vector_mut(vector) {
            assert!(
                data.active_iterators > 0,
                "active iterator count of a vector node went negative"
            );
            data.active_iterators -= 1;
        }
    }

    // ── Views ─────────────────────────────────────────────────────────────

    /// View `node` as an array or object.
    pub fn vector(&self, node: NodeId) -> Result<VectorNode<'_>, DomError> {
        if !self.owns(node) {
            return Err(DomError::InvalidSubjectNode(
                "Node belongs to a different document".to_string(),
            ));
        }
        let kind = self.kind(node);
        if !kind.is_vector() {
            return Err(DomError::InvalidSubjectNode(format!(
                "Expecting array or object, got {kind}"
            )));
        }
        Ok(VectorNode { document: self, id: node })
    }
}

/// Array keys must continue the run starting at `start` (the end of the
/// array when `None`); object names must be new.
fn check_keys(
    arena: &Arena,
    vector: NodeId,
    entries: &[(NodeId, NodeKey)],
    start: Option<usize>,
) -> Result<(), DomError> {
    let Some(data) = arena.vector(vector) else {
        return Ok(());
    };
    let start = start.unwrap_or(data.index.len());
    for (i, (_, key)) in entries.iter().enumerate() {
        match (data.kind(), key) {
            (NodeKind::Array, NodeKey::Index(index)) if *index == start + i => {}
            (NodeKind::Object, NodeKey::Name(name)) => {
                let repeated = entries[..i].iter().any(|(_, k)| k == key);
                if repeated || data.index.get(key).is_some() {
                    return Err(DomError::InvalidKey(format!(
                        "Property '{name}' already exists on the object"
                    )));
                }
            }
            (kind, key) => {
                return Err(DomError::InvalidKey(format!(
                    "Key '{key}' cannot address a child of an {kind}"
                )))
            }
        }
    }
    Ok(())
}

// ── Linking ───────────────────────────────────────────────────────────────

fn link(arena: &mut Arena, vector: NodeId, node: NodeId, key: NodeKey, before: Option<NodeId>) {
    let prev = match before {
        Some(b) => arena[b].prev,
        None => arena.vector(vector).and_then(|v| v.last),
    };
    if let Some(data) = arena.vector_mut(vector) {
        if data.first == before {
            data.first = Some(node);
        }
        if before.is_none() {
            data.last = Some(node);
        }
        data.index.insert(&key, node);
    }
    if let Some(p) = prev {
        arena[p].next = Some(node);
    }
    if let Some(b) = before {
        arena[b].prev = Some(node);
    }
    arena[node].set_references(Some(vector), Some(key), prev, before);
}

fn unlink(arena: &mut Arena, vector: NodeId, node: NodeId) {
    let (prev, next) = (arena[node].prev, arena[node].next);
    let key = arena[node].key.take();
    if let Some(data) = arena.vector_mut(vector) {
        if data.first == Some(node) {
            data.first = next;
        }
        if data.last == Some(node) {
            data.last = prev;
        }
        if let Some(k) = &key {
            data.index.remove(k);
        }
    }
    if let Some(p) = prev {
        arena[p].next = next;
    }
    if let Some(n) = next {
        arena[n].prev = prev;
    }
    arena[node].clear_references();
}

/// Add `delta` to the index key of `start` and every sibling after it.
fn shift_keys(arena: &mut Arena, start: Option<NodeId>, delta: isize) {
    let mut cursor = start;
    while let Some(id) = cursor {
        let record = &mut arena[id];
        if let Some(NodeKey::Index(i)) = &mut record.key {
            *i = i.saturating_add_signed(delta);
        }
        cursor = record.next;
    }
}

// ── Views ─────────────────────────────────────────────────────────────────

/// Borrowed view of an array or object node.
#[derive(Debug, Clone, Copy)]
pub struct VectorNode<'d> {
    pub(crate) document: &'d Document,
    pub(crate) id: NodeId,
}

impl<'d> VectorNode<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d Document {
        self.document
    }

    pub fn kind(&self) -> NodeKind {
        self.document.kind(self.id)
    }

    pub fn count(&self) -> usize {
        self.document.count(self.id)
    }

    pub fn has_children(&self) -> bool {
        self.count() > 0
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.document.first_child(self.id)
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.document.last_child(self.id)
    }

    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.child(key).is_some()
    }

    pub fn child(&self, key: &NodeKey) -> Option<NodeId> {
        self.document.child(self.id, key)
    }

    /// Whether `node` is a descendant of this vector.
    pub fn contains(&self, node: NodeId) -> bool {
        self.document.contains(self.id, node)
    }

    /// Iterate the children in list order.
    ///
    /// Structural mutation of this vector fails with
    /// [`DomError::WriteForbidden`] until the iterator is exhausted,
    /// released or dropped.
    ///
    /// ```
    /// use json_dom::{Document, DomError};
    ///
    /// let doc = Document::parse("[1, 2]").unwrap();
    /// let array = doc.array(doc.root().unwrap()).unwrap();
    /// let mut children = array.children();
    /// children.next();
    /// assert!(matches!(array.pop(), Err(DomError::WriteForbidden)));
    /// children.release();
    /// assert!(array.pop().is_ok());
    /// ```
    pub fn children(&self) -> Children<'d> {
        let next = self.document.begin_iteration(self.id);
        Children {
            document: self.document,
            vector: self.id,
            next,
            active: true,
        }
    }

    /// Attach an orphan as the last child under `key`.
    pub fn append(&self, node: NodeId, key: NodeKey) -> Result<NodeId, DomError> {
        self.document.append_node(self.id, node, key)
    }

    pub fn remove_child(&self, node: NodeId) -> Result<NodeId, DomError> {
        self.document.remove_node(self.id, node)
    }

    /// Remove the child under `key`; a missing key is not an error.
    pub fn remove_key(&self, key: &NodeKey) -> Result<Option<NodeId>, DomError> {
        match self.child(key) {
            Some(node) => self.remove_child(node).map(Some),
            None => Ok(None),
        }
    }

    pub fn clear(&self) -> Result<(), DomError> {
        self.document.clear_children(self.id)
    }

    /// Child values in list order.
    pub fn to_array(&self) -> Vec<Value> {
        self.document
            .child_ids(self.id)
            .into_iter()
            .map(|child| self.document.value(child))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        self.document.value(self.id)
    }
}

/// Children of a vector node, holding the vector's write guard.
#[derive(Debug)]
pub struct Children<'d> {
    document: &'d Document,
    vector: NodeId,
    next: Option<NodeId>,
    active: bool,
}

impl Children<'_> {
    /// Give up the write guard before the iterator is exhausted.
    pub fn release(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.active {
            self.active = false;
            self.next = None;
            self.document.end_iteration(self.vector);
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        match self.next {
            Some(node) => {
                self.next = self.document.next_sibling(node);
                Some(node)
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

impl Drop for Children<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn abc(doc: &Document) -> (NodeId, [NodeId; 3]) {
        let array = doc.create_array();
        let nodes = [doc.create_string("a"), doc.create_string("b"), doc.create_string("c")];
        for (i, node) in nodes.iter().enumerate() {
            doc.append_node(array, *node, NodeKey::Index(i)).unwrap();
        }
        (array, nodes)
    }

    #[test]
    fn test_append_links_siblings() {
        let doc = Document::new();
        let (array, [a, b, c]) = abc(&doc);
        assert_eq!(doc.first_child(array), Some(a));
        assert_eq!(doc.last_child(array), Some(c));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.previous_sibling(c), Some(b));
        assert_eq!(doc.previous_sibling(a), None);
        assert_eq!(doc.parent(b), Some(array));
        assert_eq!(doc.value(array), json!(["a", "b", "c"]));
    }

    #[test]
    fn test_view_append_checks_keys() {
        let doc = Document::new();
        let object = doc.vector(doc.create_object()).unwrap();
        let a = doc.create_null();
        object.append(a, NodeKey::from("a")).unwrap();
        assert!(matches!(
            object.append(doc.create_null(), NodeKey::from("a")),
            Err(DomError::InvalidKey(_))
        ));
        assert!(matches!(
            object.append(doc.create_null(), NodeKey::Index(1)),
            Err(DomError::InvalidKey(_))
        ));
        assert_eq!(object.child(&NodeKey::from("a")), Some(a));
    }

    #[test]
    fn test_insert_renumbers_suffix() {
        let doc = Document::new();
        let (array, [a, b, c]) = abc(&doc);
        let x = doc.create_string("x");
        doc.insert_node(array, x, NodeKey::Index(1), Some(b)).unwrap();
        assert_eq!(doc.value(array), json!(["a", "x", "b", "c"]));
        assert_eq!(doc.key(a), Some(NodeKey::Index(0)));
        assert_eq!(doc.key(x), Some(NodeKey::Index(1)));
        assert_eq!(doc.key(c), Some(NodeKey::Index(3)));
        assert_eq!(doc.child(array, &NodeKey::Index(2)), Some(b));
    }

    #[test]
    fn test_insert_before_first() {
        let doc = Document::new();
        let (array, [a, ..]) = abc(&doc);
        let x = doc.create_null();
        doc.insert_node(array, x, NodeKey::Index(0), Some(a)).unwrap();
        assert_eq!(doc.first_child(array), Some(x));
        assert_eq!(doc.previous_sibling(a), Some(x));
    }

    #[test]
    fn test_remove_renumbers_suffix() {
        let doc = Document::new();
        let (array, [a, b, c]) = abc(&doc);
        assert_eq!(doc.remove_node(array, b).unwrap(), b);
        assert_eq!(doc.parent(b), None);
        assert_eq!(doc.key(b), None);
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.key(c), Some(NodeKey::Index(1)));
        assert_eq!(doc.count(array), 2);
    }

    #[test]
    fn test_replace_inherits_position() {
        let doc = Document::new();
        let (array, [a, b, c]) = abc(&doc);
        let x = doc.create_bool(true);
        assert_eq!(doc.replace_node(array, x, b).unwrap(), b);
        assert_eq!(doc.key(x), Some(NodeKey::Index(1)));
        assert_eq!(doc.next_sibling(a), Some(x));
        assert_eq!(doc.previous_sibling(c), Some(x));
        assert_eq!(doc.parent(b), None);
        assert_eq!(doc.value(array), json!(["a", true, "c"]));
    }

    #[test]
    fn test_subject_checks() {
        let doc = Document::new();
        let (array, [a, ..]) = abc(&doc);
        let other = Document::new();
        let foreign = other.create_null();

        let err = doc.append_node(array, a, NodeKey::Index(3)).unwrap_err();
        assert!(err.to_string().contains("already present"));
        let err = doc.append_node(array, foreign, NodeKey::Index(3)).unwrap_err();
        assert!(err.to_string().contains("different document"));
        let err = doc.append_node(array, array, NodeKey::Index(3)).unwrap_err();
        assert!(err.to_string().contains("beneath itself"));

        let outer = doc.create_array();
        doc.append_node(outer, array, NodeKey::Index(0)).unwrap();
        let err = doc.append_node(array, outer, NodeKey::Index(3)).unwrap_err();
        assert!(matches!(err, DomError::InvalidSubjectNode(_)));
        assert_eq!(doc.count(array), 3);
    }

    #[test]
    fn test_root_cannot_be_attached() {
        let doc = Document::parse("[]").unwrap();
        let root = doc.root().unwrap();
        let other = doc.create_array();
        let err = doc.append_node(other, root, NodeKey::Index(0)).unwrap_err();
        assert!(err.to_string().contains("root of the document"));
    }

    #[test]
    fn test_reference_checks() {
        let doc = Document::new();
        let (array, _) = abc(&doc);
        let stray = doc.create_null();
        let x = doc.create_null();
        let err = doc.insert_node(array, x, NodeKey::Index(0), Some(stray)).unwrap_err();
        assert!(matches!(err, DomError::InvalidReferenceNode(_)));
        let err = doc.replace_node(array, x, stray).unwrap_err();
        assert!(matches!(err, DomError::InvalidReferenceNode(_)));
        let err = doc.remove_node(array, stray).unwrap_err();
        assert!(matches!(err, DomError::InvalidSubjectNode(_)));
        assert_eq!(doc.parent(x), None);
    }

    #[test]
    fn test_object_key_checks() {
        let doc = Document::new();
        let object = doc.create_object();
        let a = doc.create_null();
        let b = doc.create_null();
        doc.append_node(object, a, NodeKey::from("k")).unwrap();
        let err = doc.append_node(object, b, NodeKey::from("k")).unwrap_err();
        assert!(matches!(err, DomError::InvalidKey(_)));
        let err = doc.append_node(object, b, NodeKey::Index(1)).unwrap_err();
        assert!(matches!(err, DomError::InvalidKey(_)));
    }

    #[test]
    fn test_clear_empties_vector() {
        let doc = Document::new();
        let (array, nodes) = abc(&doc);
        doc.clear_children(array).unwrap();
        assert_eq!(doc.count(array), 0);
        assert_eq!(doc.first_child(array), None);
        assert_eq!(doc.last_child(array), None);
        for node in nodes {
            assert_eq!(doc.parent(node), None);
        }
    }

    #[test]
    fn test_iterator_guard_lifecycle() {
        let doc = Document::new();
        let (array, [a, b, c]) = abc(&doc);
        let view = doc.vector(array).unwrap();

        let collected: Vec<NodeId> = view.children().collect();
        assert_eq!(collected, vec![a, b, c]);
        assert!(view.remove_child(c).is_ok());

        let mut partial = view.children();
        assert_eq!(partial.next(), Some(a));
        assert!(matches!(view.remove_child(b), Err(DomError::WriteForbidden)));
        assert!(matches!(view.clear(), Err(DomError::WriteForbidden)));
        drop(partial);
        assert!(view.clear().is_ok());
    }

    #[test]
    fn test_nested_iterators_count() {
        let doc = Document::new();
        let (array, _) = abc(&doc);
        let view = doc.vector(array).unwrap();
        let first = view.children();
        let second = view.children();
        first.release();
        assert!(view.clear().is_err());
        second.release();
        assert!(view.clear().is_ok());
    }

    #[test]
    fn test_exhausted_iterator_releases_once() {
        let doc = Document::new();
        let (array, _) = abc(&doc);
        let view = doc.vector(array).unwrap();
        let mut children = view.children();
        while children.next().is_some() {}
        assert_eq!(children.next(), None);
        children.release();
        assert!(view.clear().is_ok());
    }

    #[test]
    fn test_view_helpers() {
        let doc = Document::parse(r#"{"a":[1,{"b":2}],"c":null}"#).unwrap();
        let root = doc.vector(doc.root().unwrap()).unwrap();
        assert_eq!(root.kind(), NodeKind::Object);
        assert_eq!(root.to_array(), vec![json!([1, {"b": 2}]), json!(null)]);
        assert!(root.contains_key(&NodeKey::from("c")));

        let a = root.child(&NodeKey::from("a")).unwrap();
        let inner = doc.vector(a).unwrap().last_child().unwrap();
        assert!(root.contains(inner));
        assert!(!doc.vector(a).unwrap().contains(a));

        assert_eq!(root.remove_key(&NodeKey::from("missing")).unwrap(), None);
        assert!(root.remove_key(&NodeKey::from("c")).unwrap().is_some());
        assert_eq!(root.to_value(), json!({"a": [1, {"b": 2}]}));

        let leaf = doc.create_null();
        assert!(matches!(doc.vector(leaf), Err(DomError::InvalidSubjectNode(_))));
    }
}
