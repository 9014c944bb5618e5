//! The owning arena of a node tree.
//!
//! A [`Document`] holds every node created for it, orphan or attached,
//! until the node is freed with [`Document::discard`], and at most one root.
//! Node handles from another document are rejected by every structural
//! operation; transplanting a subtree between documents goes through
//! [`Document::import`], which deep-copies it.

use std::cell::{Cell, RefCell};

use serde_json::{Number, Value};
use tracing::debug;

use crate::arena::{Arena, Payload, VectorData};
use crate::error::DomError;
use crate::factory::{BuildOptions, HostValue, NodeFactory, SafeNodeFactory, UnsafeNodeFactory};
use crate::node::{DocumentId, NodeId, NodeKey, NodeKind, Scalar};
use crate::pointer::{Evaluated, PointerEvaluator};

/// Decoder limits for [`Document::parse_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum container nesting depth. `serde_json` itself refuses input
    /// nested deeper than 128 levels, so larger limits behave as 128.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

/// A tree of JSON nodes and the arena that owns them.
///
/// # Panics
///
/// The read accessors ([`kind`](Document::kind), [`key`](Document::key),
/// [`parent`](Document::parent), the sibling and child accessors,
/// [`scalar`](Document::scalar) and [`value`](Document::value)) take the
/// handle on trust and panic when it belongs to another document or refers
/// to a discarded node. Check with [`Document::owns`] when a handle's origin
/// is unknown. Structural operations never panic on such handles; they fail
/// with [`DomError::InvalidSubjectNode`].
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    pub(crate) arena: RefCell<Arena>,
    root: Cell<Option<NodeId>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with no root. Nodes created in it are orphans until
    /// attached to a vector node or installed with [`Document::set_root`].
    pub fn new() -> Self {
        let id = DocumentId::next();
        Self {
            id,
            arena: RefCell::new(Arena::new(id)),
            root: Cell::new(None),
        }
    }

    /// Decode JSON text and build a document from it.
    ///
    /// # Example
    ///
    /// ```
    /// use json_dom::Document;
    ///
    /// let doc = Document::parse(r#"{"glossary":{"title":"x"}}"#).unwrap();
    /// let title = doc.evaluate_pointer("/glossary/title", None).unwrap();
    /// assert_eq!(doc.value(title.into_node().unwrap()), "x");
    /// ```
    pub fn parse(text: &str) -> Result<Self, DomError> {
        Self::parse_with(text, &ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Self, DomError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            debug!(target: "json_dom::document", error = %e, "decoding JSON text failed");
            DomError::Parse(e)
        })?;

        if nesting_depth(&value) > options.max_depth {
            return Err(DomError::DepthLimitExceeded {
                limit: options.max_depth,
            });
        }

        Self::from_json_value(value)
    }

    /// Build a document from decoder output with the [`SafeNodeFactory`].
    pub fn from_json_value(value: Value) -> Result<Self, DomError> {
        let document = Self::new();
        let root = SafeNodeFactory.create_node(
            &document,
            &HostValue::from(value),
            &BuildOptions::default(),
        )?;
        document.root.set(Some(root));
        debug!(
            target: "json_dom::document",
            document = ?document.id,
            nodes = document.arena.borrow().len(),
            "document tree created"
        );
        Ok(document)
    }

    /// Build a document from loose host input with the [`UnsafeNodeFactory`].
    pub fn from_value(value: &HostValue) -> Result<Self, DomError> {
        let document = Self::new();
        let root = UnsafeNodeFactory.create_node(&document, value, &BuildOptions::default())?;
        document.root.set(Some(root));
        Ok(document)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.get()
    }

    /// Install `node` as the root, returning the previous root (now an
    /// orphan). Installing the current root again is a no-op.
    pub fn set_root(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let previous = self.root.get();
        if previous == Some(node) {
            return Ok(None);
        }
        if !self.owns(node) {
            return Err(DomError::InvalidSubjectNode(
                "Node belongs to a different document".to_string(),
            ));
        }
        if self.arena.borrow()[node].parent.is_some() {
            return Err(DomError::InvalidSubjectNode(
                "Node already present in the document".to_string(),
            ));
        }
        self.root.set(Some(node));
        debug!(target: "json_dom::document", document = ?self.id, "root node replaced");
        Ok(previous)
    }

    /// Whether `node` is a live node of this document.
    pub fn owns(&self, node: NodeId) -> bool {
        self.arena.borrow().contains(node)
    }

    // ── Construction ──────────────────────────────────────────────────────

    pub fn create_null(&self) -> NodeId {
        self.create_scalar(Scalar::Null)
    }

    pub fn create_bool(&self, value: bool) -> NodeId {
        self.create_scalar(Scalar::Bool(value))
    }

    pub fn create_number(&self, value: impl Into<Number>) -> NodeId {
        self.create_scalar(Scalar::Number(value.into()))
    }

    pub fn create_string(&self, value: impl Into<String>) -> NodeId {
        self.create_scalar(Scalar::String(value.into()))
    }

    pub fn create_array(&self) -> NodeId {
        self.create_vector(NodeKind::Array)
    }

    pub fn create_object(&self) -> NodeId {
        self.create_vector(NodeKind::Object)
    }

    pub fn create_scalar(&self, value: Scalar) -> NodeId {
        self.arena.borrow_mut().alloc(Payload::Scalar(value))
    }

    pub(crate) fn create_vector(&self, kind: NodeKind) -> NodeId {
        self.arena
            .borrow_mut()
            .alloc(Payload::Vector(VectorData::new(kind)))
    }

    /// Build an orphan subtree from loose host input.
    pub fn create_node(&self, value: &HostValue, options: &BuildOptions) -> Result<NodeId, DomError> {
        UnsafeNodeFactory.create_node(self, value, options)
    }

    /// Like [`Document::create_node`], but the result must be of `kind`.
    pub fn create_node_of_kind(
        &self,
        value: &HostValue,
        kind: NodeKind,
        options: &BuildOptions,
    ) -> Result<NodeId, DomError> {
        self.atomically(|| {
            let node = self.create_node(value, options)?;
            let actual = self.kind(node);
            if actual != kind {
                return Err(DomError::InvalidNodeValue(format!(
                    "Value of type {} parsed as {actual}, {kind} expected",
                    value.describe()
                )));
            }
            Ok(node)
        })
    }

    /// Run `build`, discarding every node it allocated if it fails.
    pub(crate) fn atomically<T>(
        &self,
        build: impl FnOnce() -> Result<T, DomError>,
    ) -> Result<T, DomError> {
        let mark = self.arena.borrow_mut().mark();
        let result = build();
        let mut arena = self.arena.borrow_mut();
        match &result {
            Ok(_) => arena.commit(mark),
            Err(_) => {
                let discarded = arena.rollback(mark);
                debug!(
                    target: "json_dom::document",
                    discarded,
                    "rolling back partial node construction"
                );
            }
        }
        result
    }

    /// Live nodes held by this document, attached or orphaned.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().len()
    }

    /// Free an orphan and its whole subtree.
    ///
    /// Handles to the discarded nodes go stale: structural operations
    /// reject them and [`Document::owns`] returns `false`, even after their
    /// storage is reused by new nodes.
    ///
    /// # Errors
    ///
    /// - [`DomError::InvalidSubjectNode`] if `node` is not a live node of
    ///   this document, is attached to a parent, or is the root
    /// - [`DomError::WriteForbidden`] if a vector in the subtree is being
    ///   iterated
    pub fn discard(&self, node: NodeId) -> Result<(), DomError> {
        let mut arena = self.arena.borrow_mut();
        if !arena.contains(node) {
            return Err(DomError::InvalidSubjectNode(
                "Node does not belong to this document".to_string(),
            ));
        }
        if arena[node].parent.is_some() || self.root() == Some(node) {
            return Err(DomError::InvalidSubjectNode(
                "Only orphan nodes can be discarded".to_string(),
            ));
        }

        let mut subtree = vec![node];
        let mut cursor = 0;
        while let Some(&id) = subtree.get(cursor) {
            cursor += 1;
            if let Some(data) = arena.vector(id) {
                if data.active_iterators > 0 {
                    return Err(DomError::WriteForbidden);
                }
                subtree.extend(std::iter::successors(data.first, |n| arena[*n].next));
            }
        }
        for &id in &subtree {
            arena.free(id);
        }
        debug!(
            target: "json_dom::document",
            document = ?self.id,
            discarded = subtree.len(),
            live = arena.len(),
            slots = arena.capacity(),
            "orphan subtree discarded"
        );
        Ok(())
    }

    // ── Navigation ────────────────────────────────────────────────────────

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.arena.borrow()[node].kind()
    }

    /// Key within the parent; `None` for orphans and the root.
    pub fn key(&self, node: NodeId) -> Option<NodeKey> {
        self.arena.borrow()[node].key.clone()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow()[node].parent
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow()[node].prev
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow()[node].next
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().vector(node).and_then(|v| v.first)
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().vector(node).and_then(|v| v.last)
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        self.count(node) > 0
    }

    /// Number of children; zero for scalars.
    pub fn count(&self, node: NodeId) -> usize {
        self.arena.borrow().vector(node).map_or(0, |v| v.index.len())
    }

    /// Child of a vector node under `key`.
    pub fn child(&self, node: NodeId, key: &NodeKey) -> Option<NodeId> {
        self.arena.borrow().vector(node).and_then(|v| v.index.get(key))
    }

    /// Whether `node` is a strict descendant of `ancestor`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.owns(ancestor) || !self.owns(node) {
            return false;
        }
        let arena = self.arena.borrow();
        std::iter::successors(arena[node].parent, |n| arena[*n].parent).any(|n| n == ancestor)
    }

    pub(crate) fn child_ids(&self, node: NodeId) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        let first = arena.vector(node).and_then(|v| v.first);
        std::iter::successors(first, |n| arena[*n].next).collect()
    }

    // ── Values ────────────────────────────────────────────────────────────

    /// Leaf payload; `None` for arrays and objects.
    pub fn scalar(&self, node: NodeId) -> Option<Scalar> {
        match &self.arena.borrow()[node].payload {
            Payload::Scalar(s) => Some(s.clone()),
            Payload::Vector(_) => None,
        }
    }

    /// Reassign a leaf payload of the same kind, returning the old one.
    pub fn set_scalar(&self, node: NodeId, value: Scalar) -> Result<Scalar, DomError> {
        if !self.owns(node) {
            return Err(DomError::InvalidSubjectNode(
                "Node belongs to a different document".to_string(),
            ));
        }
        let mut arena = self.arena.borrow_mut();
        match &mut arena[node].payload {
            Payload::Scalar(current) if current.kind() == value.kind() => {
                Ok(std::mem::replace(current, value))
            }
            other => {
                let kind = match other {
                    Payload::Scalar(s) => s.kind(),
                    Payload::Vector(v) => v.kind(),
                };
                Err(DomError::InvalidSubjectNode(format!(
                    "Cannot assign a {} value to a {kind} node",
                    value.kind()
                )))
            }
        }
    }

    /// Project a node to its primitive value.
    pub fn value(&self, node: NodeId) -> Value {
        project(&self.arena.borrow(), node)
    }

    /// Primitive value of the root; `null` for a root-less document.
    pub fn to_value(&self) -> Value {
        self.root().map_or(Value::Null, |root| self.value(root))
    }

    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }

    // ── Import ────────────────────────────────────────────────────────────

    /// Deep-copy `node` from `source` into this document.
    ///
    /// The copy is an orphan with the same kinds, keys and key order.
    pub fn import(&self, source: &Document, node: NodeId) -> Result<NodeId, DomError> {
        if self.owns(node) {
            return Err(DomError::InvalidSubjectNode(
                "Cannot import the supplied node, already owned by this document".to_string(),
            ));
        }
        if !source.owns(node) {
            return Err(DomError::InvalidSubjectNode(
                "Node does not belong to the source document".to_string(),
            ));
        }

        let copy = self.atomically(|| self.import_node(source, node))?;
        debug!(
            target: "json_dom::document",
            source = ?source.id,
            target = ?self.id,
            "node imported"
        );
        Ok(copy)
    }

    /// Deep-copy a node of this document.
    ///
    /// The copy is an orphan with the same kinds, keys and key order; the
    /// original stays where it is.
    ///
    /// ```
    /// use json_dom::Document;
    ///
    /// let doc = Document::parse(r#"{"a":{"x":[1,2]}}"#).unwrap();
    /// let a = doc.evaluate_pointer("/a", None).unwrap().into_node().unwrap();
    /// let copy = doc.clone_node(a).unwrap();
    /// doc.object(doc.root().unwrap()).unwrap().set("b", copy).unwrap();
    /// assert_eq!(doc.to_json_string(), r#"{"a":{"x":[1,2]},"b":{"x":[1,2]}}"#);
    /// ```
    pub fn clone_node(&self, node: NodeId) -> Result<NodeId, DomError> {
        if !self.owns(node) {
            return Err(DomError::InvalidSubjectNode(
                "Node does not belong to this document".to_string(),
            ));
        }
        self.atomically(|| self.import_node(self, node))
    }

    fn import_node(&self, source: &Document, node: NodeId) -> Result<NodeId, DomError> {
        if let Some(scalar) = source.scalar(node) {
            return Ok(self.create_scalar(scalar));
        }

        let copy = self.create_vector(source.kind(node));
        for child in source.child_ids(node) {
            let imported = self.import_node(source, child)?;
            let key = source.key(child).unwrap_or(NodeKey::Index(0));
            self.append_node(copy, imported, key)?;
        }
        Ok(copy)
    }

    // ── Pointers ──────────────────────────────────────────────────────────

    /// Evaluate pointer text against the root, relative pointers from `base`.
    pub fn evaluate_pointer(&self, pointer: &str, base: Option<NodeId>) -> Result<Evaluated, DomError> {
        PointerEvaluator::from_document(self)?.evaluate_str(pointer, base)
    }
}

fn project(arena: &Arena, node: NodeId) -> Value {
    match &arena[node].payload {
        Payload::Scalar(s) => s.to_value(),
        Payload::Vector(v) => {
            let children = std::iter::successors(v.first, |n| arena[*n].next);
            match v.kind() {
                NodeKind::Array => Value::Array(children.map(|c| project(arena, c)).collect()),
                _ => Value::Object(
                    children
                        .map(|c| {
                            let name = arena[c].key.as_ref().map(ToString::to_string);
                            (name.unwrap_or_default(), project(arena, c))
                        })
                        .collect(),
                ),
            }
        }
    }
}

fn nesting_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(nesting_depth).max().unwrap_or(0),
        Value::Object(members) => 1 + members.values().map(nesting_depth).max().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_preserves_member_order() {
        let doc = Document::parse(r#"{"z":1,"a":[true,null,"s"],"m":{}}"#).unwrap();
        assert_eq!(doc.to_json_string(), r#"{"z":1,"a":[true,null,"s"],"m":{}}"#);
    }

    #[test]
    fn test_parse_failure() {
        let err = Document::parse("{nope").unwrap_err();
        assert!(matches!(err, DomError::Parse(_)));
    }

    #[test]
    fn test_depth_limit() {
        let options = ParseOptions { max_depth: 2 };
        assert!(Document::parse_with("[[1]]", &options).is_ok());
        let err = Document::parse_with("[[[1]]]", &options).unwrap_err();
        assert!(matches!(err, DomError::DepthLimitExceeded { limit: 2 }));
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth(&json!(1)), 0);
        assert_eq!(nesting_depth(&json!([])), 1);
        assert_eq!(nesting_depth(&json!({"a": [1, {"b": []}]})), 4);
    }

    #[test]
    fn test_set_root() {
        let doc = Document::new();
        assert_eq!(doc.root(), None);
        assert_eq!(doc.to_value(), Value::Null);

        let first = doc.create_string("a");
        let second = doc.create_bool(false);
        assert_eq!(doc.set_root(first).unwrap(), None);
        assert_eq!(doc.set_root(second).unwrap(), Some(first));
        assert_eq!(doc.to_value(), json!(false));

        let other = Document::new();
        let foreign = other.create_null();
        assert!(matches!(
            doc.set_root(foreign),
            Err(DomError::InvalidSubjectNode(_))
        ));
    }

    #[test]
    fn test_set_scalar() {
        let doc = Document::new();
        let node = doc.create_number(1);
        let old = doc.set_scalar(node, Scalar::Number(Number::from(2))).unwrap();
        assert_eq!(old, Scalar::Number(Number::from(1)));
        assert_eq!(doc.value(node), json!(2));

        let err = doc.set_scalar(node, Scalar::from("x")).unwrap_err();
        assert!(err.to_string().contains("string value to a number node"));

        let array = doc.create_array();
        assert!(doc.set_scalar(array, Scalar::Null).is_err());
    }

    #[test]
    fn test_accessors_on_scalars() {
        let doc = Document::new();
        let node = doc.create_string("leaf");
        assert_eq!(doc.kind(node), NodeKind::String);
        assert_eq!(doc.count(node), 0);
        assert!(!doc.has_children(node));
        assert_eq!(doc.first_child(node), None);
        assert_eq!(doc.key(node), None);
        assert_eq!(doc.parent(node), None);
    }

    #[test]
    fn test_create_node_of_kind() {
        let doc = Document::new();
        let value = HostValue::from(json!([1, 2]));
        let node = doc
            .create_node_of_kind(&value, NodeKind::Array, &BuildOptions::default())
            .unwrap();
        assert_eq!(doc.value(node), json!([1, 2]));

        let before = doc.node_count();
        let err = doc
            .create_node_of_kind(&value, NodeKind::Object, &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, DomError::InvalidNodeValue(_)));
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn test_discarded_slots_are_reused() {
        let doc = Document::parse("[0]").unwrap();
        let array = doc.array(doc.root().unwrap()).unwrap();
        for i in 0..10_000 {
            let old = array.replace_at(doc.create_number(i), 0).unwrap();
            doc.discard(old).unwrap();
        }
        assert_eq!(doc.node_count(), 2);
        assert!(doc.arena.borrow().capacity() <= 3);
        assert_eq!(array.to_value(), json!([9999]));
    }

    #[test]
    fn test_discard_frees_subtree() {
        let doc = Document::parse(r#"{"a":{"b":[1,2]},"c":3}"#).unwrap();
        let root = doc.object(doc.root().unwrap()).unwrap();
        let a = root.get("a").unwrap();
        let b = doc.object(a).unwrap().get("b").unwrap();

        assert!(matches!(doc.discard(a), Err(DomError::InvalidSubjectNode(_))));
        assert!(matches!(
            doc.discard(doc.root().unwrap()),
            Err(DomError::InvalidSubjectNode(_))
        ));

        root.remove("a").unwrap();
        assert_eq!(doc.node_count(), 6);
        doc.discard(a).unwrap();
        assert_eq!(doc.node_count(), 2);
        assert!(!doc.owns(a));
        assert!(!doc.owns(b));
        assert!(matches!(doc.discard(a), Err(DomError::InvalidSubjectNode(_))));
    }

    #[test]
    fn test_discard_rejects_iterated_subtree() {
        let doc = Document::new();
        let outer = doc.create_array();
        let inner = doc.create_array();
        doc.append_node(outer, inner, NodeKey::Index(0)).unwrap();

        let children = doc.children(inner).unwrap();
        assert!(matches!(doc.discard(outer), Err(DomError::WriteForbidden)));
        children.release();
        doc.discard(outer).unwrap();
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_stale_handle_is_rejected_after_reuse() {
        let doc = Document::parse("[]").unwrap();
        let array = doc.array(doc.root().unwrap()).unwrap();
        let stale = doc.create_null();
        doc.discard(stale).unwrap();
        let fresh = doc.create_null();
        assert_ne!(stale, fresh);

        assert!(matches!(array.push(stale), Err(DomError::InvalidSubjectNode(_))));
        array.push(fresh).unwrap();
        assert!(matches!(array.remove(stale), Err(DomError::InvalidSubjectNode(_))));
        assert!(matches!(
            array.insert(doc.create_null(), Some(stale)),
            Err(DomError::InvalidReferenceNode(_))
        ));
        assert_eq!(array.to_value(), json!([null]));
    }

    #[test]
    fn test_import_copies_every_node() {
        let source = Document::parse(r#"{"a":[1,{"b":null}]}"#).unwrap();
        let doc = Document::new();
        let copy = doc.import(&source, source.root().unwrap()).unwrap();
        assert_eq!(doc.node_count(), source.node_count());
        assert_eq!(doc.value(copy), source.to_value());
    }

    #[test]
    #[should_panic(expected = "discarded node")]
    fn test_accessor_panics_on_stale_handle() {
        let doc = Document::new();
        let node = doc.create_null();
        doc.discard(node).unwrap();
        doc.kind(node);
    }
}
