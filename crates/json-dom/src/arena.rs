//! Per-document node storage.
//!
//! All nodes of a document live in one `Vec` of slots and refer to each
//! other by [`NodeId`]. Parent and sibling links are plain handles; the
//! owning edges are the child index and list held by each vector record.
//!
//! Freed slots are reused. Each slot carries a generation that is bumped on
//! release, so a handle to a freed node never resolves to its successor.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::node::{DocumentId, NodeId, NodeKey, NodeKind, Scalar};

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub key: Option<NodeKey>,
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub payload: Payload,
}

impl NodeRecord {
    pub fn set_references(
        &mut self,
        parent: Option<NodeId>,
        key: Option<NodeKey>,
        prev: Option<NodeId>,
        next: Option<NodeId>,
    ) {
        self.parent = parent;
        self.key = key;
        self.prev = prev;
        self.next = next;
    }

    pub fn clear_references(&mut self) {
        self.set_references(None, None, None, None);
    }

    pub fn kind(&self) -> NodeKind {
        match &self.payload {
            Payload::Scalar(s) => s.kind(),
            Payload::Vector(v) => v.kind(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Payload {
    Scalar(Scalar),
    Vector(VectorData),
}

#[derive(Debug)]
pub(crate) struct VectorData {
    pub first: Option<NodeId>,
    pub last: Option<NodeId>,
    pub index: ChildIndex,
    pub active_iterators: usize,
}

impl VectorData {
    pub fn new(kind: NodeKind) -> Self {
        let index = match kind {
            NodeKind::Array => ChildIndex::Positions(Vec::new()),
            _ => ChildIndex::Names(HashMap::new()),
        };
        Self {
            first: None,
            last: None,
            index,
            active_iterators: 0,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.index {
            ChildIndex::Positions(_) => NodeKind::Array,
            ChildIndex::Names(_) => NodeKind::Object,
        }
    }
}

/// Key → child lookup. Arrays index by position, objects by name.
#[derive(Debug)]
pub(crate) enum ChildIndex {
    Positions(Vec<NodeId>),
    Names(HashMap<String, NodeId>),
}

impl ChildIndex {
    pub fn len(&self) -> usize {
        match self {
            ChildIndex::Positions(v) => v.len(),
            ChildIndex::Names(m) => m.len(),
        }
    }

    pub fn get(&self, key: &NodeKey) -> Option<NodeId> {
        match (self, key) {
            (ChildIndex::Positions(v), NodeKey::Index(i)) => v.get(*i).copied(),
            (ChildIndex::Names(m), NodeKey::Name(n)) => m.get(n).copied(),
            _ => None,
        }
    }

    /// Insert under `key`; positions at or after `key` shift up by one.
    pub fn insert(&mut self, key: &NodeKey, id: NodeId) {
        match (self, key) {
            (ChildIndex::Positions(v), NodeKey::Index(i)) => v.insert(*i, id),
            (ChildIndex::Names(m), NodeKey::Name(n)) => {
                m.insert(n.clone(), id);
            }
            _ => unreachable!("key kind does not match vector kind"),
        }
    }

    /// Overwrite the slot under an existing `key`.
    pub fn set(&mut self, key: &NodeKey, id: NodeId) {
        match (self, key) {
            (ChildIndex::Positions(v), NodeKey::Index(i)) => v[*i] = id,
            (ChildIndex::Names(m), NodeKey::Name(n)) => {
                m.insert(n.clone(), id);
            }
            _ => unreachable!("key kind does not match vector kind"),
        }
    }

    /// Remove `key`; positions after it shift down by one.
    pub fn remove(&mut self, key: &NodeKey) {
        match (self, key) {
            (ChildIndex::Positions(v), NodeKey::Index(i)) => {
                v.remove(*i);
            }
            (ChildIndex::Names(m), NodeKey::Name(n)) => {
                m.remove(n);
            }
            _ => unreachable!("key kind does not match vector kind"),
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<NodeRecord>,
}

#[derive(Debug)]
pub(crate) struct Arena {
    document: DocumentId,
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
    // Allocations made while at least one mark is open.
    journal: Vec<NodeId>,
    open_marks: usize,
}

impl Arena {
    pub fn new(document: DocumentId) -> Self {
        Self {
            document,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            journal: Vec::new(),
            open_marks: 0,
        }
    }

    /// Store a new orphan record, reusing a freed slot when one exists.
    pub fn alloc(&mut self, payload: Payload) -> NodeId {
        let record = NodeRecord {
            key: None,
            parent: None,
            prev: None,
            next: None,
            payload,
        };
        let id = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot];
                entry.record = Some(record);
                NodeId {
                    document: self.document,
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                NodeId {
                    document: self.document,
                    slot: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        self.live += 1;
        if self.open_marks > 0 {
            self.journal.push(id);
        }
        id
    }

    /// Release the record of `id`. Handles to it go stale and the slot is
    /// reused by a later allocation.
    pub fn free(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        let entry = &mut self.slots[id.slot];
        entry.record = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
    }

    /// Whether `id` refers to a live record of this arena.
    pub fn contains(&self, id: NodeId) -> bool {
        id.document == self.document
            && self
                .slots
                .get(id.slot)
                .is_some_and(|s| s.generation == id.generation && s.record.is_some())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Number of slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Start journaling allocations; returns the position to roll back to.
    pub fn mark(&mut self) -> usize {
        self.open_marks += 1;
        self.journal.len()
    }

    /// Close the mark opened at `mark`, keeping its allocations.
    pub fn commit(&mut self, mark: usize) {
        self.close(mark, false);
    }

    /// Close the mark opened at `mark`, freeing every record allocated
    /// since. Returns how many were freed.
    pub fn rollback(&mut self, mark: usize) -> usize {
        self.close(mark, true)
    }

    fn close(&mut self, mark: usize, discard: bool) -> usize {
        let count = self.journal.len().saturating_sub(mark);
        if discard {
            let allocated: Vec<NodeId> = self.journal.drain(mark..).collect();
            for id in allocated {
                self.free(id);
            }
        }
        self.open_marks = self.open_marks.saturating_sub(1);
        if self.open_marks == 0 {
            self.journal.clear();
        }
        count
    }

    pub fn vector(&self, id: NodeId) -> Option<&VectorData> {
        match &self[id].payload {
            Payload::Vector(v) => Some(v),
            Payload::Scalar(_) => None,
        }
    }

    pub fn vector_mut(&mut self, id: NodeId) -> Option<&mut VectorData> {
        match &mut self[id].payload {
            Payload::Vector(v) => Some(v),
            Payload::Scalar(_) => None,
        }
    }

    fn slot(&self, id: NodeId) -> &Slot {
        assert_eq!(
            id.document, self.document,
            "node handle belongs to a different document"
        );
        &self.slots[id.slot]
    }
}

impl Index<NodeId> for Arena {
    type Output = NodeRecord;

    fn index(&self, id: NodeId) -> &NodeRecord {
        let slot = self.slot(id);
        assert_eq!(
            slot.generation, id.generation,
            "node handle refers to a discarded node"
        );
        match &slot.record {
            Some(record) => record,
            None => panic!("node handle refers to a discarded node"),
        }
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        let generation = self.slot(id).generation;
        assert_eq!(
            generation, id.generation,
            "node handle refers to a discarded node"
        );
        match &mut self.slots[id.slot].record {
            Some(record) => record,
            None => panic!("node handle refers to a discarded node"),
        }
    }
}
