use std::fs;
use std::path::{Path, PathBuf};

use json_dom::{Document, NodeId};

pub const GLOSS_SEE_ALSO: &str = "/glossary/GlossDiv/GlossList/GlossEntry/GlossDef/GlossSeeAlso";

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {e}", path))
}

pub fn load_glossary() -> Document {
    Document::parse(&read_fixture("glossary.json"))
        .unwrap_or_else(|e| panic!("failed to parse glossary fixture: {e}"))
}

/// Node addressed by an absolute pointer, panicking when it does not exist.
pub fn node_at(doc: &Document, pointer: &str) -> NodeId {
    doc.evaluate_pointer(pointer, None)
        .unwrap_or_else(|e| panic!("failed to evaluate {pointer:?}: {e}"))
        .into_node()
        .unwrap_or_else(|| panic!("{pointer:?} did not address a node"))
}

/// Walk every node below `node` and check sibling links, parent links and
/// array key contiguity.
pub fn assert_consistent(doc: &Document, node: NodeId) {
    if !doc.kind(node).is_vector() {
        return;
    }
    let mut prev = None;
    let mut count = 0;
    let mut cursor = doc.first_child(node);
    while let Some(child) = cursor {
        assert_eq!(doc.parent(child), Some(node), "parent link");
        assert_eq!(doc.previous_sibling(child), prev, "previous sibling link");
        let key = doc.key(child).expect("attached child has a key");
        assert_eq!(doc.child(node, &key), Some(child), "key index");
        if doc.kind(node) == json_dom::NodeKind::Array {
            assert_eq!(key.as_index(), Some(count), "array key contiguity");
        }
        assert_consistent(doc, child);
        prev = Some(child);
        count += 1;
        cursor = doc.next_sibling(child);
    }
    assert_eq!(doc.last_child(node), prev, "last child");
    assert_eq!(doc.count(node), count, "child count");
}
