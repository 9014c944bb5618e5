//! Core logic of the `json-dom-pointer` binary.

use crate::document::Document;
use crate::error::DomError;
use crate::pointer::{Evaluated, PointerEvaluator};

/// Evaluate `pointer` in a JSON document.
///
/// `doc_json`: the document as a JSON string.
/// `pointer`: absolute (`/foo/0`) or relative (`1/bar`, `2#`) pointer text.
/// `context`: pointer to the node relative pointers start from; the root
/// when `None`.
///
/// Returns the addressed value, or the key for `#` pointers, as
/// pretty-printed JSON.
pub fn lookup_pointer(doc_json: &str, pointer: &str, context: Option<&str>) -> Result<String, DomError> {
    let document = Document::parse(doc_json)?;
    let evaluator = PointerEvaluator::from_document(&document)?;

    let context = match context {
        Some(text) => match evaluator.evaluate_str(text, None)? {
            Evaluated::Node(node) => Some(node),
            Evaluated::Key(_) => {
                return Err(DomError::InvalidReferenceNode(
                    "Context pointer must address a node, not a key".to_string(),
                ))
            }
        },
        None => None,
    };

    let value = match evaluator.evaluate_str(pointer, context)? {
        Evaluated::Node(node) => document.value(node),
        Evaluated::Key(key) => key.map_or(serde_json::Value::Null, |k| k.to_value()),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}
