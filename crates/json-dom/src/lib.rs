//! A mutable document object model for JSON with absolute and relative
//! pointers.
//!
//! A [`Document`] owns an arena of nodes addressed by [`NodeId`] handles.
//! Arrays and objects are edited through the [`ArrayNode`] and
//! [`ObjectNode`] views, which keep array keys contiguous, sibling links
//! consistent and every node under at most one parent. Nodes are located
//! with a [`PointerEvaluator`] and addressed with a [`PointerGenerator`].
//!
//! # Example
//!
//! ```
//! use json_dom::{Document, PointerGenerator};
//!
//! let doc = Document::parse(r#"{"glossary":{"title":"example","tags":["a"]}}"#).unwrap();
//! let tags = doc.evaluate_pointer("/glossary/tags", None).unwrap().into_node().unwrap();
//!
//! let array = doc.array(tags).unwrap();
//! array.push(doc.create_string("b")).unwrap();
//! assert_eq!(doc.to_json_string(), r#"{"glossary":{"title":"example","tags":["a","b"]}}"#);
//!
//! let key = doc.evaluate_pointer("1#", Some(array.item(1).unwrap())).unwrap();
//! assert_eq!(key.into_key().unwrap().to_string(), "tags");
//!
//! let generator = PointerGenerator::from_document(&doc).unwrap();
//! let pointer = generator.generate_absolute_pointer(array.item(1).unwrap()).unwrap();
//! assert_eq!(pointer.to_string(), "/glossary/tags/1");
//! ```

mod arena;

mod array;
pub use array::ArrayNode;

pub mod cli;

mod document;
pub use document::{Document, ParseOptions};

mod error;
pub use error::DomError;

pub mod factory;
pub use factory::{BuildOptions, HostKey, HostValue, JsonSerializable, NodeFactory};

mod node;
pub use node::{DocumentId, NodeId, NodeKey, NodeKind, Scalar};

mod object;
pub use object::ObjectNode;

pub mod pointer;
pub use pointer::{Evaluated, Pointer, PointerError, PointerEvaluator, PointerGenerator};

mod vector;
pub use vector::{Children, VectorNode};
