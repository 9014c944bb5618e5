//! Pointer evaluation and generation over a document tree.
//!
//! The [`Pointer`] value type lives in the `json-dom-pointer` crate and is
//! re-exported here.

pub use json_dom_pointer::{Pointer, PointerError};

mod evaluator;
pub use evaluator::{Evaluated, PointerEvaluator};

mod generator;
pub use generator::PointerGenerator;
