//! Absolute and relative JSON Pointer values.
//!
//! Absolute pointers follow [RFC 6901](https://tools.ietf.org/html/rfc6901);
//! relative pointers prefix the path with a count of ancestor levels and may
//! end in `#` to address the key of the node reached instead of the node.
//!
//! # Example
//!
//! ```
//! use json_dom_pointer::Pointer;
//!
//! let base: Pointer = "/glossary/title".parse().unwrap();
//! let other: Pointer = "1/GlossDiv".parse().unwrap();
//!
//! let resolved = base.resolve_pointer(&other).unwrap();
//! assert_eq!(resolved.to_string(), "/glossary/GlossDiv");
//!
//! let up = resolved.pointer_for_ancestor(1).unwrap();
//! assert_eq!(up.pointer_for_child(["a/b~c"]).to_string(), "/glossary/a~1b~0c");
//! ```

use thiserror::Error;

mod pointer;
pub use pointer::Pointer;

mod util;
pub use util::{escape_component, is_valid_index, unescape_component};

pub mod validate;
pub use validate::validate_parameters;

/// A malformed pointer: invalid text or an invalid combination of parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("JSON pointer path must be the empty string or begin with /")]
    InvalidPath,
    #[error("relative pointer levels must be a non-negative integer without leading zeros")]
    InvalidRelativeLevels,
    #[error("relative levels cannot be negative")]
    NegativeLevels,
    #[error("key lookup is invalid with non-empty path")]
    KeyLookupWithPath,
    #[error("key lookup is invalid for absolute pointers")]
    KeyLookupOnAbsolute,
    #[error("cannot reference ancestors above root of absolute pointer")]
    AncestorAboveRoot,
    #[error("ancestor levels must be positive")]
    NonPositiveAncestorLevels,
}
