//! Segment escaping and path text helpers.

use crate::PointerError;

/// Unescapes a pointer path component.
///
/// `~1` is replaced with `/` first, then `~0` with `~`.
///
/// # Example
///
/// ```
/// use json_dom_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("~01"), "~1");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer path component.
///
/// `~` is replaced with `~0` first, then `/` with `~1`.
///
/// # Example
///
/// ```
/// use json_dom_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// assert_eq!(escape_component("a/b~c"), "a~1b~0c");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Check if a string is a canonical array index: ASCII digits with no
/// leading zero unless the index is exactly `"0"`.
///
/// # Example
///
/// ```
/// use json_dom_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("1.5"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Decode the path part of a pointer (`''` or `'/' segment ...`).
pub(crate) fn decode_path(path: &str) -> Result<Vec<String>, PointerError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    match path.strip_prefix('/') {
        Some(rest) => Ok(rest.split('/').map(unescape_component).collect()),
        None => Err(PointerError::InvalidPath),
    }
}

/// Encode path components, each prefixed with `/`.
pub(crate) fn encode_path(path: &[String], out: &mut String) {
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
}

/// Split a leading relative-levels prefix from pointer text.
///
/// Returns `None` for the levels when the text does not start with a digit.
pub(crate) fn split_relative_prefix(text: &str) -> Result<(Option<usize>, &str), PointerError> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok((None, text));
    }
    let (prefix, rest) = text.split_at(digits);
    if !is_valid_index(prefix) {
        return Err(PointerError::InvalidRelativeLevels);
    }
    let levels = prefix
        .parse::<usize>()
        .map_err(|_| PointerError::InvalidRelativeLevels)?;
    Ok((Some(levels), rest))
}
