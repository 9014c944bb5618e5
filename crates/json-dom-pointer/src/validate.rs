//! Validation of pointer parameter combinations.

use crate::PointerError;

/// Validate the parts a [`Pointer`](crate::Pointer) is built from.
///
/// # Errors
///
/// - negative relative levels
/// - a key lookup with a non-empty path
/// - a key lookup on an absolute pointer (no levels)
///
/// # Example
///
/// ```
/// use json_dom_pointer::validate_parameters;
///
/// validate_parameters(&["a".to_string()], None, false).unwrap();
/// validate_parameters(&[], Some(1), true).unwrap();
/// validate_parameters(&[], None, true).unwrap_err();
/// validate_parameters(&[], Some(-1), false).unwrap_err();
/// ```
pub fn validate_parameters(
    path: &[String],
    relative_levels: Option<i64>,
    key_lookup: bool,
) -> Result<(), PointerError> {
    if matches!(relative_levels, Some(levels) if levels < 0) {
        return Err(PointerError::NegativeLevels);
    }
    if key_lookup && !path.is_empty() {
        return Err(PointerError::KeyLookupWithPath);
    }
    if key_lookup && relative_levels.is_none() {
        return Err(PointerError::KeyLookupOnAbsolute);
    }
    Ok(())
}
