//! Deep-replace merging of document trees.
//!
//! Precedence is fixed: the overlay wins per key, and the merge recurses
//! only when *both* sides are maps. Sequences and scalars are replaced
//! whole; the `calls`/`tags` append rule used by the inheritance and
//! extension normalizers is handled by those passes, never here.

use crate::value::Value;
use indexmap::IndexMap;

/// Merges `overlay` on top of `base`, returning the combined value.
pub fn deep_replace(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Map(base), Value::Map(overlay)) => Value::Map(deep_replace_maps(base, overlay)),
        _ => overlay.clone(),
    }
}

/// Merges two maps with overlay-wins precedence.
///
/// Keys already present keep their position from `base`; keys new in
/// `overlay` are appended in overlay order.
pub fn deep_replace_maps(
    base: &IndexMap<String, Value>,
    overlay: &IndexMap<String, Value>,
) -> IndexMap<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overlay {
        match merged.get_mut(key) {
            Some(existing) => *existing = deep_replace(existing, value),
            None => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
