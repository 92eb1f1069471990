pub mod axes;
pub mod section;

// Re-export types for convenience.
pub use crate::types::axes::{Labels, Units};
pub use crate::types::section::{get_key, Section};

use serde_json::Value;

/// Returns the values of `expected_keys` in `value`, in the order given, if `value` is a JSON
/// object containing exactly that set of keys and only string values.
pub(crate) fn string_fields<'a>(value: &'a Value, expected_keys: &[&str]) -> Option<Vec<&'a str>> {
    let object = value.as_object()?;
    if object.len() != expected_keys.len() {
        return None;
    }
    expected_keys
        .iter()
        .map(|key| object.get(*key).and_then(Value::as_str))
        .collect()
}
