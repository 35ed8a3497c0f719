//! JSON merge helper for layered configuration.

use serde_json::Value;

/// Merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (arrays included)
/// replaces the base value wholesale.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                base_map
                    .entry(key.clone())
                    .and_modify(|existing| merge_json_values(existing, value))
                    .or_insert_with(|| value.clone());
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
