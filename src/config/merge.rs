//! Layer merge rules
//!
//! - Tables: merged key by key, recursively
//! - Arrays: replaced wholesale by the later layer
//! - Scalars: later layer wins

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// `null` in the overlay replaces the base value, which lets a later layer
/// clear an optional path.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Fold layers lowest-precedence first.
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
