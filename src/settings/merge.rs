//! Deep merge of layered settings maps.
//!
//! Semantics are those of RFC 7386 (JSON merge patch) with one exception:
//! when both sides hold a list under the same key the lists are concatenated
//! (original first) instead of the patch replacing the original.
//!
//! Nulls coming from a patch are never copied into the result. Nulls already
//! present in the original are kept as they are.

use serde_json::Value;

use crate::settings::SettingsMap;

/// Merge `patch` into `original`, returning a fresh map.
///
/// Neither input is modified. If both are absent the result is absent.
pub fn merge(original: Option<&SettingsMap>, patch: Option<&SettingsMap>) -> Option<SettingsMap> {
    match (original, patch) {
        (original, None) => original.cloned(),
        (None, Some(patch)) => Some(without_nulls(patch)),
        (Some(original), Some(patch)) => Some(merge_maps(original, patch)),
    }
}

/// Apply `patches` to `original` from left to right.
pub fn merge_all(original: Option<&SettingsMap>, patches: &[Option<&SettingsMap>]) -> Option<SettingsMap> {
    patches
        .iter()
        .fold(original.cloned(), |merged, patch| merge(merged.as_ref(), *patch))
}

fn merge_maps(original: &SettingsMap, patch: &SettingsMap) -> SettingsMap {
    let mut result = original.clone();

    for (key, patch_value) in patch {
        match (original.get(key), patch_value) {
            (_, Value::Null) => {
                result.remove(key);
            }
            (Some(Value::Object(original_map)), Value::Object(patch_map)) => {
                result.insert(key.clone(), Value::Object(merge_maps(original_map, patch_map)));
            }
            (Some(Value::Array(original_items)), Value::Array(patch_items)) => {
                let mut combined = original_items.clone();
                combined.extend(patch_items.iter().map(strip_nulls));
                result.insert(key.clone(), Value::Array(combined));
            }
            _ => {
                result.insert(key.clone(), strip_nulls(patch_value));
            }
        }
    }

    result
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(without_nulls(map)),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}

fn without_nulls(map: &SettingsMap) -> SettingsMap {
    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), strip_nulls(value)))
        .collect()
}
