//! Helpers for the nested JSON objects carried on edges, plus the run-stable
//! string hash behind every `json_id`.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde_json::{Map, Value};

/// Deterministic 64-bit hash of a string.
///
/// `FxHasher` has no random keys and its algorithm is fixed by the pinned
/// `rustc-hash` release, so ids stay the same across runs and toolchain
/// upgrades on 64-bit little-endian targets.
pub fn stable_hash(value: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(value.as_bytes());
    hasher.write_u8(0xff);
    hasher.finish()
}

fn as_object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was replaced by an object above"),
    }
}

/// Insert `key: value` into the object found by walking `path` from `destination`.
///
/// Missing intermediate objects are created. A non-object found along the way
/// is replaced by an empty object.
pub fn add_to_dict_with_path(destination: &mut Value, path: &[&str], key: &str, value: Value) {
    let mut current = destination;
    for segment in path {
        current = as_object_mut(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object_mut(current).insert(key.to_string(), value);
}

/// Look up the value stored under `path` (every segment but the last must be an object).
pub fn value_at_path<'a>(source: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = source;
    for segment in path {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

/// Recursively merge `source` into `target`. Keys already present in `target`
/// win unless their value is `null`.
pub fn merge_dicts(target: &mut Value, source: &Value) {
    let Some(source_map) = source.as_object() else {
        return;
    };
    if !target.is_object() {
        if target.is_null() {
            *target = source.clone();
        }
        return;
    }
    let target_map = as_object_mut(target);
    for (key, source_value) in source_map {
        match target_map.get_mut(key) {
            Some(existing) if existing.is_object() && source_value.is_object() => {
                merge_dicts(existing, source_value);
            }
            Some(existing) if existing.is_null() => {
                *existing = source_value.clone();
            }
            Some(_) => {}
            None => {
                target_map.insert(key.clone(), source_value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adds_value_under_new_nested_path() {
        let mut data = json!({});
        add_to_dict_with_path(&mut data, &["dir1", "dir2"], "important", json!("to_display"));
        assert_eq!(data, json!({"dir1": {"dir2": {"important": "to_display"}}}));
        assert_eq!(
            value_at_path(&data, &["dir1", "dir2", "important"]),
            Some(&json!("to_display"))
        );
    }

    #[test]
    fn adds_value_at_top_level_with_empty_path() {
        let mut data = json!({"a": 1});
        add_to_dict_with_path(&mut data, &[], "b", json!(2));
        assert_eq!(data, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merge_keeps_existing_keys_and_adds_missing_ones() {
        let mut target = json!({"fragment": {"name": "scaffold1"}, "x": 1});
        let source = json!({"fragment": {"name": "scaffold2", "origin": "asm"}, "y": 2});
        merge_dicts(&mut target, &source);
        assert_eq!(
            target,
            json!({"fragment": {"name": "scaffold1", "origin": "asm"}, "x": 1, "y": 2})
        );
    }

    #[test]
    fn merge_fills_null_placeholders() {
        let mut target = json!({"fragment": {"name": null}});
        merge_dicts(&mut target, &json!({"fragment": {"name": "scaffold2"}}));
        assert_eq!(target, json!({"fragment": {"name": "scaffold2"}}));
    }

    #[test]
    fn stable_hash_is_deterministic_and_discriminating() {
        assert_eq!(stable_hash("genome1"), stable_hash("genome1"));
        assert_ne!(stable_hash("genome1"), stable_hash("genome2"));
        assert_ne!(stable_hash("1h"), stable_hash("1h__infinity"));
    }
}
