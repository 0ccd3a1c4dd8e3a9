//! JSON overlay used when folding stored or remote data into a draft.
use serde_json::Value;

/// Copy `source` onto `target`, key by key.
///
/// Only keys `target` already knows are written, `null` never overwrites,
/// nested objects merge recursively and arrays are replaced whole.
/// Flags sent as `0`/`1` and numbers sent for text slots are coerced to the
/// slot's type.
pub fn overlay(target: &mut Value, source: &Value) {
    let (Some(target), Some(source)) = (target.as_object_mut(), source.as_object()) else {
        return;
    };
    for (key, incoming) in source {
        if incoming.is_null() {
            continue;
        }
        let Some(slot) = target.get_mut(key) else {
            continue;
        };
        if slot.is_object() && incoming.is_object() {
            overlay(slot, incoming);
        } else {
            *slot = coerce(slot, incoming);
        }
    }
}

fn coerce(slot: &Value, incoming: &Value) -> Value {
    match (slot, incoming) {
        (Value::Bool(_), Value::Number(number)) => match number.as_u64() {
            Some(0) => Value::Bool(false),
            Some(1) => Value::Bool(true),
            _ => incoming.clone(),
        },
        (Value::Bool(_), Value::String(text)) => match text.trim() {
            "0" | "false" => Value::Bool(false),
            "1" | "true" => Value::Bool(true),
            _ => incoming.clone(),
        },
        (Value::String(_), Value::Number(number)) => Value::String(number.to_string()),
        _ => incoming.clone(),
    }
}
