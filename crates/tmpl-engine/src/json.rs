//! Convenience conversion from `serde_json::Value` into this crate's
//! own `Value` (spec.md §6 treats "host framework integration" as an
//! external collaborator, but a concrete embedding surface is still
//! useful: JSON is the natural interchange shape for a context handed
//! in by a non-Rust host, mirroring how the reference implementation's
//! context comes from arbitrary Python objects — `dict`/`list`/`str`/
//! `int`/`float`/`bool`/`None` — which map onto JSON's own type set
//! almost exactly).

use std::collections::HashMap;
use std::sync::Arc;

use tmpl_ast::Value;

/// Convert one JSON value into the engine's `Value`. Numbers that fit in
/// `i64` become `Value::Int`; everything else numeric becomes
/// `Value::Float`.
pub fn value_from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(0.0)),
        },
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => Value::Sequence(Arc::new(items.into_iter().map(value_from_json).collect())),
        serde_json::Value::Object(map) => Value::Mapping(Arc::new(
            map.into_iter().map(|(k, v)| (Value::str(k), value_from_json(v))).collect(),
        )),
    }
}

/// Convert a top-level JSON object into a `Template::render` context
/// map. A non-object top level has no variable names to bind, so it
/// yields an empty context rather than erroring.
pub fn context_from_json(json: serde_json::Value) -> HashMap<String, Value> {
    match json {
        serde_json::Value::Object(map) => map.into_iter().map(|(k, v)| (k, value_from_json(v))).collect(),
        _ => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn scalars_convert_directly() {
        assert_eq!(value_from_json(json!(null)), Value::Null);
        assert_eq!(value_from_json(json!(true)), Value::Bool(true));
        assert_eq!(value_from_json(json!(42)), Value::Int(42));
        assert_eq!(value_from_json(json!("hi")), Value::str("hi"));
    }

    #[test]
    fn non_integral_numbers_become_floats() {
        assert_eq!(value_from_json(json!(2.5)), Value::Float(2.5));
    }

    #[test]
    fn arrays_and_objects_convert_recursively() {
        let arr = value_from_json(json!(["a", 1]));
        assert!(matches!(arr, Value::Sequence(_)));

        let obj = value_from_json(json!({"k": "v"}));
        assert!(matches!(obj, Value::Mapping(_)));
    }

    #[test]
    fn context_from_json_object_binds_top_level_keys() {
        let ctx = context_from_json(json!({"user": {"name": "Lily"}}));
        assert!(ctx.contains_key("user"));
    }

    #[test]
    fn context_from_non_object_is_empty() {
        assert!(context_from_json(json!([1, 2, 3])).is_empty());
    }
}
