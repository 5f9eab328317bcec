//! JSON bridge for runtime values.
//!
//! JSON documents come in as dynamic property bags (`Value::Map`) so the
//! same expressions work over them and over statically-typed objects, and
//! evaluation results go back out as `serde_json` values for printing.

use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::value::Value;

/// Converts a JSON document into a runtime value. Objects become dynamic
/// string-keyed bags; numbers keep their integer/float distinction.
pub fn from_json(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::Str(s),
        JsonValue::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        JsonValue::Object(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| (key, from_json(value)))
                .collect(),
        ),
    }
}

/// Converts a runtime value into a JSON document.
///
/// Enum values render as their member name when one matches, records and
/// objects as JSON objects, and characters as one-character strings.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Char(c) => JsonValue::String(c.to_string()),
        Value::Int(n) => JsonValue::Number(Number::from(*n)),
        Value::UInt(n) => JsonValue::Number(Number::from(*n)),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Decimal(d) => match d.to_f64().and_then(Number::from_f64) {
            Some(n) => JsonValue::Number(n),
            None => JsonValue::String(d.to_string()),
        },
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Enum { ty, value } => match ty.member_name(*value) {
            Some(name) => JsonValue::String(name.to_string()),
            None => JsonValue::Number(Number::from(*value)),
        },
        Value::List(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => {
            let mut out = JsonMap::new();
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            for key in keys {
                out.insert(key.clone(), to_json(&map[key]));
            }
            JsonValue::Object(out)
        }
        Value::Object { fields, .. } => {
            let mut out = JsonMap::new();
            let mut keys: Vec<_> = fields.keys().collect();
            keys.sort();
            for key in keys {
                out.insert(key.clone(), to_json(&fields[key]));
            }
            JsonValue::Object(out)
        }
        Value::Record { shape, fields } => {
            let mut out = JsonMap::new();
            for ((name, _), value) in shape.fields.iter().zip(fields) {
                out.insert(name.clone(), to_json(value));
            }
            JsonValue::Object(out)
        }
    }
}
