//! Lenient deserializers for gateway payloads that mix numbers and strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a number, a numeric string, or null.
pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept a string or a number (rendered as a string), or null.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Option::<Value>::deserialize(d)?.as_ref()))
}

/// String view of a JSON scalar; empty strings count as absent.
pub(crate) fn value_to_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
