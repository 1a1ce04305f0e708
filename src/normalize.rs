//! Value coercion for dictionary entries.
//!
//! Configured values may be any JSON shape. The engine only ever deals
//! in strings, so each value is converted once when the configuration
//! is built.

use serde_json::Value;

/// Convert a raw configured value into its canonical string form.
///
/// - missing value: empty string
/// - JSON string: passed through unchanged, no quoting or escaping
/// - anything else (numbers, booleans, `null`, arrays, objects): compact JSON
///
/// ```
/// use dict_replacer::normalize::normalize_value;
/// use serde_json::json;
///
/// assert_eq!(normalize_value(None), "");
/// assert_eq!(normalize_value(Some(&json!("https://api.local"))), "https://api.local");
/// assert_eq!(normalize_value(Some(&json!({"debug": true}))), r#"{"debug":true}"#);
/// ```
pub fn normalize_value(raw: Option<&Value>) -> String {
    match raw {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        // Display for Value is the compact serializer and cannot fail
        Some(other) => other.to_string(),
    }
}
