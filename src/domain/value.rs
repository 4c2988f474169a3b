//! Marker objects for host values that JSON cannot carry.
//!
//! Fixture values are plain JSON. Callbacks, UI elements and class instances
//! are stored as single-purpose marker objects:
//!
//! ```json
//! { "$fn": "onClick" }
//! { "$element": "div", "props": {} }
//! { "$instance": "Date" }
//! ```

use serde_json::{json, Value};

pub const CALLBACK_TAG: &str = "$fn";
pub const ELEMENT_TAG: &str = "$element";
pub const INSTANCE_TAG: &str = "$instance";

/// Create a callback marker
pub fn callback(name: &str) -> Value {
    json!({ "$fn": name })
}

/// Create an element marker
pub fn element(tag: &str, props: Value) -> Value {
    json!({ "$element": tag, "props": props })
}

/// Create a class instance marker
pub fn instance(class: &str) -> Value {
    json!({ "$instance": class })
}

/// Check if a value is a callback marker
pub fn is_callback(value: &Value) -> bool {
    callback_name(value).is_some()
}

/// Extract the name from a callback marker
pub fn callback_name(value: &Value) -> Option<&str> {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            return map.get(CALLBACK_TAG).and_then(Value::as_str);
        }
    }
    None
}

/// Check if a value is an element marker
pub fn is_element(value: &Value) -> bool {
    element_tag(value).is_some()
}

/// Extract the tag from an element marker
pub fn element_tag(value: &Value) -> Option<&str> {
    value.as_object()?.get(ELEMENT_TAG)?.as_str()
}

/// Extract the class name from an instance marker
pub fn instance_class(value: &Value) -> Option<&str> {
    value.as_object()?.get(INSTANCE_TAG)?.as_str()
}

/// Whether a value can be rendered as a child node: numbers, strings,
/// `null`, `false`, elements and arrays of nodes.
pub fn is_node(value: &Value) -> bool {
    match value {
        Value::Null | Value::Number(_) | Value::String(_) => true,
        Value::Bool(b) => !b,
        Value::Array(items) => items.iter().all(is_node),
        Value::Object(_) => is_element(value),
    }
}

/// Name of a value's type, as reported in validation messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) if is_callback(value) => "function",
        Value::Object(_) => "object",
    }
}
