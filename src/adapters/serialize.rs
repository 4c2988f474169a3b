use crate::domain::value::{callback_name, element_tag, instance_class};
use serde_json::Value;

const CUSTOM_OBJECT: &str = "\"<<object w/ custom constructor>>\"";

/// Render a fixture value as a JavaScript literal, the way it would be
/// written in a component's source.
pub fn serialize_to_js(value: &Value) -> String {
    if let Some(name) = callback_name(value) {
        return format!("function {}() {{}}", name);
    }
    if let Some(tag) = element_tag(value) {
        let props = value.get("props").unwrap_or(&Value::Null);
        return format!(
            "React.createElement({}, {})",
            Value::from(tag),
            serialize_to_js(props)
        );
    }
    if instance_class(value).is_some() {
        return CUSTOM_OBJECT.to_string();
    }

    match value {
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => block('[', ']', items.iter().map(serialize_to_js)),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => block(
            '{',
            '}',
            map.iter()
                .map(|(key, v)| format!("{}: {}", Value::from(key.as_str()), serialize_to_js(v))),
        ),
        primitive => primitive.to_string(),
    }
}

fn block(open: char, close: char, children: impl Iterator<Item = String>) -> String {
    let body = children.collect::<Vec<_>>().join(",\n");
    format!("{}\n{}\n{}", open, indent(&body), close)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
