//! Data contract for a recursive prop editor.
//!
//! A form is a tree of [`FieldView`]s, one per prop, each carrying the cursor
//! that addresses its value. Edits come back as a cursor plus a
//! [`FieldEdit`] and are applied with [`apply_edit`].

use crate::adapters::serialize::serialize_to_js;
use crate::domain::cursor::Cursor;
use crate::domain::error::CursorError;
use crate::domain::kind::Kind;
use crate::generation::{generate_value_for_type, value_satisfies_type, GenerationConfig};
use crate::inference::InferredType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub label: String,
    pub cursor: Cursor,
    pub value: Value,
    pub required: bool,
    pub nullable: bool,
    pub is_null: bool,
    pub valid: bool,
    pub affordance: Affordance,
}

/// How a field is edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Affordance {
    Text,
    Checkbox,
    Number,
    Select { options: Vec<Value> },
    List { items: Vec<FieldView> },
    Record { fields: Vec<FieldView> },
    /// Read-only dump for types the editor has no input for.
    Raw { dump: String },
}

/// A change requested through the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    Set(Value),
    /// Set the field to `null`.
    Clear,
    RemoveItem(usize),
    /// Append a generated item to a list.
    AppendItem,
}

pub fn field_view(label: &str, t: &InferredType, value: &Value, cursor: Cursor) -> FieldView {
    let required = t.is_required();
    let affordance = affordance(label, t, value, &cursor);

    FieldView {
        label: label.to_string(),
        required,
        nullable: !required,
        is_null: value.is_null(),
        valid: value_satisfies_type(value, t),
        value: value.clone(),
        cursor,
        affordance,
    }
}

fn affordance(label: &str, t: &InferredType, value: &Value, cursor: &Cursor) -> Affordance {
    let raw = || Affordance::Raw {
        dump: serialize_to_js(value),
    };
    let Some(leaf) = t.as_leaf() else {
        return raw();
    };

    match &leaf.kind {
        Kind::String | Kind::Node | Kind::Element => Affordance::Text,
        Kind::Bool => Affordance::Checkbox,
        Kind::Number => Affordance::Number,
        Kind::OneOf => Affordance::Select {
            options: leaf.choices().map(<[Value]>::to_vec).unwrap_or_default(),
        },
        Kind::ArrayOf => match leaf.element_type() {
            Some(item_type) => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                Affordance::List {
                    items: items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            field_view(&format!("{}[{}]", label, i), item_type, item, cursor.child(i))
                        })
                        .collect(),
                }
            }
            None => raw(),
        },
        Kind::Shape => match leaf.fields() {
            Some(fields) => Affordance::Record {
                fields: fields
                    .iter()
                    .map(|(key, field_type)| {
                        let field_value = value.get(key).unwrap_or(&Value::Null);
                        field_view(
                            &format!("{}.{}", label, key),
                            field_type,
                            field_value,
                            cursor.child(key.as_str()),
                        )
                    })
                    .collect(),
            },
            None => raw(),
        },
        _ => raw(),
    }
}

/// Views for every declared prop of one instance, cursors rooted at `base`.
pub fn form_for(types: &BTreeMap<String, InferredType>, props: &Value, base: &Cursor) -> Vec<FieldView> {
    types
        .iter()
        .map(|(name, t)| {
            let value = props.get(name).unwrap_or(&Value::Null);
            field_view(name, t, value, base.child(name.as_str()))
        })
        .collect()
}

/// Apply `edit` to the value at `cursor` inside `root`. `t` is the type of
/// that value.
pub fn apply_edit(
    root: &mut Value,
    cursor: &Cursor,
    t: &InferredType,
    edit: FieldEdit,
    config: &GenerationConfig,
) -> Result<(), CursorError> {
    match edit {
        FieldEdit::Set(value) => cursor.set(root, value),
        FieldEdit::Clear => cursor.set(root, Value::Null),
        FieldEdit::RemoveItem(index) => match cursor.get(root) {
            Some(Value::Array(_)) => cursor.child(index).remove(root).map(|_| ()),
            Some(Value::Null) | None => Err(CursorError::OutOfBounds { index, len: 0 }),
            Some(_) => Err(CursorError::NotAList(cursor.to_string())),
        },
        FieldEdit::AppendItem => {
            let item_type = t
                .as_leaf()
                .filter(|leaf| leaf.kind == Kind::ArrayOf)
                .and_then(|leaf| leaf.element_type())
                .ok_or_else(|| CursorError::NotAList(cursor.to_string()))?;
            let len = match cursor.get(root) {
                Some(Value::Array(items)) => items.len(),
                Some(Value::Null) | None => 0,
                Some(_) => return Err(CursorError::NotAList(cursor.to_string())),
            };
            let at = cursor.child(len);
            let item = generate_value_for_type(item_type, &at, config);
            at.set(root, item)
        }
    }
}
