use super::{constant, Chooser, GenerationConfig, GeneratorTable, Nullability};
use crate::domain::cursor::Cursor;
use crate::domain::kind::Kind;
use crate::domain::value::{callback, element};
use crate::inference::TypeLeaf;
use serde_json::{json, Map, Value};

/// Always picks the first option.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl Chooser for FirstChoice {
    fn choose(&self, _path: &Cursor, len: usize) -> Option<usize> {
        (len > 0).then_some(0)
    }
}

/// Every optional field is `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalIsNull;

impl Nullability for OptionalIsNull {
    fn should_null(&self, _path: &Cursor, leaf: &TypeLeaf) -> bool {
        !leaf.required
    }
}

fn minimal_values() -> GeneratorTable {
    GeneratorTable::from([
        (Kind::String, constant(json!(""))),
        (Kind::Number, constant(json!(0))),
        (Kind::Bool, constant(json!(false))),
        (Kind::Array, constant(Value::Array(Vec::new()))),
        (Kind::Object, constant(Value::Object(Map::new()))),
        (Kind::Func, constant(callback("noop"))),
        (Kind::Any, constant(json!(""))),
        (Kind::Node, constant(json!(""))),
        (Kind::Element, constant(element("div", json!({})))),
    ])
}

/// Deterministic defaults: optional fields are `null`, required fields get
/// the smallest valid value, enumerations take their first option.
pub fn static_config() -> GenerationConfig {
    GenerationConfig::new().merge(minimal_values())
}
