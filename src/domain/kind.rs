use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Type family of a validator.
///
/// The built-in variants mirror the standard prop-type vocabulary. Leaf kinds
/// registered on a library at runtime are carried as `Extension`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    String,
    Number,
    Bool,
    Array,
    Object,
    Func,
    Any,
    Node,
    Element,
    Shape,
    ArrayOf,
    ObjectOf,
    InstanceOf,
    OneOf,
    OneOfType,
    Extension(String),
}

impl Kind {
    /// Kinds that are validators on their own (no construction arguments).
    pub const LEAVES: [Kind; 9] = [
        Kind::String,
        Kind::Number,
        Kind::Bool,
        Kind::Array,
        Kind::Object,
        Kind::Func,
        Kind::Any,
        Kind::Node,
        Kind::Element,
    ];

    /// Kinds produced by a validator constructor.
    pub const CONSTRUCTORS: [Kind; 6] = [
        Kind::Shape,
        Kind::ArrayOf,
        Kind::ObjectOf,
        Kind::InstanceOf,
        Kind::OneOf,
        Kind::OneOfType,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Bool => "bool",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Func => "func",
            Kind::Any => "any",
            Kind::Node => "node",
            Kind::Element => "element",
            Kind::Shape => "shape",
            Kind::ArrayOf => "arrayOf",
            Kind::ObjectOf => "objectOf",
            Kind::InstanceOf => "instanceOf",
            Kind::OneOf => "oneOf",
            Kind::OneOfType => "oneOfType",
            Kind::Extension(name) => name,
        }
    }

    /// Built-in kind with the given name, ignoring ASCII case.
    pub fn builtin(name: &str) -> Option<Kind> {
        Kind::LEAVES
            .into_iter()
            .chain(Kind::CONSTRUCTORS)
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }
}

impl FromStr for Kind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = Kind::LEAVES
            .iter()
            .chain(Kind::CONSTRUCTORS.iter())
            .find(|k| k.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Kind::Extension(s.to_string()));
        Ok(kind)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(kind) => Ok(kind),
            Err(never) => match never {},
        }
    }
}
