//! Reconstruct structured type descriptions from instrumented validators.

use crate::domain::cursor::{Cursor, PathSegment};
use crate::domain::kind::Kind;
use crate::domain::Component;
use crate::prop_types::{ClassRef, ConstructionArg, Validator, ValidatorLibrary};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// What inference learned about a validator.
#[derive(Debug, Clone, PartialEq)]
pub enum InferredType {
    Leaf(TypeLeaf),
    /// No metadata was recorded; the validator is kept so values can still
    /// be checked against it.
    Unknown(Validator),
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeLeaf {
    pub kind: Kind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<InferredArg>>,
    #[serde(skip)]
    validator: Validator,
}

/// Inferred counterpart of a [`ConstructionArg`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InferredArg {
    Type(InferredType),
    List(Vec<InferredType>),
    Record(BTreeMap<String, InferredType>),
    Literals(Vec<Value>),
    Class(ClassRef),
}

impl TypeLeaf {
    pub fn new(kind: Kind, required: bool, args: Option<Vec<InferredArg>>, validator: Validator) -> Self {
        Self {
            kind,
            required,
            args,
            validator,
        }
    }

    /// The validator this leaf was inferred from.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    fn first_arg(&self) -> Option<&InferredArg> {
        self.args.as_ref()?.first()
    }

    /// Item type of `arrayOf`, value type of `objectOf`.
    pub fn element_type(&self) -> Option<&InferredType> {
        match self.first_arg()? {
            InferredArg::Type(inner) => Some(inner),
            _ => None,
        }
    }

    /// Field types of `shape`.
    pub fn fields(&self) -> Option<&BTreeMap<String, InferredType>> {
        match self.first_arg()? {
            InferredArg::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Literal choices of `oneOf`.
    pub fn choices(&self) -> Option<&[Value]> {
        match self.first_arg()? {
            InferredArg::Literals(choices) => Some(choices),
            _ => None,
        }
    }

    /// Candidate types of `oneOfType`.
    pub fn candidates(&self) -> Option<&[InferredType]> {
        match self.first_arg()? {
            InferredArg::List(candidates) => Some(candidates),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&ClassRef> {
        match self.first_arg()? {
            InferredArg::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl PartialEq for TypeLeaf {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.required == other.required && self.args == other.args
    }
}

impl InferredType {
    pub fn as_leaf(&self) -> Option<&TypeLeaf> {
        match self {
            InferredType::Leaf(leaf) => Some(leaf),
            InferredType::Unknown(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&Kind> {
        self.as_leaf().map(|leaf| &leaf.kind)
    }

    pub fn is_required(&self) -> bool {
        match self {
            InferredType::Leaf(leaf) => leaf.required,
            InferredType::Unknown(v) => v.requires_value(),
        }
    }

    /// The validator values of this type are checked with.
    pub fn validator(&self) -> &Validator {
        match self {
            InferredType::Leaf(leaf) => &leaf.validator,
            InferredType::Unknown(v) => v,
        }
    }

    /// The same type with `required` set, switching to the required flavor
    /// of the validator as well. Unknown types are returned unchanged.
    pub fn into_required(self) -> InferredType {
        match self {
            InferredType::Leaf(leaf) if !leaf.required => InferredType::Leaf(TypeLeaf {
                required: true,
                validator: leaf.validator.is_required(),
                ..leaf
            }),
            other => other,
        }
    }
}

impl Serialize for InferredType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InferredType::Leaf(leaf) => leaf.serialize(serializer),
            InferredType::Unknown(validator) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("opaque", &validator.id())?;
                map.end()
            }
        }
    }
}

/// Infer the type described by a validator.
pub fn infer_type(library: &ValidatorLibrary, validator: &Validator) -> InferredType {
    let Some(meta) = library.metadata(validator) else {
        debug!("No metadata for validator {}, treating it as opaque", validator.id());
        return InferredType::Unknown(validator.clone());
    };

    let args = meta.args.map(|args| {
        args.iter()
            .map(|arg| infer_arg(library, arg))
            .collect::<Vec<_>>()
    });

    InferredType::Leaf(TypeLeaf::new(meta.kind, meta.required, args, validator.clone()))
}

fn infer_arg(library: &ValidatorLibrary, arg: &ConstructionArg) -> InferredArg {
    match arg {
        ConstructionArg::Validator(v) => InferredArg::Type(infer_type(library, v)),
        ConstructionArg::List(list) => InferredArg::List(infer_list(library, list)),
        ConstructionArg::Record(record) => InferredArg::Record(infer_record(library, record)),
        ConstructionArg::Literals(values) => InferredArg::Literals(values.clone()),
        ConstructionArg::Class(class) => InferredArg::Class(class.clone()),
    }
}

/// Infer every validator of a mapping, key by key.
pub fn infer_record(
    library: &ValidatorLibrary,
    validators: &BTreeMap<String, Validator>,
) -> BTreeMap<String, InferredType> {
    validators
        .iter()
        .map(|(key, v)| (key.clone(), infer_type(library, v)))
        .collect()
}

/// Infer an ordered list of validators, preserving order.
pub fn infer_list(library: &ValidatorLibrary, validators: &[Validator]) -> Vec<InferredType> {
    validators.iter().map(|v| infer_type(library, v)).collect()
}

/// Inferred types for all props a component declares.
pub fn infer_types_for_component(
    library: &ValidatorLibrary,
    component: &Component,
) -> BTreeMap<String, InferredType> {
    infer_record(library, &component.prop_types)
}

/// The inferred type addressed by `cursor`. The first segment names the prop.
pub fn type_at<'t>(
    types: &'t BTreeMap<String, InferredType>,
    cursor: &Cursor,
) -> Option<&'t InferredType> {
    let (head, rest) = cursor.split_first()?;
    let root = types.get(head.as_key()?)?;

    rest.segments().iter().try_fold(root, |current, segment| {
        let leaf = current.as_leaf()?;
        match (&leaf.kind, segment) {
            (Kind::Shape, PathSegment::Key(key)) => leaf.fields()?.get(key),
            (Kind::ObjectOf, PathSegment::Key(_)) | (Kind::ArrayOf, PathSegment::Index(_)) => {
                leaf.element_type()
            }
            _ => None,
        }
    })
}
