//! # Prop type validators
//!
//! A [`ValidatorLibrary`] is the vocabulary components use to declare their
//! inputs: leaf validators (`string`, `number`, ...) and constructors that
//! build validators from arguments (`shape`, `array_of`, ...).
//!
//! Validators can only say whether a value is valid. To reconstruct what the
//! space of valid values looks like, the library is *instrumented*: leaf
//! validators get their kind recorded in the library's [`MetadataTable`], and
//! every constructor call made afterwards records its kind and arguments for
//! the validator it returns. Validation behaviour is never changed.
//!
//! ```rust
//! use eidos::prop_types::ValidatorLibrary;
//!
//! let lib = ValidatorLibrary::new();
//! lib.instrument();
//!
//! let point = lib.shape([("x", lib.number().is_required()), ("y", lib.number())]);
//! assert!(lib.metadata(&point).is_some());
//! ```

pub mod metadata;
pub mod validator;

pub use metadata::{ClassRef, ConstructionArg, Metadata, MetadataTable};
pub use validator::{
    single_field, CheckFn, Location, PropError, Props, ValidationResult, Validator, ValidatorId,
};

use crate::domain::kind::Kind;
use crate::domain::value::{instance_class, is_callback, is_element, is_node, type_name};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

static SHARED: Lazy<Arc<ValidatorLibrary>> = Lazy::new(|| Arc::new(ValidatorLibrary::new()));

/// Instrument a library. Safe to call any number of times.
pub fn instrument(library: &ValidatorLibrary) {
    library.instrument();
}

struct StandardLeaves {
    string: Validator,
    number: Validator,
    bool: Validator,
    array: Validator,
    object: Validator,
    func: Validator,
    any: Validator,
    node: Validator,
    element: Validator,
}

impl StandardLeaves {
    fn new() -> Self {
        Self {
            string: leaf("string", Value::is_string),
            number: leaf("number", Value::is_number),
            bool: leaf("boolean", Value::is_boolean),
            array: leaf("array", Value::is_array),
            object: leaf("object", |v| v.is_object() && !is_callback(v)),
            func: leaf("function", is_callback),
            any: leaf("any", |_| true),
            node: leaf("a renderable node", is_node),
            element: leaf("a single element", is_element),
        }
    }

    fn get(&self, kind: &Kind) -> Option<&Validator> {
        match kind {
            Kind::String => Some(&self.string),
            Kind::Number => Some(&self.number),
            Kind::Bool => Some(&self.bool),
            Kind::Array => Some(&self.array),
            Kind::Object => Some(&self.object),
            Kind::Func => Some(&self.func),
            Kind::Any => Some(&self.any),
            Kind::Node => Some(&self.node),
            Kind::Element => Some(&self.element),
            _ => None,
        }
    }
}

/// A set of validators and constructors plus the metadata recorded about them.
pub struct ValidatorLibrary {
    standard: StandardLeaves,
    extensions: BTreeMap<String, Validator>,
    metadata: MetadataTable,
    instrumented: AtomicBool,
}

impl ValidatorLibrary {
    /// A fresh, uninstrumented library with the standard vocabulary.
    pub fn new() -> Self {
        Self {
            standard: StandardLeaves::new(),
            extensions: BTreeMap::new(),
            metadata: MetadataTable::new(),
            instrumented: AtomicBool::new(false),
        }
    }

    /// The process-wide library.
    pub fn shared() -> Arc<ValidatorLibrary> {
        Arc::clone(&SHARED)
    }

    /// Register an additional leaf kind accepting non-null values for which
    /// `accepts` returns true.
    pub fn define_leaf<F>(&mut self, name: &str, accepts: F) -> Validator
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let validator = Validator::chainable(type_check(format!("`{name}`"), accepts));
        if self.is_instrumented() {
            self.record_leaf(&Kind::Extension(name.to_string()), &validator);
        }
        self.extensions.insert(name.to_string(), validator.clone());
        validator
    }

    /// Leaf validator of the given kind (optional flavor).
    pub fn leaf(&self, kind: &Kind) -> Option<Validator> {
        match kind {
            Kind::Extension(name) => self.extensions.get(name).cloned(),
            other => self.standard.get(other).cloned(),
        }
    }

    /// Every leaf kind with its optional-flavor validator.
    pub fn leaves(&self) -> impl Iterator<Item = (Kind, &Validator)> + '_ {
        Kind::LEAVES
            .into_iter()
            .filter_map(move |kind| {
                let validator = self.standard.get(&kind)?;
                Some((kind, validator))
            })
            .chain(
                self.extensions
                    .iter()
                    .map(|(name, v)| (Kind::Extension(name.clone()), v)),
            )
    }

    pub fn string(&self) -> Validator {
        self.standard.string.clone()
    }

    pub fn number(&self) -> Validator {
        self.standard.number.clone()
    }

    pub fn bool(&self) -> Validator {
        self.standard.bool.clone()
    }

    pub fn array(&self) -> Validator {
        self.standard.array.clone()
    }

    pub fn object(&self) -> Validator {
        self.standard.object.clone()
    }

    pub fn func(&self) -> Validator {
        self.standard.func.clone()
    }

    pub fn any(&self) -> Validator {
        self.standard.any.clone()
    }

    pub fn node(&self) -> Validator {
        self.standard.node.clone()
    }

    pub fn element(&self) -> Validator {
        self.standard.element.clone()
    }

    /// Record with the given fields. Extra fields on the value are allowed.
    pub fn shape<K, I>(&self, fields: I) -> Validator
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Validator)>,
    {
        let fields: BTreeMap<String, Validator> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let checked = Arc::new(fields.clone());

        let validator = Validator::chainable(Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
            let value = props.get(prop).unwrap_or(&Value::Null);
            let Value::Object(inner) = value else {
                return Err(invalid(value, prop, owner, location, "`object`".to_string()));
            };
            for (key, child) in checked.iter() {
                child
                    .validate(inner, key, owner, location)
                    .map_err(|e| e.within_field(prop))?;
            }
            Ok(())
        }));

        self.record_constructed(Kind::Shape, &validator, vec![ConstructionArg::Record(fields)]);
        validator
    }

    /// List whose items all satisfy `item`.
    pub fn array_of(&self, item: Validator) -> Validator {
        let checked = item.clone();
        let validator = Validator::chainable(Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
            let value = props.get(prop).unwrap_or(&Value::Null);
            let Value::Array(items) = value else {
                return Err(invalid(value, prop, owner, location, "an array".to_string()));
            };
            for (index, entry) in items.iter().enumerate() {
                let key = index.to_string();
                let holder = single_field(&key, entry.clone());
                checked
                    .validate(&holder, &key, owner, location)
                    .map_err(|e| e.within_item(prop, index))?;
            }
            Ok(())
        }));

        self.record_constructed(Kind::ArrayOf, &validator, vec![ConstructionArg::Validator(item)]);
        validator
    }

    /// Record with arbitrary keys whose values all satisfy `value`.
    pub fn object_of(&self, value: Validator) -> Validator {
        let checked = value.clone();
        let validator = Validator::chainable(Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
            let value = props.get(prop).unwrap_or(&Value::Null);
            let Value::Object(entries) = value else {
                return Err(invalid(value, prop, owner, location, "an object".to_string()));
            };
            for key in entries.keys() {
                checked
                    .validate(entries, key, owner, location)
                    .map_err(|e| e.within_field(prop))?;
            }
            Ok(())
        }));

        self.record_constructed(Kind::ObjectOf, &validator, vec![ConstructionArg::Validator(value)]);
        validator
    }

    /// Instance marker of the given class.
    pub fn instance_of(&self, class: impl Into<ClassRef>) -> Validator {
        let class = class.into();
        let expected = class.clone();
        let validator = Validator::chainable(Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
            let value = props.get(prop).unwrap_or(&Value::Null);
            if instance_class(value) == Some(expected.name()) {
                Ok(())
            } else {
                Err(invalid(value, prop, owner, location, format!("instance of `{expected}`")))
            }
        }));

        self.record_constructed(Kind::InstanceOf, &validator, vec![ConstructionArg::Class(class)]);
        validator
    }

    /// One of a fixed list of literal values.
    pub fn one_of(&self, choices: Vec<Value>) -> Validator {
        let allowed = Arc::new(choices.clone());
        let validator = Validator::chainable(Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
            let value = props.get(prop).unwrap_or(&Value::Null);
            if allowed.contains(value) {
                Ok(())
            } else {
                let expected = format!("one of {}", Value::Array(allowed.as_ref().clone()));
                Err(invalid(value, prop, owner, location, expected))
            }
        }));

        self.record_constructed(Kind::OneOf, &validator, vec![ConstructionArg::Literals(choices)]);
        validator
    }

    /// Accepted by at least one of `candidates`.
    pub fn one_of_type(&self, candidates: Vec<Validator>) -> Validator {
        let checked = Arc::new(candidates.clone());
        let validator = Validator::chainable(Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
            if checked
                .iter()
                .any(|candidate| candidate.validate(props, prop, owner, location).is_ok())
            {
                return Ok(());
            }
            let value = props.get(prop).unwrap_or(&Value::Null);
            Err(invalid(value, prop, owner, location, "one of the accepted types".to_string()))
        }));

        self.record_constructed(Kind::OneOfType, &validator, vec![ConstructionArg::List(candidates)]);
        validator
    }

    /// Record metadata for every leaf and switch constructors into recording
    /// mode. Returns false when the library was already instrumented.
    pub fn instrument(&self) -> bool {
        if self
            .instrumented
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Validator library already instrumented");
            return false;
        }

        for (kind, validator) in self.leaves() {
            self.record_leaf(&kind, validator);
        }

        info!(
            "Instrumented validator library ({} metadata entries)",
            self.metadata.len()
        );
        true
    }

    pub fn is_instrumented(&self) -> bool {
        self.instrumented.load(Ordering::Acquire)
    }

    /// Metadata recorded for a validator, if any.
    pub fn metadata(&self, validator: &Validator) -> Option<Metadata> {
        self.metadata.get(validator.id())
    }

    pub fn metadata_table(&self) -> &MetadataTable {
        &self.metadata
    }

    fn record_leaf(&self, kind: &Kind, validator: &Validator) {
        self.metadata.attach(
            validator.id(),
            Metadata {
                kind: kind.clone(),
                required: false,
                args: None,
            },
        );
        self.metadata.attach(
            validator.is_required().id(),
            Metadata {
                kind: kind.clone(),
                required: true,
                args: None,
            },
        );
    }

    fn record_constructed(&self, kind: Kind, validator: &Validator, args: Vec<ConstructionArg>) {
        if !self.is_instrumented() {
            return;
        }
        self.metadata.attach(
            validator.is_required().id(),
            Metadata {
                kind: kind.clone(),
                required: true,
                args: Some(args.clone()),
            },
        );
        self.metadata.attach(
            validator.id(),
            Metadata {
                kind,
                required: false,
                args: Some(args),
            },
        );
    }
}

impl Default for ValidatorLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn leaf<F>(expected: &str, accepts: F) -> Validator
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Validator::chainable(type_check(format!("`{expected}`"), accepts))
}

fn type_check<F>(expected: String, accepts: F) -> Arc<CheckFn>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(move |props: &Props, prop: &str, owner: &str, location| {
        let value = props.get(prop).unwrap_or(&Value::Null);
        if accepts(value) {
            Ok(())
        } else {
            Err(invalid(value, prop, owner, location, expected.clone()))
        }
    })
}

fn invalid(value: &Value, prop: &str, owner: &str, location: Location, expected: String) -> PropError {
    PropError::Invalid {
        location,
        prop: prop.to_string(),
        owner: owner.to_string(),
        actual: type_name(value).to_string(),
        expected,
    }
}
