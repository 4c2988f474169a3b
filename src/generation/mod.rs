//! Value generation and validation against inferred types.
//!
//! Generation is table driven: a [`GenerationConfig`] maps each [`Kind`] to a
//! generator function. Container generators never build child values
//! themselves; they call the `recurse` callback with the child type and the
//! extended cursor, so the same config (and the same policy decisions) apply at
//! every depth.
//!
//! Two policies ship with the crate: [`static_config`] produces the smallest
//! valid value for every required field, and [`RandomPolicy`] produces
//! plausible random data.

pub mod random_policy;
pub mod static_policy;

pub use random_policy::{Entropy, RandomPolicy};
pub use static_policy::{static_config, FirstChoice, OptionalIsNull};

use crate::domain::cursor::Cursor;
use crate::domain::kind::Kind;
use crate::domain::value::instance;
use crate::inference::{InferredType, TypeLeaf};
use crate::prop_types::ValidationResult;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Field name used when a bare value is checked against a type.
pub const PROBE_FIELD: &str = "value";

/// Callback a container generator uses to produce a child value.
pub type Recurse<'a> = dyn Fn(&InferredType, &Cursor) -> Value + 'a;

/// `(path, recurse, leaf, config) -> value`
pub type GeneratorFn =
    dyn Fn(&Cursor, &Recurse<'_>, &TypeLeaf, &GenerationConfig) -> Value + Send + Sync;

pub type GeneratorTable = HashMap<Kind, Arc<GeneratorFn>>;

/// Picks one of `len` options for the value at `path`.
pub trait Chooser: Send + Sync {
    /// `None` when there is nothing to choose from.
    fn choose(&self, path: &Cursor, len: usize) -> Option<usize>;
}

/// Decides whether an optional field is generated as `null`.
pub trait Nullability: Send + Sync {
    fn should_null(&self, path: &Cursor, leaf: &TypeLeaf) -> bool;
}

/// Box a closure as a generator.
pub fn generator<F>(f: F) -> Arc<GeneratorFn>
where
    F: Fn(&Cursor, &Recurse<'_>, &TypeLeaf, &GenerationConfig) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A generator that always produces `value`.
pub fn constant(value: Value) -> Arc<GeneratorFn> {
    generator(move |_, _, _, _| value.clone())
}

/// Generators for the constructed kinds. Leaf kinds come from a policy.
pub fn base_generators() -> GeneratorTable {
    let mut table = GeneratorTable::new();

    table.insert(
        Kind::ArrayOf,
        generator(|path, recurse, leaf, _| match leaf.element_type() {
            Some(item) => Value::Array(vec![recurse(item, &path.child(0))]),
            None => Value::Array(Vec::new()),
        }),
    );

    // Empty map until a policy decides otherwise.
    table.insert(Kind::ObjectOf, constant(Value::Object(Map::new())));

    table.insert(
        Kind::Shape,
        generator(|path, recurse, leaf, _| {
            let fields: Map<String, Value> = leaf
                .fields()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(key, field)| (key.clone(), recurse(field, &path.child(key.as_str()))))
                        .collect()
                })
                .unwrap_or_default();
            Value::Object(fields)
        }),
    );

    table.insert(
        Kind::InstanceOf,
        generator(|_, _, leaf, _| match leaf.class() {
            Some(class) => instance(class.name()),
            None => Value::Null,
        }),
    );

    table.insert(
        Kind::OneOf,
        generator(|path, _, leaf, config| {
            // A required field cannot hold a `null` literal.
            let choices: Vec<&Value> = leaf
                .choices()
                .unwrap_or_default()
                .iter()
                .filter(|choice| !(leaf.required && choice.is_null()))
                .collect();
            config
                .choose(path, choices.len())
                .and_then(|index| choices.get(index).map(|choice| (*choice).clone()))
                .unwrap_or(Value::Null)
        }),
    );

    // The union itself already decided to produce a value, so the chosen
    // member is generated as required.
    table.insert(
        Kind::OneOfType,
        generator(|path, recurse, leaf, config| {
            let candidates = leaf.candidates().unwrap_or_default();
            match config
                .choose(path, candidates.len())
                .and_then(|index| candidates.get(index))
            {
                Some(candidate) => recurse(&candidate.clone().into_required(), path),
                None => Value::Null,
            }
        }),
    );

    table
}

/// Strategy table plus the pluggable decisions generators rely on.
#[derive(Clone)]
pub struct GenerationConfig {
    generators: GeneratorTable,
    fallback: Arc<GeneratorFn>,
    nullability: Arc<dyn Nullability>,
    chooser: Arc<dyn Chooser>,
}

impl GenerationConfig {
    /// Base generators, first-choice chooser, optional fields null.
    pub fn new() -> Self {
        Self {
            generators: base_generators(),
            fallback: constant(Value::Null),
            nullability: Arc::new(OptionalIsNull),
            chooser: Arc::new(FirstChoice),
        }
    }

    pub fn with_generator(mut self, kind: Kind, generator: Arc<GeneratorFn>) -> Self {
        self.generators.insert(kind, generator);
        self
    }

    /// Shallow override: entries of `overrides` replace same-kind entries.
    pub fn merge(mut self, overrides: GeneratorTable) -> Self {
        self.generators.extend(overrides);
        self
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.chooser = chooser;
        self
    }

    pub fn with_nullability(mut self, nullability: Arc<dyn Nullability>) -> Self {
        self.nullability = nullability;
        self
    }

    /// Generator for `kind`, or the fallback when none is registered.
    pub fn generator(&self, kind: &Kind) -> &Arc<GeneratorFn> {
        self.generators.get(kind).unwrap_or_else(|| {
            debug!("No generator for kind `{}`, using fallback", kind);
            &self.fallback
        })
    }

    pub fn choose(&self, path: &Cursor, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        self.chooser.choose(path, len).filter(|index| *index < len)
    }

    pub fn should_null(&self, path: &Cursor, leaf: &TypeLeaf) -> bool {
        self.nullability.should_null(path, leaf)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.generators.keys().map(Kind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("GenerationConfig")
            .field("generators", &kinds)
            .finish_non_exhaustive()
    }
}

/// Generate a value of type `t` for the location `path`.
pub fn generate_value_for_type(t: &InferredType, path: &Cursor, config: &GenerationConfig) -> Value {
    let leaf = match t {
        InferredType::Leaf(leaf) => leaf,
        InferredType::Unknown(validator) => {
            debug!("Cannot generate a value for opaque validator {} at {}", validator.id(), path);
            return Value::Null;
        }
    };

    if !leaf.required && config.should_null(path, leaf) {
        return Value::Null;
    }

    let recurse = |inner: &InferredType, at: &Cursor| generate_value_for_type(inner, at, config);
    let generate = config.generator(&leaf.kind);
    generate(path, &recurse, leaf, config)
}

/// Whether `value` is accepted by the validator behind `t`.
pub fn value_satisfies_type(value: &Value, t: &InferredType) -> bool {
    explain(value, t).is_ok()
}

/// Check `value` against `t`, returning the validator's error.
///
/// A panic inside a custom validator is not caught.
pub fn explain(value: &Value, t: &InferredType) -> ValidationResult {
    check_prop(value, t, PROBE_FIELD, "sandbox")
}

/// Like [`explain`], reporting failures under the given prop and owner names.
pub fn check_prop(value: &Value, t: &InferredType, prop: &str, owner: &str) -> ValidationResult {
    t.validator().check_value(value, prop, owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::callback;
    use crate::inference::infer_type;
    use crate::prop_types::{PropError, Validator, ValidatorLibrary};
    use serde_json::json;

    fn library() -> ValidatorLibrary {
        let lib = ValidatorLibrary::new();
        lib.instrument();
        lib
    }

    struct NeverNull;

    impl Nullability for NeverNull {
        fn should_null(&self, _path: &Cursor, _leaf: &TypeLeaf) -> bool {
            false
        }
    }

    fn generate(lib: &ValidatorLibrary, v: &Validator) -> Value {
        generate_value_for_type(&infer_type(lib, v), &Cursor::root(), &static_config())
    }

    #[test]
    fn test_static_primitives() {
        let lib = library();
        assert_eq!(generate(&lib, &lib.string().is_required()), json!(""));
        assert_eq!(generate(&lib, &lib.number().is_required()), json!(0));
        assert_eq!(generate(&lib, &lib.bool().is_required()), json!(false));
        assert_eq!(generate(&lib, &lib.string()), Value::Null);
        assert_eq!(generate(&lib, &lib.func().is_required()), callback("noop"));
    }

    #[test]
    fn test_static_array_of_has_one_item() {
        let lib = library();
        let v = lib.array_of(lib.number().is_required()).is_required();
        assert_eq!(generate(&lib, &v), json!([0]));
    }

    #[test]
    fn test_static_shape() {
        let lib = library();
        let v = lib
            .shape([
                ("nullable", lib.string()),
                ("s", lib.string().is_required()),
                ("n", lib.number().is_required()),
            ])
            .is_required();
        assert_eq!(generate(&lib, &v), json!({ "nullable": null, "s": "", "n": 0 }));
    }

    #[test]
    fn test_one_of_picks_first_and_empty_is_null() {
        let lib = library();
        let v = lib.one_of(vec![json!("sm"), json!("lg")]).is_required();
        assert_eq!(generate(&lib, &v), json!("sm"));
        assert_eq!(generate(&lib, &lib.one_of(vec![]).is_required()), Value::Null);
        assert_eq!(generate(&lib, &lib.one_of_type(vec![]).is_required()), Value::Null);
    }

    #[test]
    fn test_required_one_of_skips_null_literal() {
        let lib = library();
        let required = infer_type(&lib, &lib.one_of(vec![Value::Null, json!("a")]).is_required());
        let value = generate_value_for_type(&required, &Cursor::root(), &static_config());
        assert_eq!(value, json!("a"));
        assert!(value_satisfies_type(&value, &required));

        let only_null = lib.one_of(vec![Value::Null]).is_required();
        assert_eq!(generate(&lib, &only_null), Value::Null);
    }

    #[test]
    fn test_optional_one_of_keeps_null_literal() {
        let lib = library();
        let optional = infer_type(&lib, &lib.one_of(vec![Value::Null, json!("a")]));
        let config = GenerationConfig::new().with_nullability(Arc::new(NeverNull));
        assert_eq!(generate_value_for_type(&optional, &Cursor::root(), &config), Value::Null);
    }

    #[test]
    fn test_one_of_type_generates_chosen_candidate_as_required() {
        let lib = library();
        let v = lib.one_of_type(vec![lib.number(), lib.string()]).is_required();
        assert_eq!(generate(&lib, &v), json!(0));
    }

    #[test]
    fn test_object_of_is_empty_unless_overridden() {
        let lib = library();
        let v = lib.object_of(lib.number()).is_required();
        assert_eq!(generate(&lib, &v), json!({}));

        let config = static_config().with_generator(
            Kind::ObjectOf,
            generator(|path, recurse, leaf, _| {
                let mut map = Map::new();
                if let Some(inner) = leaf.element_type() {
                    let inner = inner.clone().into_required();
                    map.insert("key".to_string(), recurse(&inner, &path.child("key")));
                }
                Value::Object(map)
            }),
        );
        let t = infer_type(&lib, &v);
        let value = generate_value_for_type(&t, &Cursor::root(), &config);
        assert_eq!(value, json!({ "key": 0 }));
        assert!(value_satisfies_type(&value, &t));
    }

    #[test]
    fn test_unknown_and_unregistered_kinds_are_null() {
        let mut lib = ValidatorLibrary::new();
        let custom = lib.define_leaf("even", |v| v.as_i64().is_some());
        lib.instrument();

        let t = infer_type(&lib, &custom.is_required());
        assert_eq!(generate_value_for_type(&t, &Cursor::root(), &static_config()), Value::Null);

        let opaque = Validator::custom(|_, _, _, _| Ok(()));
        assert_eq!(generate(&lib, &opaque), Value::Null);
    }

    #[test]
    fn test_recursion_extends_the_path() {
        let lib = library();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let config = static_config().with_generator(
            Kind::String,
            generator(move |path, _, _, _| {
                record.lock().unwrap().push(path.to_string());
                json!("x")
            }),
        );

        let v = lib
            .shape([("items", lib.array_of(lib.string().is_required()).is_required())])
            .is_required();
        let value = generate_value_for_type(&infer_type(&lib, &v), &Cursor::root(), &config);

        assert_eq!(value, json!({ "items": ["x"] }));
        assert_eq!(*seen.lock().unwrap(), vec!["items[0]".to_string()]);
    }

    #[test]
    fn test_value_satisfies_type() {
        let lib = library();
        let required = infer_type(&lib, &lib.string().is_required());
        let optional = infer_type(&lib, &lib.string());

        assert!(value_satisfies_type(&json!("a"), &required));
        assert!(!value_satisfies_type(&Value::Null, &required));
        assert!(value_satisfies_type(&Value::Null, &optional));
        assert!(!value_satisfies_type(&json!(1), &optional));
    }

    #[test]
    fn test_explain_uses_opaque_validator() {
        let lib = library();
        let opaque = Validator::custom(|props, prop, _, _| match props.get(prop) {
            Some(Value::String(s)) if s.starts_with('#') => Ok(()),
            _ => Err(PropError::Custom("expected a color".into())),
        });
        let t = infer_type(&lib, &opaque);

        assert!(value_satisfies_type(&json!("#fff"), &t));
        assert_eq!(
            explain(&json!("red"), &t),
            Err(PropError::Custom("expected a color".into()))
        );
    }

    #[test]
    #[should_panic(expected = "validator exploded")]
    fn test_panicking_validator_propagates() {
        let lib = library();
        let t = infer_type(&lib, &Validator::custom(|_, _, _, _| panic!("validator exploded")));
        value_satisfies_type(&json!(1), &t);
    }
}
