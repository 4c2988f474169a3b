use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// The record a validator inspects: field name to value.
pub type Props = Map<String, Value>;

/// Outcome of running a validator.
pub type ValidationResult = Result<(), PropError>;

/// Signature shared by every check: `(holder, field name, owner label, location)`.
pub type CheckFn = dyn Fn(&Props, &str, &str, Location) -> ValidationResult + Send + Sync;

/// Where the checked value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    #[default]
    Prop,
    Context,
    ChildContext,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::Prop => "prop",
            Location::Context => "context",
            Location::ChildContext => "child context",
        })
    }
}

/// A value that a validator rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropError {
    #[error("Required {location} `{prop}` was not specified in `{owner}`.")]
    Missing {
        location: Location,
        prop: String,
        owner: String,
    },

    #[error("Invalid {location} `{prop}` of type `{actual}` supplied to `{owner}`, expected {expected}.")]
    Invalid {
        location: Location,
        prop: String,
        owner: String,
        actual: String,
        expected: String,
    },

    #[error("{0}")]
    Custom(String),
}

impl PropError {
    /// Re-root the reported prop name under `parent` (`parent.prop`).
    pub fn within_field(self, parent: &str) -> Self {
        self.rename(|prop| format!("{parent}.{prop}"))
    }

    /// Re-root the reported prop name as an item of `parent` (`parent[i]`).
    pub fn within_item(self, parent: &str, index: usize) -> Self {
        self.rename(|_| format!("{parent}[{index}]"))
    }

    /// The prop name this error refers to, when it names one.
    pub fn prop(&self) -> Option<&str> {
        match self {
            PropError::Missing { prop, .. } | PropError::Invalid { prop, .. } => Some(prop),
            PropError::Custom(_) => None,
        }
    }

    fn rename(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            PropError::Missing {
                location,
                prop,
                owner,
            } => PropError::Missing {
                location,
                prop: f(&prop),
                owner,
            },
            PropError::Invalid {
                location,
                prop,
                owner,
                actual,
                expected,
            } => PropError::Invalid {
                location,
                prop: f(&prop),
                owner,
                actual,
                expected,
            },
            custom => custom,
        }
    }
}

/// Stable identity of a validator, used as the key of the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ValidatorId(u64);

impl ValidatorId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy)]
enum Flavor {
    /// Library validator with an optional and a required variant.
    Chainable { required: bool, partner: ValidatorId },
    /// Hand-written validator; the closure sees every value including null.
    Custom,
}

/// A prop validator.
///
/// Library validators come in two flavors that share one type check: the
/// optional flavor accepts a missing or `null` field, the required flavor
/// reports it. [`Validator::is_required`] moves from the first to the second.
#[derive(Clone)]
pub struct Validator {
    id: ValidatorId,
    flavor: Flavor,
    check: Arc<CheckFn>,
}

impl Validator {
    /// Optional flavor of a library validator. `check` only ever sees
    /// non-null values.
    pub(crate) fn chainable(check: Arc<CheckFn>) -> Self {
        Self {
            id: ValidatorId::next(),
            flavor: Flavor::Chainable {
                required: false,
                partner: ValidatorId::next(),
            },
            check,
        }
    }

    /// Wrap a hand-written validator. It carries no metadata and is opaque to
    /// type inference.
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&Props, &str, &str, Location) -> ValidationResult + Send + Sync + 'static,
    {
        Self {
            id: ValidatorId::next(),
            flavor: Flavor::Custom,
            check: Arc::new(check),
        }
    }

    pub fn id(&self) -> ValidatorId {
        self.id
    }

    /// The required variant. Returns the validator itself when it is
    /// already required or is a custom validator.
    pub fn is_required(&self) -> Validator {
        match self.flavor {
            Flavor::Chainable {
                required: false,
                partner,
            } => Validator {
                id: partner,
                flavor: Flavor::Chainable {
                    required: true,
                    partner: self.id,
                },
                check: Arc::clone(&self.check),
            },
            _ => self.clone(),
        }
    }

    /// Whether this is the required flavor of a library validator.
    pub fn requires_value(&self) -> bool {
        matches!(self.flavor, Flavor::Chainable { required: true, .. })
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.flavor, Flavor::Custom)
    }

    /// Check `props[prop_name]`.
    pub fn validate(
        &self,
        props: &Props,
        prop_name: &str,
        owner: &str,
        location: Location,
    ) -> ValidationResult {
        match self.flavor {
            Flavor::Custom => (self.check)(props, prop_name, owner, location),
            Flavor::Chainable { required, .. } => match props.get(prop_name) {
                None | Some(Value::Null) if required => Err(PropError::Missing {
                    location,
                    prop: prop_name.to_string(),
                    owner: owner.to_string(),
                }),
                None | Some(Value::Null) => Ok(()),
                Some(_) => (self.check)(props, prop_name, owner, location),
            },
        }
    }

    /// Check a bare value by placing it in a single-field holder.
    pub fn check_value(&self, value: &Value, prop_name: &str, owner: &str) -> ValidationResult {
        let holder = single_field(prop_name, value.clone());
        self.validate(&holder, prop_name, owner, Location::Prop)
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Validator {}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flavor = match self.flavor {
            Flavor::Chainable { required: true, .. } => "required",
            Flavor::Chainable { required: false, .. } => "optional",
            Flavor::Custom => "custom",
        };
        f.debug_struct("Validator")
            .field("id", &self.id)
            .field("flavor", &flavor)
            .finish()
    }
}

/// A holder containing exactly one field.
pub fn single_field(name: &str, value: Value) -> Props {
    let mut props = Props::new();
    props.insert(name.to_string(), value);
    props
}
