//! Side-table of instrumentation metadata.
//!
//! Validators answer only "is this value valid?". The table records, per
//! validator id, what kind of validator it is, whether it is the required
//! flavor, and the arguments it was constructed from.

use crate::domain::kind::Kind;
use crate::prop_types::validator::{Validator, ValidatorId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Class referenced by an `instanceOf` validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassRef(String);

impl ClassRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An argument a validator constructor was called with.
#[derive(Debug, Clone)]
pub enum ConstructionArg {
    Validator(Validator),
    List(Vec<Validator>),
    Record(BTreeMap<String, Validator>),
    Literals(Vec<Value>),
    Class(ClassRef),
}

#[derive(Debug, Clone)]
pub struct Metadata {
    pub kind: Kind,
    pub required: bool,
    pub args: Option<Vec<ConstructionArg>>,
}

#[derive(Default)]
pub struct MetadataTable {
    entries: RwLock<HashMap<ValidatorId, Metadata>>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, id: ValidatorId, metadata: Metadata) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(id, metadata);
    }

    pub fn get(&self, id: ValidatorId) -> Option<Metadata> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).cloned()
    }

    pub fn contains(&self, id: ValidatorId) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind and required flag of every entry, ordered by id.
    pub fn snapshot(&self) -> BTreeMap<ValidatorId, (Kind, bool)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|(id, meta)| (*id, (meta.kind.clone(), meta.required)))
            .collect()
    }
}

impl fmt::Debug for MetadataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataTable")
            .field("entries", &self.len())
            .finish()
    }
}
