use crate::prop_types::Validator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod cursor;
pub mod error;
pub mod kind;
pub mod value;

/// A UI component as the sandbox sees it: a name and the validators for
/// each of its inputs.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub description: Option<String>,
    pub prop_types: BTreeMap<String, Validator>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            prop_types: BTreeMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.prop_types.insert(name.into(), validator);
        self
    }
}

/// Summary row for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub name: String,
    pub description: Option<String>,
    pub props: Vec<String>,
}

impl From<&Component> for ComponentSummary {
    fn from(component: &Component) -> Self {
        Self {
            name: component.name.clone(),
            description: component.description.clone(),
            props: component.prop_types.keys().cloned().collect(),
        }
    }
}

/// Stored prop instances for one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureSet {
    #[serde(default)]
    pub instances: Vec<Value>,
}

impl FixtureSet {
    pub fn new(instances: Vec<Value>) -> Self {
        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    async fn list_components(&self) -> anyhow::Result<Vec<ComponentSummary>>;
    async fn get_component(&self, key: &str) -> anyhow::Result<Option<Arc<Component>>>;
}

#[async_trait]
pub trait FixtureStore: Send + Sync {
    /// Fixtures for a component; an unknown key yields an empty set.
    async fn load_fixtures(&self, key: &str) -> anyhow::Result<FixtureSet>;
    async fn save_fixtures(&self, key: &str, fixtures: &FixtureSet) -> anyhow::Result<()>;
}
