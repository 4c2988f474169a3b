//! Sandbox session state: the component list, the selected component with
//! its inferred prop types, and the fixtures being edited.
//!
//! Loads are applied as events keyed by the component they were started for.
//! A load that arrives after the selection moved to a different component is
//! dropped.

use crate::adapters::editor::{self, FieldEdit, FieldView};
use crate::domain::cursor::Cursor;
use crate::domain::error::{CursorError, SandboxError};
use crate::domain::{Component, ComponentRegistry, ComponentSummary, FixtureSet, FixtureStore};
use crate::generation::{check_prop, generate_value_for_type, GenerationConfig};
use crate::inference::{infer_types_for_component, type_at, InferredType};
use crate::prop_types::{PropError, ValidatorLibrary};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub type PropTypes = BTreeMap<String, InferredType>;

#[derive(Default)]
struct SessionState {
    component_list: Option<Vec<ComponentSummary>>,
    selected: Option<Selection>,
}

struct Selection {
    key: String,
    component: Option<Arc<Component>>,
    types: Option<Arc<PropTypes>>,
    fixtures: Option<FixtureSet>,
}

impl Selection {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            component: None,
            types: None,
            fixtures: None,
        }
    }

    fn fixtures_mut(&mut self) -> Result<&mut FixtureSet, SandboxError> {
        let key = &self.key;
        self.fixtures
            .as_mut()
            .ok_or_else(|| SandboxError::FixturesNotLoaded(key.clone()))
    }

    fn types(&self) -> Result<&Arc<PropTypes>, SandboxError> {
        self.types
            .as_ref()
            .ok_or_else(|| SandboxError::ComponentNotFound(self.key.clone()))
    }
}

#[derive(Clone)]
pub struct SandboxSession {
    library: Arc<ValidatorLibrary>,
    registry: Arc<dyn ComponentRegistry>,
    store: Arc<dyn FixtureStore>,
    state: Arc<RwLock<SessionState>>,
}

impl SandboxSession {
    pub fn new(
        library: Arc<ValidatorLibrary>,
        registry: Arc<dyn ComponentRegistry>,
        store: Arc<dyn FixtureStore>,
    ) -> Self {
        Self {
            library,
            registry,
            store,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn library(&self) -> &Arc<ValidatorLibrary> {
        &self.library
    }

    pub async fn load_component_list(&self) -> anyhow::Result<Vec<ComponentSummary>> {
        self.state.write().await.component_list = None;

        let components = self.registry.list_components().await?;
        info!("Loaded {} components", components.len());

        self.state.write().await.component_list = Some(components.clone());
        Ok(components)
    }

    /// The last loaded component list; `None` while loading or before the
    /// first load.
    pub async fn component_list(&self) -> Option<Vec<ComponentSummary>> {
        self.state.read().await.component_list.clone()
    }

    /// Select a component and load its definition and fixtures.
    pub async fn select_component(&self, key: &str) -> anyhow::Result<()> {
        self.state.write().await.selected = Some(Selection::new(key));
        info!("Selected component {}", key);

        let component = self
            .registry
            .get_component(key)
            .await?
            .ok_or_else(|| SandboxError::ComponentNotFound(key.to_string()))?;
        self.component_did_load(key, component).await;

        let fixtures = self.store.load_fixtures(key).await?;
        self.fixtures_did_load(key, fixtures).await;
        Ok(())
    }

    /// Apply a loaded component definition. Ignored unless `key` is still
    /// selected. Returns whether it was applied.
    pub async fn component_did_load(&self, key: &str, component: Arc<Component>) -> bool {
        let types = infer_types_for_component(&self.library, &component);
        let mut state = self.state.write().await;
        match state.selected.as_mut() {
            Some(selection) if selection.key == key => {
                selection.component = Some(component);
                selection.types = Some(Arc::new(types));
                true
            }
            _ => {
                debug!("Ignoring component load for {}: no longer selected", key);
                false
            }
        }
    }

    /// Apply loaded fixtures. Ignored unless `key` is still selected.
    /// Returns whether they were applied.
    pub async fn fixtures_did_load(&self, key: &str, fixtures: FixtureSet) -> bool {
        let mut state = self.state.write().await;
        match state.selected.as_mut() {
            Some(selection) if selection.key == key => {
                info!("Loaded {} fixtures for {}", fixtures.len(), key);
                selection.fixtures = Some(fixtures);
                true
            }
            _ => {
                debug!("Ignoring fixtures load for {}: no longer selected", key);
                false
            }
        }
    }

    pub async fn selected_key(&self) -> Option<String> {
        let state = self.state.read().await;
        state.selected.as_ref().map(|s| s.key.clone())
    }

    pub async fn component(&self) -> Option<Arc<Component>> {
        let state = self.state.read().await;
        state.selected.as_ref().and_then(|s| s.component.clone())
    }

    /// Inferred prop types of the selected component, computed once per
    /// selection.
    pub async fn inferred_types(&self) -> Option<Arc<PropTypes>> {
        let state = self.state.read().await;
        state.selected.as_ref().and_then(|s| s.types.clone())
    }

    pub async fn fixtures(&self) -> Option<FixtureSet> {
        let state = self.state.read().await;
        state.selected.as_ref().and_then(|s| s.fixtures.clone())
    }

    /// Write `value` into the fixtures. The first cursor segment is the
    /// instance index; the rest addresses a value inside that instance.
    pub async fn update_fixture(&self, cursor: &Cursor, value: Value) -> Result<(), SandboxError> {
        let mut state = self.state.write().await;
        let selection = state.selected.as_mut().ok_or(SandboxError::NoComponentSelected)?;
        let fixtures = selection.fixtures_mut()?;

        let (index, rest) = split_instance(cursor)?;
        let len = fixtures.instances.len();
        let instance = fixtures
            .instances
            .get_mut(index)
            .ok_or(SandboxError::InstanceOutOfRange { index, len })?;

        rest.set(instance, value)?;
        Ok(())
    }

    /// Apply a form edit. `cursor` is a [`FieldView`] cursor: the instance
    /// index followed by the prop path.
    pub async fn apply_edit(
        &self,
        cursor: &Cursor,
        edit: FieldEdit,
        config: &GenerationConfig,
    ) -> Result<(), SandboxError> {
        let (instance, rest) = split_instance(cursor)?;
        let mut state = self.state.write().await;
        let selection = state.selected.as_mut().ok_or(SandboxError::NoComponentSelected)?;
        let types = Arc::clone(selection.types()?);
        let t = type_at(&types, &rest).ok_or_else(|| CursorError::Missing(cursor.to_string()))?;

        let fixtures = selection.fixtures_mut()?;
        let len = fixtures.instances.len();
        let props = fixtures
            .instances
            .get_mut(instance)
            .ok_or(SandboxError::InstanceOutOfRange { index: instance, len })?;

        editor::apply_edit(props, &rest, t, edit, config)?;
        Ok(())
    }

    /// Append a generated instance and return its index.
    pub async fn add_fixture(&self, config: &GenerationConfig) -> Result<usize, SandboxError> {
        let mut state = self.state.write().await;
        let selection = state.selected.as_mut().ok_or(SandboxError::NoComponentSelected)?;
        let types = Arc::clone(selection.types()?);

        let props: Map<String, Value> = types
            .iter()
            .map(|(name, t)| {
                let value = generate_value_for_type(t, &Cursor::root().child(name.as_str()), config);
                (name.clone(), value)
            })
            .collect();

        let fixtures = selection.fixtures_mut()?;
        fixtures.instances.push(Value::Object(props));
        Ok(fixtures.instances.len() - 1)
    }

    /// Form views for one instance; cursors start with the instance index.
    pub async fn form(&self, instance: usize) -> Result<Vec<FieldView>, SandboxError> {
        let state = self.state.read().await;
        let selection = state.selected.as_ref().ok_or(SandboxError::NoComponentSelected)?;
        let types = selection.types()?;
        let props = instance_props(selection, instance)?;
        Ok(editor::form_for(types, props, &Cursor::root().child(instance)))
    }

    /// Validation errors for every prop of one instance.
    pub async fn invalid_props(&self, instance: usize) -> Result<Vec<PropError>, SandboxError> {
        let state = self.state.read().await;
        let selection = state.selected.as_ref().ok_or(SandboxError::NoComponentSelected)?;
        let types = selection.types()?;
        let props = instance_props(selection, instance)?;

        Ok(types
            .iter()
            .filter_map(|(name, t)| {
                let value = props.get(name).unwrap_or(&Value::Null);
                check_prop(value, t, name, &selection.key).err()
            })
            .collect())
    }

    /// Persist the selected component's fixtures.
    pub async fn save(&self) -> anyhow::Result<()> {
        let (key, fixtures) = {
            let state = self.state.read().await;
            let selection = state.selected.as_ref().ok_or(SandboxError::NoComponentSelected)?;
            let fixtures = selection
                .fixtures
                .clone()
                .ok_or_else(|| SandboxError::FixturesNotLoaded(selection.key.clone()))?;
            (selection.key.clone(), fixtures)
        };
        self.store.save_fixtures(&key, &fixtures).await
    }
}

/// Split a fixtures cursor into the instance index and the path inside it.
fn split_instance(cursor: &Cursor) -> Result<(usize, Cursor), SandboxError> {
    let (head, rest) = cursor.split_first().ok_or(CursorError::Root)?;
    let index = head.as_index().ok_or_else(|| CursorError::TypeMismatch {
        segment: head.to_string(),
        found: "array",
    })?;
    Ok((index, rest))
}

fn instance_props(selection: &Selection, index: usize) -> Result<&Value, SandboxError> {
    let fixtures = selection
        .fixtures
        .as_ref()
        .ok_or_else(|| SandboxError::FixturesNotLoaded(selection.key.clone()))?;
    fixtures
        .instances
        .get(index)
        .ok_or(SandboxError::InstanceOutOfRange {
            index,
            len: fixtures.instances.len(),
        })
}
