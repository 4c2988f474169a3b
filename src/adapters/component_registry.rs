use crate::domain::error::SandboxError;
use crate::domain::kind::Kind;
use crate::domain::{Component, ComponentRegistry, ComponentSummary};
use crate::prop_types::{Validator, ValidatorLibrary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

const REQUIRED_SUFFIX: &str = ".isRequired";

/// Declared type of one prop, as written in a component file.
///
/// Leaf kinds use the shorthand `"string"` / `"string.isRequired"`;
/// constructors use the full form `{ type: arrayOf, of: number }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropTypeDecl {
    Short(String),
    Full(FullDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullDecl {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    /// Item type of `arrayOf`, value type of `objectOf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of: Option<Box<PropTypeDecl>>,
    /// Field types of `shape`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, PropTypeDecl>>,
    /// Choices of `oneOf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// Candidates of `oneOfType`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<PropTypeDecl>>,
    /// Class of `instanceOf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl PropTypeDecl {
    /// Build the validator through the library's constructors. `prop` names
    /// the declaration in error messages.
    pub fn build(&self, library: &ValidatorLibrary, prop: &str) -> Result<Validator, SandboxError> {
        match self {
            PropTypeDecl::Short(text) => {
                let (name, required) = match text.strip_suffix(REQUIRED_SUFFIX) {
                    Some(name) => (name, true),
                    None => (text.as_str(), false),
                };
                let kind = Kind::builtin(name).unwrap_or_else(|| Kind::Extension(name.to_string()));
                let validator = library.leaf(&kind).ok_or_else(|| invalid(prop, format!(
                    "`{}` is not a leaf type; use the full form for constructed types",
                    name
                )))?;
                Ok(flavor(validator, required))
            }
            PropTypeDecl::Full(decl) => decl.build(library, prop),
        }
    }
}

impl FullDecl {
    fn build(&self, library: &ValidatorLibrary, prop: &str) -> Result<Validator, SandboxError> {
        let kind = Kind::builtin(&self.kind).unwrap_or_else(|| Kind::Extension(self.kind.clone()));

        let validator = match kind {
            Kind::ArrayOf => library.array_of(self.inner(library, prop)?),
            Kind::ObjectOf => library.object_of(self.inner(library, prop)?),
            Kind::Shape => {
                let fields = self
                    .fields
                    .as_ref()
                    .ok_or_else(|| invalid(prop, "`shape` needs `fields`"))?
                    .iter()
                    .map(|(key, decl)| {
                        decl.build(library, &format!("{}.{}", prop, key))
                            .map(|v| (key.clone(), v))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                library.shape(fields)
            }
            Kind::OneOf => {
                let values = self
                    .values
                    .clone()
                    .ok_or_else(|| invalid(prop, "`oneOf` needs `values`"))?;
                library.one_of(values)
            }
            Kind::OneOfType => {
                let candidates = self
                    .types
                    .as_ref()
                    .ok_or_else(|| invalid(prop, "`oneOfType` needs `types`"))?
                    .iter()
                    .enumerate()
                    .map(|(i, decl)| decl.build(library, &format!("{}[{}]", prop, i)))
                    .collect::<Result<Vec<_>, _>>()?;
                library.one_of_type(candidates)
            }
            Kind::InstanceOf => {
                let class = self
                    .class
                    .clone()
                    .ok_or_else(|| invalid(prop, "`instanceOf` needs `class`"))?;
                library.instance_of(class)
            }
            leaf => library
                .leaf(&leaf)
                .ok_or_else(|| invalid(prop, format!("unknown type `{}`", self.kind)))?,
        };

        Ok(flavor(validator, self.required))
    }

    fn inner(&self, library: &ValidatorLibrary, prop: &str) -> Result<Validator, SandboxError> {
        self.of
            .as_ref()
            .ok_or_else(|| invalid(prop, format!("`{}` needs `of`", self.kind)))?
            .build(library, &format!("{}[]", prop))
    }
}

fn flavor(validator: Validator, required: bool) -> Validator {
    if required {
        validator.is_required()
    } else {
        validator
    }
}

fn invalid(prop: &str, reason: impl Into<String>) -> SandboxError {
    SandboxError::InvalidDeclaration {
        prop: prop.to_string(),
        reason: reason.into(),
    }
}

/// A component as written in a declaration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDecl {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub props: BTreeMap<String, PropTypeDecl>,
}

impl ComponentDecl {
    pub fn build(&self, library: &ValidatorLibrary) -> Result<Component, SandboxError> {
        let mut component = Component::new(self.name.clone());
        component.description = self.description.clone();
        for (prop, decl) in &self.props {
            let validator = decl.build(library, prop)?;
            component = component.prop(prop.clone(), validator);
        }
        Ok(component)
    }
}

/// Components kept in memory, registered in code or loaded from a directory
/// of declaration files.
#[derive(Clone)]
pub struct InMemoryComponentRegistry {
    library: Arc<ValidatorLibrary>,
    components: Arc<RwLock<BTreeMap<String, Arc<Component>>>>,
}

impl InMemoryComponentRegistry {
    pub fn new(library: Arc<ValidatorLibrary>) -> Self {
        Self {
            library,
            components: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn library(&self) -> &Arc<ValidatorLibrary> {
        &self.library
    }

    /// Register a component under its name, replacing any previous one.
    pub async fn register(&self, component: Component) {
        let mut components = self.components.write().await;
        components.insert(component.name.clone(), Arc::new(component));
    }

    /// Build a declaration through this registry's library and register it.
    pub async fn register_decl(&self, decl: &ComponentDecl) -> Result<(), SandboxError> {
        let component = decl.build(&self.library)?;
        self.register(component).await;
        Ok(())
    }

    /// Load every json, yaml or toml declaration in `path`. Files that do not
    /// parse or declare invalid props are skipped with a warning. Returns the
    /// number of components registered.
    pub async fn load_from_dir(&self, path: &Path) -> Result<usize, anyhow::Error> {
        let pattern = format!("{}/*", path.display());
        let mut loaded = 0;

        for entry in glob::glob(&pattern)? {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("Failed to read glob entry: {}", e);
                    continue;
                }
            };
            let Some(ext) = file.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !matches!(ext, "json" | "yaml" | "yml" | "toml") {
                continue;
            }

            let registered = match read_decl(&file, ext).await {
                Ok(decl) => self.register_decl(&decl).await.map(|()| decl.name).map_err(Into::into),
                Err(e) => Err(e),
            };

            match registered {
                Ok(name) => {
                    tracing::debug!("Loaded component {} from {}", name, file.display());
                    loaded += 1;
                }
                Err(e) => tracing::warn!("Skipping component file {}: {}", file.display(), e),
            }
        }

        tracing::info!("Loaded {} components from {}", loaded, path.display());
        Ok(loaded)
    }
}

async fn read_decl(file: &Path, ext: &str) -> Result<ComponentDecl, anyhow::Error> {
    let content = tokio::fs::read_to_string(file).await?;
    let decl = match ext {
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(decl)
}

#[async_trait]
impl ComponentRegistry for InMemoryComponentRegistry {
    async fn list_components(&self) -> anyhow::Result<Vec<ComponentSummary>> {
        let components = self.components.read().await;
        Ok(components.values().map(|c| ComponentSummary::from(c.as_ref())).collect())
    }

    async fn get_component(&self, key: &str) -> anyhow::Result<Option<Arc<Component>>> {
        let components = self.components.read().await;
        Ok(components.get(key).cloned())
    }
}
