use crate::domain::{FixtureSet, FixtureStore};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryFixtureStore {
    fixtures: Arc<RwLock<HashMap<String, FixtureSet>>>,
}

impl InMemoryFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(fixtures: HashMap<String, FixtureSet>) -> Self {
        Self {
            fixtures: Arc::new(RwLock::new(fixtures)),
        }
    }
}

#[async_trait]
impl FixtureStore for InMemoryFixtureStore {
    async fn load_fixtures(&self, key: &str) -> anyhow::Result<FixtureSet> {
        let fixtures = self.fixtures.read().await;
        Ok(fixtures.get(key).cloned().unwrap_or_default())
    }

    async fn save_fixtures(&self, key: &str, fixtures: &FixtureSet) -> anyhow::Result<()> {
        let mut stored = self.fixtures.write().await;
        stored.insert(key.to_string(), fixtures.clone());
        Ok(())
    }
}

/// One file per component: `<key>.json` (written) or `<key>.yaml` / `<key>.yml`
/// (read when no json file exists).
#[derive(Debug, Clone)]
pub struct FileFixtureStore {
    dir: PathBuf,
}

impl FileFixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, ext))
    }
}

#[async_trait]
impl FixtureStore for FileFixtureStore {
    async fn load_fixtures(&self, key: &str) -> anyhow::Result<FixtureSet> {
        for ext in ["json", "yaml", "yml"] {
            let path = self.path_for(key, ext);
            if !tokio::fs::try_exists(&path).await? {
                continue;
            }
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read fixtures {}", path.display()))?;
            let fixtures: FixtureSet = if ext == "json" {
                serde_json::from_str(&content)?
            } else {
                serde_yaml::from_str(&content)?
            };
            tracing::debug!("Loaded {} fixtures for {} from {}", fixtures.len(), key, path.display());
            return Ok(fixtures);
        }
        Ok(FixtureSet::default())
    }

    async fn save_fixtures(&self, key: &str, fixtures: &FixtureSet) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key, "json");
        let content = serde_json::to_string_pretty(fixtures)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write fixtures {}", path.display()))?;
        tracing::info!("Saved {} fixtures for {} to {}", fixtures.len(), key, path.display());
        Ok(())
    }
}
