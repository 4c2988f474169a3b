use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod validator;

use crate::cli::Cli;
use crate::generation::{static_config, GenerationConfig, RandomPolicy};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub sandbox: SandboxSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    /// Directory relative paths are resolved against (the config file's directory)
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxSettings {
    /// Directory of component declarations (json, yaml or toml)
    #[serde(default = "default_components_dir")]
    pub components_dir: PathBuf,
    /// Directory fixture files are read from and written to
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            components_dir: default_components_dir(),
            fixtures_dir: default_fixtures_dir(),
        }
    }
}

fn default_components_dir() -> PathBuf {
    PathBuf::from("components")
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Minimal deterministic values
    #[default]
    Static,
    /// Random plausible values
    Random,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub policy: PolicyKind,
    /// Seed for the random policy; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_null_probability")]
    pub null_probability: f64,
    /// Per-kind override of `null_probability`, keyed by kind name
    #[serde(default)]
    pub null_probability_by_kind: HashMap<String, f64>,
    #[serde(default = "default_min_items")]
    pub min_items: usize,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub number_min: i64,
    #[serde(default = "default_number_max")]
    pub number_max: i64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            seed: None,
            null_probability: default_null_probability(),
            null_probability_by_kind: HashMap::new(),
            min_items: default_min_items(),
            max_items: default_max_items(),
            number_min: 0,
            number_max: default_number_max(),
        }
    }
}

fn default_null_probability() -> f64 {
    0.25
}

fn default_min_items() -> usize {
    1
}

fn default_max_items() -> usize {
    4
}

fn default_number_max() -> i64 {
    100
}

impl GenerationSettings {
    /// Generation config for the configured policy.
    pub fn generation_config(&self) -> GenerationConfig {
        match self.policy {
            PolicyKind::Static => static_config(),
            PolicyKind::Random => RandomPolicy::from_settings(self).config(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let root = cli
            .config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let s = Self::builder(cli.config.clone())?;
        let mut settings: Settings = s.try_deserialize()?;
        settings.root = root.to_path_buf();

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let root = root.as_ref();
        let config_path = root.join("eidos");

        let s = Self::builder(config_path)?;
        let mut settings: Settings = s.try_deserialize()?;
        settings.root = root.to_path_buf();

        settings.validate()?;
        Ok(settings)
    }

    fn builder(config_path: PathBuf) -> Result<Config, anyhow::Error> {
        Ok(Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("sandbox.components_dir", "components")?
            .set_default("sandbox.fixtures_dir", "fixtures")?
            .set_default("generation.policy", "static")?
            .build()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.components_dir {
            self.sandbox.components_dir = dir.clone();
        }
        if let Some(dir) = &cli.fixtures_dir {
            self.sandbox.fixtures_dir = dir.clone();
        }
        if let Some(policy) = cli.policy {
            self.generation.policy = policy;
        }
        if let Some(seed) = cli.seed {
            self.generation.seed = Some(seed);
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    pub fn components_path(&self) -> PathBuf {
        self.resolve(&self.sandbox.components_dir)
    }

    pub fn fixtures_path(&self) -> PathBuf {
        self.resolve(&self.sandbox.fixtures_dir)
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sandbox: SandboxSettings::default(),
            generation: GenerationSettings::default(),
            root: PathBuf::from("."),
        }
    }
}
