//! # Eidos - prop-type inference and value generation
//!
//! Eidos reads the runtime validators attached to UI components, turns them
//! into inspectable type descriptions, and generates prop values that pass
//! those validators. A small sandbox session keeps fixtures per component and
//! exposes them to an editor.
//!
//! ## Features
//!
//! - **Instrumentation**: records how each validator was built, so opaque
//!   functions become readable types
//! - **Inference**: nine leaf kinds plus `arrayOf`, `objectOf`, `shape`,
//!   `instanceOf`, `oneOf` and `oneOfType`
//! - **Generation**: static or seeded random policies, overridable per kind
//! - **Sandbox**: component declarations on disk, fixtures in json or yaml
//!
//! ## Quick Start
//!
//! ```rust
//! use eidos::generation::{generate_value_for_type, static_config};
//! use eidos::domain::cursor::Cursor;
//! use eidos::inference::infer_type;
//! use eidos::prop_types::ValidatorLibrary;
//!
//! let library = ValidatorLibrary::new();
//! library.instrument();
//!
//! let validator = library.array_of(library.number().is_required()).is_required();
//! let t = infer_type(&library, &validator);
//! let value = generate_value_for_type(&t, &Cursor::root(), &static_config());
//! assert_eq!(value, serde_json::json!([0]));
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod generation;
pub mod inference;
pub mod prop_types;

use adapters::sandbox::SandboxSession;
use adapters::serialize::serialize_to_js;
use cli::Command;
use config::Settings;
use std::fmt::Write;

/// Run one CLI command against a session and render its output.
pub async fn execute(
    command: &Command,
    session: &SandboxSession,
    settings: &Settings,
) -> anyhow::Result<String> {
    let mut out = String::new();

    match command {
        Command::List => {
            for summary in session.load_component_list().await? {
                match &summary.description {
                    Some(description) => writeln!(out, "{}: {}", summary.name, description)?,
                    None => writeln!(out, "{}", summary.name)?,
                }
                if !summary.props.is_empty() {
                    writeln!(out, "  props: {}", summary.props.join(", "))?;
                }
            }
        }
        Command::Infer { component } => {
            session.select_component(component).await?;
            if let Some(types) = session.inferred_types().await {
                out = serde_json::to_string_pretty(&*types)?;
                out.push('\n');
            }
        }
        Command::Generate {
            component,
            count,
            save,
        } => {
            session.select_component(component).await?;
            let config = settings.generation.generation_config();
            for _ in 0..*count {
                let index = session.add_fixture(&config).await?;
                let fixtures = session.fixtures().await.unwrap_or_default();
                if let Some(instance) = fixtures.instances.get(index) {
                    writeln!(out, "// instance {}", index)?;
                    writeln!(out, "{}", serialize_to_js(instance))?;
                }
            }
            if *save {
                session.save().await?;
                tracing::info!("Saved {} new fixtures for {}", count, component);
            }
        }
        Command::Check { component } => {
            session.select_component(component).await?;
            let fixtures = session.fixtures().await.unwrap_or_default();
            if fixtures.is_empty() {
                writeln!(out, "{} has no fixtures", component)?;
            }
            for index in 0..fixtures.len() {
                let errors = session.invalid_props(index).await?;
                if errors.is_empty() {
                    writeln!(out, "instance {}: ok", index)?;
                } else {
                    writeln!(out, "instance {}:", index)?;
                    for error in errors {
                        writeln!(out, "  - {}", error)?;
                    }
                }
            }
        }
        Command::Show { component } => {
            session.select_component(component).await?;
            let fixtures = session.fixtures().await.unwrap_or_default();
            for (index, instance) in fixtures.instances.iter().enumerate() {
                writeln!(out, "// instance {}", index)?;
                writeln!(out, "{}", serialize_to_js(instance))?;
            }
        }
        Command::Form {
            component,
            instance,
        } => {
            session.select_component(component).await?;
            let form = session.form(*instance).await?;
            out = serde_json::to_string_pretty(&form)?;
            out.push('\n');
        }
    }

    Ok(out)
}
