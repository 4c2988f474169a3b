use thiserror::Error;

use crate::config::{GenerationSettings, SandboxSettings, Settings};
use crate::domain::kind::Kind;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown kind in {field}: {kind}")]
    UnknownKind { field: String, kind: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_sandbox(&settings.sandbox) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_generation(&settings.generation) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_sandbox(sandbox: &SandboxSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if sandbox.components_dir.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("sandbox.components_dir".to_string()));
        }

        if sandbox.fixtures_dir.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("sandbox.fixtures_dir".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_generation(generation: &GenerationSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::check_probability("generation.null_probability", generation.null_probability, &mut errors);

        let mut kinds: Vec<_> = generation.null_probability_by_kind.iter().collect();
        kinds.sort_by(|a, b| a.0.cmp(b.0));
        for (name, p) in kinds {
            let field = format!("generation.null_probability_by_kind.{}", name);
            if Kind::builtin(name).is_none() {
                errors.push(ValidationError::UnknownKind {
                    field: "generation.null_probability_by_kind".to_string(),
                    kind: name.clone(),
                });
            }
            Self::check_probability(&field, *p, &mut errors);
        }

        if generation.min_items > generation.max_items {
            errors.push(ValidationError::InvalidValue {
                field: "generation.min_items".to_string(),
                reason: format!(
                    "min_items ({}) must not exceed max_items ({})",
                    generation.min_items, generation.max_items
                ),
            });
        }

        if generation.number_min > generation.number_max {
            errors.push(ValidationError::InvalidValue {
                field: "generation.number_min".to_string(),
                reason: format!(
                    "number_min ({}) must not exceed number_max ({})",
                    generation.number_min, generation.number_max
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_probability(field: &str, p: f64, errors: &mut Vec<ValidationError>) {
        if !(0.0..=1.0).contains(&p) {
            errors.push(ValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("{} is not a probability between 0 and 1", p),
            });
        }
    }
}
