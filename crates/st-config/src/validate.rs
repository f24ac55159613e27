//! Semantic validation of resolved settings.

use crate::settings::EngineSettings;
use st_common::{Error, Result};
use std::fmt;

/// A single settings problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of settings validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into a single configuration error listing every problem.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::Config(joined))
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field,
            message: message.into(),
        });
    }
}

/// Check that resolved settings point at usable locations.
pub fn validate_settings(settings: &EngineSettings) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !settings.studies_path.is_dir() {
        result.error(
            "studies_path",
            format!("not a directory: {}", settings.studies_path.display()),
        );
    }

    match &settings.schema_path {
        Some(path) if !path.is_file() => {
            result.error("schema_path", format!("not a file: {}", path.display()));
        }
        None if settings.validate_reads || settings.validate_writes => {
            result
                .warnings
                .push("validation requested but no schema_path configured".to_string());
        }
        _ => {}
    }

    if let Some(path) = &settings.resources_path {
        if !path.is_dir() {
            result.error("resources_path", format!("not a directory: {}", path.display()));
        }
    }

    if settings.default_depth < -1 {
        result.error(
            "default_depth",
            format!("must be -1 or greater, got {}", settings.default_depth),
        );
    }

    if settings.log.level.trim().is_empty() {
        result.error("log.level", "empty filter directive");
    }

    result
}
