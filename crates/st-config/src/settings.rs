//! Engine settings types.
//!
//! These types match the `config.json` file accepted by [`crate::resolve`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use st_common::Depth;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineSettings {
    /// Directory holding one sub-directory per study.
    pub studies_path: PathBuf,

    /// JSON Schema describing the study document. Enables generic
    /// resolution and validation when present.
    pub schema_path: Option<PathBuf>,

    /// Default assets copied by raw-file writes that do not reference
    /// an existing study file.
    pub resources_path: Option<PathBuf>,

    /// Depth used when a request carries none. Negative means unbounded.
    pub default_depth: i64,

    /// Validate full reads against the schema and log violations.
    pub validate_reads: bool,

    /// Reject writes whose value violates the schema.
    pub validate_writes: bool,

    pub log: LogSettings,
}

impl EngineSettings {
    pub fn default_depth(&self) -> Depth {
        Depth::from_i64(self.default_depth)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            studies_path: PathBuf::from("studies"),
            schema_path: None,
            resources_path: None,
            default_depth: -1,
            validate_reads: true,
            validate_writes: true,
            log: LogSettings::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive (`info`, `st_core=debug,warn`, ...). `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// JSON Schema of the settings file.
pub fn settings_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(EngineSettings)).unwrap_or_default()
}
