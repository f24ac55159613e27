//! Study tree engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed settings for the engine and its logging
//! - Settings resolution (explicit → env → config file → defaults)
//! - Semantic validation of resolved settings

pub mod resolve;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_settings, resolve_settings_with, ConfigPaths, SettingsOverrides};
pub use settings::{EngineSettings, LogFormat, LogSettings};
pub use validate::{validate_settings, ValidationError, ValidationResult};
