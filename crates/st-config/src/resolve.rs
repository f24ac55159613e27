//! Settings resolution.
//!
//! Sources are layered, later ones winning:
//! 1. Built-in defaults
//! 2. Config file (explicit path, or `<config dir>/studytree/config.json` when present)
//! 3. Environment variables
//! 4. Explicit overrides supplied by the embedding service

use crate::settings::{EngineSettings, LogFormat};
use st_common::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_STUDIES_PATH: &str = "STUDYTREE_STUDIES_PATH";
pub const ENV_SCHEMA_PATH: &str = "STUDYTREE_SCHEMA_PATH";
pub const ENV_RESOURCES_PATH: &str = "STUDYTREE_RESOURCES_PATH";
pub const ENV_DEFAULT_DEPTH: &str = "STUDYTREE_DEFAULT_DEPTH";
pub const ENV_LOG: &str = "STUDYTREE_LOG";
pub const ENV_LOG_FORMAT: &str = "STUDYTREE_LOG_FORMAT";

const CONFIG_DIR_NAME: &str = "studytree";
const CONFIG_FILE_NAME: &str = "config.json";

/// Where to look for the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file. Must exist when set.
    pub config_file: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: Some(path.into()),
        }
    }

    /// Default config file location under the user config directory.
    pub fn default_file() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }
}

/// Values set directly by the caller; they beat every other source.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub studies_path: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
    pub resources_path: Option<PathBuf>,
    pub default_depth: Option<i64>,
}

/// Resolve settings against the process environment.
pub fn resolve_settings(
    paths: &ConfigPaths,
    overrides: &SettingsOverrides,
) -> Result<EngineSettings> {
    resolve_settings_with(paths, overrides, |key| std::env::var(key).ok())
}

/// Resolve settings with an injectable environment lookup.
pub fn resolve_settings_with<F>(
    paths: &ConfigPaths,
    overrides: &SettingsOverrides,
    env: F,
) -> Result<EngineSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match &paths.config_file {
        Some(path) => load_file(path)?,
        None => match ConfigPaths::default_file() {
            Some(path) if path.is_file() => load_file(&path)?,
            _ => EngineSettings::default(),
        },
    };

    apply_env(&mut settings, env)?;

    if let Some(path) = &overrides.studies_path {
        settings.studies_path = path.clone();
    }
    if let Some(path) = &overrides.schema_path {
        settings.schema_path = Some(path.clone());
    }
    if let Some(path) = &overrides.resources_path {
        settings.resources_path = Some(path.clone());
    }
    if let Some(depth) = overrides.default_depth {
        settings.default_depth = depth;
    }

    Ok(settings)
}

fn load_file(path: &Path) -> Result<EngineSettings> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

fn apply_env<F>(settings: &mut EngineSettings, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env(ENV_STUDIES_PATH) {
        settings.studies_path = PathBuf::from(v);
    }
    if let Some(v) = env(ENV_SCHEMA_PATH) {
        settings.schema_path = Some(PathBuf::from(v));
    }
    if let Some(v) = env(ENV_RESOURCES_PATH) {
        settings.resources_path = Some(PathBuf::from(v));
    }
    if let Some(v) = env(ENV_DEFAULT_DEPTH) {
        settings.default_depth = v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{ENV_DEFAULT_DEPTH} is not an integer: {v}")))?;
    }
    if let Some(v) = env(ENV_LOG) {
        settings.log.level = v;
    }
    if let Some(v) = env(ENV_LOG_FORMAT) {
        settings.log.format = v.parse::<LogFormat>().map_err(Error::Config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_then_env_then_override() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("config.json");
        fs::write(
            &file,
            r#"{"studies_path": "/from/file", "schema_path": "/file/schema.json", "default_depth": 2}"#,
        )
        .unwrap();

        let env = env_from(&[(ENV_SCHEMA_PATH, "/env/schema.json"), (ENV_LOG, "debug")]);
        let overrides = SettingsOverrides {
            default_depth: Some(5),
            ..Default::default()
        };

        let settings =
            resolve_settings_with(&ConfigPaths::with_file(&file), &overrides, env).unwrap();
        assert_eq!(settings.studies_path, PathBuf::from("/from/file"));
        assert_eq!(settings.schema_path, Some(PathBuf::from("/env/schema.json")));
        assert_eq!(settings.default_depth, 5);
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let paths = ConfigPaths::with_file(dir.path().join("absent.json"));
        let err = resolve_settings_with(&paths, &SettingsOverrides::default(), env_from(&[]))
            .unwrap_err();
        assert_eq!(err.code(), 60);
    }

    #[test]
    fn test_bad_env_depth_rejected() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("config.json");
        fs::write(&file, "{}").unwrap();
        let env = env_from(&[(ENV_DEFAULT_DEPTH, "deep")]);
        let err = resolve_settings_with(&ConfigPaths::with_file(&file), &Default::default(), env)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("config.json");
        fs::write(&file, "{ not json").unwrap();
        let err = resolve_settings_with(
            &ConfigPaths::with_file(&file),
            &Default::default(),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
