//! Studies directory facade.
//!
//! Routes are `<study>/<address>`. Every call against one study holds that
//! study's lock, so concurrent writes to the same files are serialised.

use serde_json::Value;
use st_common::{Address, Depth, Error, Result, StudyName};
use st_config::{validate_settings, EngineSettings};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use crate::descriptor::StudyConfig;
use crate::fs_util;
use crate::schema::SchemaDocument;
use crate::study::Study;

pub struct StudyService {
    settings: EngineSettings,
    schema: Option<Arc<SchemaDocument>>,
    locks: Mutex<HashMap<StudyName, Arc<Mutex<()>>>>,
}

impl StudyService {
    /// Build the service from checked settings, loading the schema they name.
    pub fn new(settings: EngineSettings) -> Result<Self> {
        let checked = validate_settings(&settings);
        for warning in &checked.warnings {
            warn!(warning = %warning, "settings");
        }
        checked.into_result()?;

        let schema = match &settings.schema_path {
            Some(path) => Some(Arc::new(SchemaDocument::load(path)?)),
            None => None,
        };
        Ok(Self::with_schema(settings, schema))
    }

    pub fn with_schema(settings: EngineSettings, schema: Option<Arc<SchemaDocument>>) -> Self {
        Self {
            settings,
            schema,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Study directories with a valid name, sorted.
    pub fn list_studies(&self) -> Result<Vec<StudyName>> {
        Ok(fs_util::list_entries(&self.settings.studies_path)?
            .iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| StudyName::parse(&fs_util::entry_name(p)))
            .collect())
    }

    pub fn exists(&self, name: &str) -> bool {
        StudyName::parse(name).is_some_and(|name| self.study_path(&name).is_dir())
    }

    pub fn get(&self, route: &str, depth: Option<Depth>) -> Result<Value> {
        let (name, address) = parse_route(route)?;
        let depth = depth.unwrap_or_else(|| self.settings.default_depth());

        let lock = self.lock(&name)?;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let study = self.open(&name)?;
        let value = study.get(&address, depth)?;

        if self.settings.validate_reads && depth == Depth::Unbounded {
            if let Err(error) = study.validate(&value, &address) {
                warn!(study = %name, address = %address, error = %error, "read does not match schema");
            }
        }
        Ok(value)
    }

    pub fn save(&self, route: &str, value: Value) -> Result<()> {
        let (name, address) = parse_route(route)?;

        let lock = self.lock(&name)?;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let study = self.open(&name)?;
        if self.settings.validate_writes {
            study.validate(&value, &address)?;
        }
        study.save(value, &address)?;
        info!(study = %name, address = %address, "study updated");
        Ok(())
    }

    fn study_path(&self, name: &StudyName) -> PathBuf {
        self.settings.studies_path.join(name.as_str())
    }

    fn open(&self, name: &StudyName) -> Result<Study> {
        let path = self.study_path(name);
        if !path.is_dir() {
            return Err(Error::StudyNotFound(name.to_string()));
        }
        let mut config = StudyConfig::from_path(path)?;
        if let Some(resources) = &self.settings.resources_path {
            config = config.with_resources(resources);
        }
        match &self.schema {
            Some(schema) => Study::with_schema(config, Arc::clone(schema)),
            None => Ok(Study::new(config)),
        }
    }

    /// Lock of an existing study. Unknown names never enter the lock map.
    fn lock(&self, name: &StudyName) -> Result<Arc<Mutex<()>>> {
        if !self.study_path(name).is_dir() {
            return Err(Error::StudyNotFound(name.to_string()));
        }
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(locks.entry(name.clone()).or_default()))
    }
}

/// Split `<study>/<address>`.
fn parse_route(route: &str) -> Result<(StudyName, Address)> {
    let address = Address::parse(route);
    let Some((first, rest)) = address.split_first() else {
        return Err(Error::InvalidStudyName(route.to_string()));
    };
    let name = StudyName::parse(first).ok_or_else(|| Error::InvalidStudyName(first.to_string()))?;
    Ok((name, Address::from_segments(rest.iter().cloned())))
}
