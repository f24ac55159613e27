//! INI-backed leaf.
//!
//! Addressing below the file: `[]` is the whole document, `[section]` one
//! section, `[section, key]` one scalar. Writes merge into the current file
//! content and rewrite it whole.

use serde_json::{Map, Value};
use st_common::{Depth, Error, Result};
use tracing::{debug, info};

use super::{not_consumed, BuildScope, TreeNode};
use crate::codec::ini::{raw_to_json, IniReader, IniTypes, IniWriter};
use crate::descriptor::StudyConfig;

#[derive(Debug, Clone)]
pub struct IniFileNode {
    config: StudyConfig,
    types: IniTypes,
    allow_missing: bool,
}

impl IniFileNode {
    pub fn new(config: StudyConfig, types: IniTypes) -> Self {
        Self {
            config,
            types,
            allow_missing: false,
        }
    }

    /// Read an absent file as an empty document.
    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    fn read_typed(&self) -> Result<Map<String, Value>> {
        let path = self.config.path();
        if self.allow_missing && !path.exists() {
            debug!(path = %path.display(), "optional ini absent");
            return Ok(Map::new());
        }
        let raw = IniReader::read(path)?;
        debug!(path = %path.display(), sections = raw.len(), "ini decoded");
        self.types.decode(&raw, path)
    }

    /// Current content as strings; an absent file is empty.
    fn read_for_merge(&self) -> Result<Map<String, Value>> {
        let path = self.config.path();
        if !path.exists() {
            return Ok(Map::new());
        }
        Ok(raw_to_json(&IniReader::read(path)?))
    }

    fn unknown(&self, prefix: &[&String], segment: &str) -> Error {
        let mut address = self.config.relative_path();
        for part in prefix {
            address.push('/');
            address.push_str(part);
        }
        Error::UnknownAddressSegment {
            address,
            segment: segment.to_string(),
        }
    }

    fn write(&self, doc: &Map<String, Value>) -> Result<()> {
        IniWriter::write(self.config.path(), doc)?;
        info!(path = %self.config.path().display(), sections = doc.len(), "ini rewritten");
        Ok(())
    }
}

impl TreeNode for IniFileNode {
    fn get(&self, _scope: &mut BuildScope, address: &[String], depth: Depth) -> Result<Value> {
        if address.len() > 2 {
            return Err(not_consumed(&self.config, &address[2..]));
        }
        let doc = self.read_typed()?;

        match address {
            [] if depth.is_exhausted() => Ok(Value::Object(
                doc.keys()
                    .map(|section| (section.clone(), Value::Object(Map::new())))
                    .collect(),
            )),
            [] => Ok(Value::Object(doc)),
            [section] => doc
                .get(section)
                .cloned()
                .ok_or_else(|| self.unknown(&[], section)),
            [section, key] => doc
                .get(section)
                .ok_or_else(|| self.unknown(&[], section))?
                .get(key)
                .cloned()
                .ok_or_else(|| self.unknown(&[section], key)),
            _ => Err(not_consumed(&self.config, address)),
        }
    }

    fn save(&self, _scope: &mut BuildScope, value: Value, address: &[String]) -> Result<()> {
        match address {
            [] => {
                self.types.check_document(&value)?;
                match value {
                    Value::Object(doc) => self.write(&doc),
                    other => Err(Error::coercion("document", "object", other.to_string())),
                }
            }
            [section] => {
                self.types.check_section(section, &value)?;
                let mut doc = self.read_for_merge()?;
                doc.insert(section.clone(), value);
                self.write(&doc)
            }
            [section, key] => {
                self.types.check_scalar(section, key, &value)?;
                let mut doc = self.read_for_merge()?;
                let entry = doc
                    .entry(section.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(entries) = entry {
                    entries.insert(key.clone(), value);
                }
                self.write(&doc)
            }
            [_, _, rest @ ..] => Err(not_consumed(&self.config, rest)),
        }
    }

    fn validate(&self, value: &Value) -> Result<()> {
        self.types.check_document(value)
    }

    fn is_structured(&self) -> bool {
        true
    }

    fn config(&self) -> &StudyConfig {
        &self.config
    }
}
