//! Matrix-backed leaf.

use serde_json::Value;
use st_common::{Depth, Result};
use tracing::debug;

use super::{not_consumed, BuildScope, TreeNode};
use crate::codec::{MatrixReader, MatrixWriter};
use crate::descriptor::StudyConfig;

#[derive(Debug, Clone)]
pub struct MatrixNode {
    config: StudyConfig,
}

impl MatrixNode {
    pub fn new(config: StudyConfig) -> Self {
        Self { config }
    }
}

impl TreeNode for MatrixNode {
    fn get(&self, _scope: &mut BuildScope, address: &[String], _depth: Depth) -> Result<Value> {
        if !address.is_empty() {
            return Err(not_consumed(&self.config, address));
        }
        MatrixReader::read(self.config.path())
    }

    fn save(&self, _scope: &mut BuildScope, value: Value, address: &[String]) -> Result<()> {
        if !address.is_empty() {
            return Err(not_consumed(&self.config, address));
        }
        MatrixWriter::write(self.config.path(), &value)?;
        debug!(path = %self.config.path().display(), "matrix written");
        Ok(())
    }

    fn validate(&self, value: &Value) -> Result<()> {
        MatrixWriter::check(value)
    }

    fn is_structured(&self) -> bool {
        false
    }

    fn config(&self) -> &StudyConfig {
        &self.config
    }
}
