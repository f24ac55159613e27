//! A study exposed as one addressable JSON document.

use serde_json::Value;
use st_common::{Address, Depth, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::descriptor::StudyConfig;
use crate::schema::{SchemaDocument, SchemaNode, SchemaValidator};
use crate::tree::{layout, Bindings, BuildScope, FolderNode, Node, TreeNode};
use crate::url::PathResolver;

#[derive(Debug, Clone)]
pub struct Study {
    root: Node,
    schema: Option<SchemaNode>,
}

impl Study {
    /// Introspect the study directory and expose it through the layout table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(StudyConfig::from_path(path)?))
    }

    pub fn new(config: StudyConfig) -> Self {
        Self {
            root: Self::table_root(config, None),
            schema: None,
        }
    }

    /// Layout table first, schema properties the table lacks as fallback.
    /// The schema is also used by [`Study::validate`].
    pub fn with_schema(config: StudyConfig, schema: Arc<SchemaDocument>) -> Result<Self> {
        let schema = SchemaNode::root(schema)?;
        Ok(Self {
            root: Self::table_root(config, Some(schema.clone())),
            schema: Some(schema),
        })
    }

    /// Resolve the whole tree from the schema alone.
    pub fn from_schema(config: StudyConfig, schema: Arc<SchemaDocument>) -> Result<Self> {
        let schema = SchemaNode::root(schema)?;
        debug!(study = %config.root_path().display(), "schema-driven study");
        Ok(Self {
            root: Node::Folder(FolderNode::generic(config, Address::root(), schema.clone())),
            schema: Some(schema),
        })
    }

    fn table_root(config: StudyConfig, schema: Option<SchemaNode>) -> Node {
        Node::Folder(FolderNode::table(
            config,
            Address::root(),
            &layout::STUDY,
            Bindings::default(),
            schema,
        ))
    }

    pub fn config(&self) -> &StudyConfig {
        self.root.config()
    }

    pub fn get(&self, address: &Address, depth: Depth) -> Result<Value> {
        PathResolver::get(&self.root, address, depth)
    }

    pub fn get_in(&self, scope: &mut BuildScope, address: &Address, depth: Depth) -> Result<Value> {
        PathResolver::get_in(scope, &self.root, address, depth)
    }

    pub fn save(&self, value: Value, address: &Address) -> Result<()> {
        PathResolver::save(&self.root, value, address)
    }

    /// Check `value` against the schema position of `address`. Passes
    /// when no schema is attached.
    pub fn validate(&self, value: &Value, address: &Address) -> Result<()> {
        match &self.schema {
            Some(schema) => SchemaValidator::validate_at(schema, address, value),
            None => Ok(()),
        }
    }
}
