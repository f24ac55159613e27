//! Directory-backed composite.

use serde_json::{Map, Value};
use st_common::{Address, Depth, Error, Result};

use super::layout::{self, Bindings, TableShape};
use super::{factory, BuildScope, Children, TreeNode};
use crate::descriptor::StudyConfig;
use crate::schema::SchemaNode;

/// Where a folder's children come from.
#[derive(Debug, Clone, Copy)]
enum FolderShape {
    /// A static layout table.
    Table(&'static TableShape),
    /// The governing schema fragment.
    Schema,
}

#[derive(Debug, Clone)]
pub struct FolderNode {
    config: StudyConfig,
    address: Address,
    shape: FolderShape,
    schema: Option<SchemaNode>,
    bindings: Bindings,
}

impl FolderNode {
    pub fn table(
        config: StudyConfig,
        address: Address,
        table: &'static TableShape,
        bindings: Bindings,
        schema: Option<SchemaNode>,
    ) -> Self {
        Self {
            config,
            address,
            shape: FolderShape::Table(table),
            schema,
            bindings,
        }
    }

    pub fn generic(config: StudyConfig, address: Address, schema: SchemaNode) -> Self {
        Self {
            config,
            address,
            shape: FolderShape::Schema,
            schema: Some(schema),
            bindings: Bindings::default(),
        }
    }

    /// Logical address from the study root.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Build the child map. Touches the filesystem only to list directories.
    pub fn build(&self, config: &StudyConfig) -> Result<Children> {
        match (self.shape, &self.schema) {
            (FolderShape::Table(table), schema) => {
                let mut children =
                    layout::build(table, config, &self.address, &self.bindings, schema.as_ref())?;
                if let Some(schema) = schema {
                    factory::add_declared_fallbacks(&mut children, config, &self.address, schema)?;
                }
                Ok(children)
            }
            (FolderShape::Schema, Some(schema)) => factory::build(config, &self.address, schema),
            (FolderShape::Schema, None) => Ok(Children::new()),
        }
    }

    fn unknown(&self, segment: &str) -> Error {
        Error::UnknownAddressSegment {
            address: self.address.to_string(),
            segment: segment.to_string(),
        }
    }
}

impl TreeNode for FolderNode {
    fn get(&self, scope: &mut BuildScope, address: &[String], depth: Depth) -> Result<Value> {
        let children = scope.children_of(self)?;

        if let Some((head, rest)) = address.split_first() {
            let child = children.get(head).ok_or_else(|| self.unknown(head))?;
            return child.get(scope, rest, depth);
        }

        let mut content = Map::new();
        for (name, child) in children.iter() {
            let value = if depth.is_exhausted() && child.is_structured() {
                Value::Object(Map::new())
            } else {
                child.get(scope, &[], depth.descend())?
            };
            content.insert(name.clone(), value);
        }
        Ok(Value::Object(content))
    }

    fn save(&self, scope: &mut BuildScope, value: Value, address: &[String]) -> Result<()> {
        let Some((head, rest)) = address.split_first() else {
            return Err(Error::CompositeWriteRequiresAddress {
                path: self.config.path().to_path_buf(),
            });
        };
        let children = scope.children_of(self)?;
        let child = children.get(head).ok_or_else(|| self.unknown(head))?;
        child.save(scope, value, rest)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        let Value::Object(entries) = value else {
            return Err(Error::coercion(
                self.address.to_string(),
                "object",
                value.to_string(),
            ));
        };
        let children = self.build(&self.config)?;
        for (name, entry) in entries {
            let child = children.get(name).ok_or_else(|| self.unknown(name))?;
            child.validate(entry)?;
        }
        Ok(())
    }

    fn is_structured(&self) -> bool {
        true
    }

    fn config(&self) -> &StudyConfig {
        &self.config
    }
}
