//! Address resolution over a node tree or an in-memory document.
//!
//! Descent is always complete; the depth bound only applies to the content
//! under the final address.

use serde_json::{Map, Value};
use st_common::{Address, Depth, Error, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::tree::{BuildScope, Node, TreeNode};

pub struct PathResolver;

impl PathResolver {
    pub fn get(root: &Node, address: &Address, depth: Depth) -> Result<Value> {
        Self::get_in(&mut BuildScope::new(), root, address, depth)
    }

    /// Resolve within an existing build scope.
    pub fn get_in(
        scope: &mut BuildScope,
        root: &Node,
        address: &Address,
        depth: Depth,
    ) -> Result<Value> {
        let value = root.get(scope, address.segments(), depth)?;
        debug!(
            address = %address,
            depth = %depth,
            folders_built = scope.builds(),
            "address resolved"
        );
        Ok(value)
    }

    pub fn save(root: &Node, value: Value, address: &Address) -> Result<()> {
        let mut scope = BuildScope::new();
        root.save(&mut scope, value, address.segments())?;
        debug!(address = %address, folders_built = scope.builds(), "address saved");
        Ok(())
    }

    /// Navigate an already materialised document.
    pub fn apply(document: &Value, address: &Address, depth: Depth) -> Result<Value> {
        let segments = address.segments();
        let mut current = document;
        for (i, segment) in segments.iter().enumerate() {
            let consumed = segments[..i].join("/");
            match current {
                Value::Object(entries) => {
                    current = entries.get(segment).ok_or_else(|| Error::UnknownAddressSegment {
                        address: consumed,
                        segment: segment.clone(),
                    })?;
                }
                _ => {
                    return Err(Error::AddressNotFullyConsumed {
                        path: PathBuf::from(consumed),
                        remaining: segments[i..].join("/"),
                    })
                }
            }
        }
        Ok(Self::truncate(current, depth))
    }

    /// Cut a document down to `depth` structured levels: objects below the
    /// bound become `{}`, every other value is kept.
    pub fn truncate(value: &Value, depth: Depth) -> Value {
        let Value::Object(entries) = value else {
            return value.clone();
        };
        let truncated: Map<String, Value> = entries
            .iter()
            .map(|(key, child)| {
                let child = match child {
                    Value::Object(_) if depth.is_exhausted() => Value::Object(Map::new()),
                    _ => Self::truncate(child, depth.descend()),
                };
                (key.clone(), child)
            })
            .collect();
        Value::Object(truncated)
    }
}
