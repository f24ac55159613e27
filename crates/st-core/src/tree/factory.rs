//! Schema-driven child resolution.
//!
//! Used for folders the layout table does not describe, and for schema
//! properties a table folder does not define itself. Dynamic entries are
//! taken from the directory listing, sorted by name, keyed by file stem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use st_common::{Address, Result};
use tracing::{debug, trace, warn};

use super::{Children, FolderNode, IniFileNode, MatrixNode, Node, RawFileNode};
use crate::codec::ini::{IniTypes, ScalarType, SectionTypes};
use crate::descriptor::StudyConfig;
use crate::fs_util;
use crate::schema::{SchemaNode, Strategy, Target};

/// Children of a directory governed by `schema`.
pub fn build(config: &StudyConfig, address: &Address, schema: &SchemaNode) -> Result<Children> {
    let strategy = Strategy::classify_shape(schema, Target::Directory)?;
    debug!(
        address = %address,
        path = %config.path().display(),
        strategy = strategy.tag(),
        "resolving children from schema"
    );

    let mut children = Children::new();
    let declared = schema.properties();
    let mut reserved = HashSet::new();

    if matches!(strategy, Strategy::FixedOnly | Strategy::Mixed) {
        for (key, child_schema) in &declared {
            if let Some(filename) = child_schema.metadata().filename {
                reserved.insert(filename);
            }
            let node = declared_child(config, address, key, child_schema.clone())?;
            children.insert(key.clone(), node);
        }
    }

    if strategy.enumerates_entries() {
        let entry_schema = schema.additional();
        for path in fs_util::list_entries(config.path())? {
            let key = fs_util::entry_key(&path);
            let name = fs_util::entry_name(&path);
            if reserved.contains(&name) {
                continue;
            }
            if children.contains_key(&key) {
                if !declared.iter().any(|(k, _)| *k == key) {
                    warn!(path = %path.display(), key = %key, "entry shadowed by a sibling with the same stem");
                }
                continue;
            }
            let node = entry_node(
                config.next(&name),
                address.child(&key),
                entry_schema.clone(),
                path.is_dir(),
            )?;
            children.insert(key, node);
        }
    }

    Ok(children)
}

/// Add generic children for declared properties a table folder left out.
/// Only properties backed by something on disk are added.
pub fn add_declared_fallbacks(
    children: &mut Children,
    config: &StudyConfig,
    address: &Address,
    schema: &SchemaNode,
) -> Result<()> {
    for (key, child_schema) in schema.properties() {
        if children.contains_key(&key) {
            continue;
        }
        let Some(path) = locate(config.path(), &key, &child_schema)? else {
            continue;
        };
        if !path.exists() {
            continue;
        }
        trace!(address = %address, key = %key, "schema fallback child");
        let name = fs_util::entry_name(&path);
        let node = entry_node(
            config.next(&name),
            address.child(&key),
            Some(child_schema),
            path.is_dir(),
        )?;
        children.insert(key, node);
    }
    Ok(())
}

/// Backing entry of a declared key: the override filename, an exact
/// match, or the first file whose stem is the key.
fn locate(dir: &Path, key: &str, schema: &SchemaNode) -> Result<Option<PathBuf>> {
    if let Some(filename) = schema.metadata().filename {
        return Ok(Some(dir.join(filename)));
    }
    let exact = dir.join(key);
    if exact.exists() {
        return Ok(Some(exact));
    }
    Ok(fs_util::list_entries(dir)?
        .into_iter()
        .find(|p| !p.is_dir() && fs_util::entry_key(p) == key))
}

fn declared_child(
    config: &StudyConfig,
    parent: &Address,
    key: &str,
    schema: SchemaNode,
) -> Result<Node> {
    let address = parent.child(key);
    match locate(config.path(), key, &schema)? {
        Some(path) => {
            let name = fs_util::entry_name(&path);
            entry_node(config.next(&name), address, Some(schema), path.is_dir())
        }
        // Nothing on disk: the schema alone decides.
        None => {
            let is_dir = schema.is_object_like() && !looks_like_ini(&schema);
            entry_node(config.next(key), address, Some(schema), is_dir)
        }
    }
}

/// An object whose properties are all objects of scalars reads as an INI document.
fn looks_like_ini(schema: &SchemaNode) -> bool {
    let sections = schema.properties();
    !sections.is_empty()
        && sections.iter().all(|(_, section)| {
            let keys = section.properties();
            section.is_object_like()
                && keys.iter().all(|(_, k)| {
                    k.schema_type().and_then(ScalarType::from_schema_type).is_some()
                })
        })
}

fn entry_node(
    config: StudyConfig,
    address: Address,
    schema: Option<SchemaNode>,
    is_dir: bool,
) -> Result<Node> {
    let ty = schema.as_ref().and_then(|s| s.schema_type().map(str::to_string));
    let node = match ty.as_deref() {
        Some("array") => Node::Matrix(MatrixNode::new(config)),
        Some("string" | "number" | "integer" | "boolean") => Node::Raw(RawFileNode::new(config)),
        _ if is_dir => match schema {
            Some(schema) => Node::Folder(FolderNode::generic(config, address, schema)),
            None => Node::Raw(RawFileNode::new(config)),
        },
        _ => match schema {
            Some(schema) if schema.is_object_like() => {
                let strategy = Strategy::classify_shape(&schema, Target::File)?;
                trace!(address = %address, strategy = strategy.tag(), "ini from schema");
                Node::Ini(IniFileNode::new(config, ini_types(&schema)))
            }
            _ if has_ini_extension(config.path()) => {
                Node::Ini(IniFileNode::new(config, IniTypes::untyped()))
            }
            _ => Node::Raw(RawFileNode::new(config)),
        },
    };
    Ok(node)
}

fn has_ini_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ini")
}

/// Key typing declared by an INI-document schema.
pub fn ini_types(schema: &SchemaNode) -> IniTypes {
    let mut types = IniTypes::untyped();
    for (name, section) in schema.properties() {
        types = types.section(&name, section_types(&section));
    }
    if let Some(any) = schema.additional() {
        types = types.other_sections(section_types(&any));
    }
    types
}

fn section_types(section: &SchemaNode) -> SectionTypes {
    let mut types = SectionTypes::new();
    for (key, schema) in section.properties() {
        if let Some(ty) = schema.schema_type().and_then(ScalarType::from_schema_type) {
            types = types.key(&key, ty);
        }
    }
    let other = section
        .additional()
        .and_then(|a| a.schema_type().and_then(ScalarType::from_schema_type));
    if let Some(ty) = other {
        types = types.other(ty);
    }
    types
}
