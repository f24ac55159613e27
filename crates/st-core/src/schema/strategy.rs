//! Schema shape strategies.
//!
//! A schema fragment governing a directory (or an INI file) is classified into
//! one of six strategies deciding how its children are enumerated:
//!
//! | # | Strategy           | Shape                                                      |
//! |---|--------------------|------------------------------------------------------------|
//! | 1 | `FixedOnly`        | `properties` only                                          |
//! | 2 | `DynamicOnly`      | object-typed `additionalProperties` only                   |
//! | 3 | `Mixed`            | both                                                       |
//! | 4 | `FilenameOverride` | `rte-metadata.filename` names the backing file             |
//! | 5 | `NestedDynamic`    | file whose dynamic sections hold typed scalar keys         |
//! | 6 | `MultiPattern`     | directory whose entries all share one leaf schema          |
//!
//! A named `rte-metadata.strategy` tag (`fixed`, `mixed`, ...) is honoured
//! when it agrees with the shape. Numbered tags (`S1` to `S6`) appear in study
//! schemas as annotations only; the shape decides.

use serde_json::Value;
use st_common::{Error, Result};
use tracing::debug;

use super::document::SchemaNode;
use crate::codec::ScalarType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    FixedOnly,
    DynamicOnly,
    Mixed,
    FilenameOverride(String),
    NestedDynamic,
    MultiPattern,
}

/// What the classified fragment backs on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Directory,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Fixed,
    Dynamic,
    Mixed,
    Filename,
    Nested,
    Multi,
}

enum Tag {
    Named(Kind),
    Numbered,
}

impl Tag {
    fn parse(tag: &str) -> Option<Self> {
        let kind = match tag {
            "S1" | "S2" | "S3" | "S4" | "S5" | "S6" => return Some(Tag::Numbered),
            "fixed" => Kind::Fixed,
            "dynamic" => Kind::Dynamic,
            "mixed" => Kind::Mixed,
            "filename" => Kind::Filename,
            "nested-dynamic" => Kind::Nested,
            "multi-pattern" => Kind::Multi,
            _ => return None,
        };
        Some(Tag::Named(kind))
    }
}

/// Kind of `additionalProperties` schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Additional {
    /// Entries are themselves containers.
    Container,
    /// Entries are containers of typed scalars.
    Nested,
    /// Entries are leaves.
    Leaf,
}

struct Shape {
    properties: bool,
    additional: Option<Additional>,
}

fn unsupported(node: &SchemaNode, reason: impl Into<String>) -> Error {
    Error::UnsupportedSchemaShape {
        pointer: node.pointer().to_string(),
        reason: reason.into(),
    }
}

fn shape(node: &SchemaNode) -> Result<Shape> {
    let value = node.value();
    if !value.is_object() {
        return Err(unsupported(node, "fragment is not a schema object"));
    }

    let properties = match value.get("properties") {
        None => false,
        Some(Value::Object(props)) => !props.is_empty(),
        Some(_) => return Err(unsupported(node, "'properties' is not an object")),
    };

    let additional = match value.get("additionalProperties") {
        None | Some(Value::Bool(false)) => None,
        Some(Value::Bool(true)) => Some(Additional::Leaf),
        Some(Value::Object(_)) => {
            let entry = node
                .additional()
                .ok_or_else(|| unsupported(node, "unresolvable 'additionalProperties'"))?;
            Some(if !entry.is_object_like() {
                Additional::Leaf
            } else if entry
                .additional()
                .and_then(|inner| inner.schema_type().and_then(ScalarType::from_schema_type))
                .is_some()
            {
                Additional::Nested
            } else {
                Additional::Container
            })
        }
        Some(_) => return Err(unsupported(node, "'additionalProperties' is not a schema")),
    };

    Ok(Shape {
        properties,
        additional,
    })
}

impl Strategy {
    /// Classify a fragment, honouring a filename override first.
    pub fn classify(node: &SchemaNode, target: Target) -> Result<Strategy> {
        match node.metadata().filename {
            Some(filename) => Ok(Strategy::FilenameOverride(filename)),
            None => Self::classify_shape(node, target),
        }
    }

    /// Classify by shape alone, ignoring any filename override.
    pub fn classify_shape(node: &SchemaNode, target: Target) -> Result<Strategy> {
        let shape = shape(node)?;
        let inferred = infer(node, &shape, target)?;

        let Some(tag) = node.metadata().strategy else {
            return Ok(inferred);
        };
        let kind = match Tag::parse(&tag) {
            Some(Tag::Named(kind)) => kind,
            Some(Tag::Numbered) => {
                debug!(
                    pointer = node.pointer(),
                    tag = %tag,
                    strategy = inferred.tag(),
                    "numbered strategy tag, using the schema shape"
                );
                return Ok(inferred);
            }
            None => return Err(unsupported(node, format!("unknown strategy tag '{tag}'"))),
        };
        let tagged = match kind {
            Kind::Fixed => Some(Strategy::FixedOnly),
            Kind::Dynamic => Some(Strategy::DynamicOnly),
            Kind::Mixed => Some(Strategy::Mixed),
            Kind::Nested => Some(Strategy::NestedDynamic),
            Kind::Multi => Some(Strategy::MultiPattern),
            // Needs `rte-metadata.filename`, handled by `classify`.
            Kind::Filename => None,
        };
        match tagged {
            Some(strategy) if compatible(kind, &shape, target) => Ok(strategy),
            _ => Err(unsupported(
                node,
                format!("strategy tag '{tag}' does not match the schema shape ({})", inferred.tag()),
            )),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::FixedOnly => "fixed",
            Strategy::DynamicOnly => "dynamic",
            Strategy::Mixed => "mixed",
            Strategy::FilenameOverride(_) => "filename",
            Strategy::NestedDynamic => "nested-dynamic",
            Strategy::MultiPattern => "multi-pattern",
        }
    }

    /// Whether directory entries are enumerated.
    pub fn enumerates_entries(&self) -> bool {
        matches!(
            self,
            Strategy::DynamicOnly | Strategy::Mixed | Strategy::MultiPattern
        )
    }
}

fn infer(node: &SchemaNode, shape: &Shape, target: Target) -> Result<Strategy> {
    let strategy = match (target, shape.properties, shape.additional) {
        (Target::File, _, Some(Additional::Nested)) => Strategy::NestedDynamic,
        (_, true, Some(_)) => Strategy::Mixed,
        (_, true, None) => Strategy::FixedOnly,
        (Target::File, false, Some(_)) => Strategy::DynamicOnly,
        (Target::File, false, None) => Strategy::FixedOnly,
        (Target::Directory, false, Some(Additional::Leaf)) => Strategy::MultiPattern,
        (Target::Directory, false, Some(_)) => Strategy::DynamicOnly,
        (Target::Directory, false, None) => {
            return Err(unsupported(
                node,
                "directory schema declares neither properties nor additionalProperties",
            ))
        }
    };
    Ok(strategy)
}

fn compatible(kind: Kind, shape: &Shape, target: Target) -> bool {
    match kind {
        Kind::Fixed => shape.additional.is_none() && (shape.properties || target == Target::File),
        Kind::Dynamic => {
            !shape.properties
                && match target {
                    Target::File => shape.additional.is_some(),
                    Target::Directory => matches!(
                        shape.additional,
                        Some(Additional::Container | Additional::Nested)
                    ),
                }
        }
        Kind::Mixed => shape.properties && shape.additional.is_some(),
        Kind::Nested => target == Target::File && shape.additional == Some(Additional::Nested),
        Kind::Multi => {
            target == Target::Directory
                && !shape.properties
                && shape.additional == Some(Additional::Leaf)
        }
        Kind::Filename => false,
    }
}
