//! Schema document and positions inside it.

use serde_json::Value;
use st_common::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::fs_util;

/// Vendor key holding `{strategy, filename}` hints.
pub const VENDOR_KEY: &str = "rte-metadata";

const MAX_REF_HOPS: usize = 32;

static NULL: Value = Value::Null;

/// Immutable JSON Schema document.
#[derive(Debug)]
pub struct SchemaDocument {
    root: Value,
}

impl SchemaDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs_util::read_to_string(path)?;
        let root: Value = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "schema loaded");
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Follow local `$ref`s from `pointer` until a concrete fragment.
    fn resolve_pointer(&self, pointer: String) -> Result<String> {
        let mut pointer = pointer;
        for _ in 0..MAX_REF_HOPS {
            let Some(target) = self
                .root
                .pointer(&pointer)
                .and_then(|v| v.get("$ref"))
                .and_then(Value::as_str)
            else {
                return Ok(pointer);
            };
            let Some(local) = target.strip_prefix('#') else {
                return Err(Error::UnsupportedSchemaShape {
                    pointer,
                    reason: format!("only local references are supported, got '{target}'"),
                });
            };
            pointer = local.to_string();
        }
        Err(Error::UnsupportedSchemaShape {
            pointer,
            reason: "reference cycle".to_string(),
        })
    }
}

/// Vendor hints of one schema fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub strategy: Option<String>,
    pub filename: Option<String>,
}

/// What a schema says about one child key.
#[derive(Debug, Clone)]
pub enum ChildSchema {
    /// Declared in `properties` or matched by an `additionalProperties` schema.
    Declared(SchemaNode),
    /// Nothing constrains the key.
    Any,
    /// `additionalProperties: false` and the key is not declared.
    Forbidden,
}

/// A resolved position inside a [`SchemaDocument`].
#[derive(Debug, Clone)]
pub struct SchemaNode {
    doc: Arc<SchemaDocument>,
    pointer: String,
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

impl SchemaNode {
    pub fn root(doc: Arc<SchemaDocument>) -> Result<Self> {
        Self::at(doc, String::new())
    }

    fn at(doc: Arc<SchemaDocument>, pointer: String) -> Result<Self> {
        let pointer = doc.resolve_pointer(pointer)?;
        Ok(Self { doc, pointer })
    }

    fn descend(&self, suffix: &str) -> Option<SchemaNode> {
        let pointer = format!("{}{}", self.pointer, suffix);
        self.doc.root.pointer(&pointer)?;
        Self::at(Arc::clone(&self.doc), pointer).ok()
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn value(&self) -> &Value {
        self.doc.root.pointer(&self.pointer).unwrap_or(&NULL)
    }

    pub fn metadata(&self) -> Metadata {
        let meta = self.value().get(VENDOR_KEY);
        let field = |name: &str| {
            meta.and_then(|m| m.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Metadata {
            strategy: field("strategy"),
            filename: field("filename"),
        }
    }

    /// Declared `type`; for a type list, the first one that is not `null`.
    pub fn schema_type(&self) -> Option<&str> {
        match self.value().get("type")? {
            Value::String(t) => Some(t.as_str()),
            Value::Array(types) => {
                let mut names = types.iter().filter_map(Value::as_str);
                let first = names.clone().next();
                names.find(|t| *t != "null").or(first)
            }
            _ => None,
        }
    }

    /// Declared properties in document order.
    pub fn properties(&self) -> Vec<(String, SchemaNode)> {
        let Some(props) = self.value().get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };
        props
            .keys()
            .filter_map(|key| {
                self.descend(&format!("/properties/{}", escape(key)))
                    .map(|node| (key.clone(), node))
            })
            .collect()
    }

    pub fn property(&self, key: &str) -> Option<SchemaNode> {
        self.value().get("properties")?.get(key)?;
        self.descend(&format!("/properties/{}", escape(key)))
    }

    /// The `additionalProperties` schema when it is an object schema.
    pub fn additional(&self) -> Option<SchemaNode> {
        match self.value().get("additionalProperties")? {
            Value::Object(_) => self.descend("/additionalProperties"),
            _ => None,
        }
    }

    pub fn child(&self, key: &str) -> ChildSchema {
        if let Some(node) = self.property(key) {
            return ChildSchema::Declared(node);
        }
        match self.value().get("additionalProperties") {
            Some(Value::Bool(false)) => ChildSchema::Forbidden,
            Some(Value::Object(_)) => self
                .additional()
                .map(ChildSchema::Declared)
                .unwrap_or(ChildSchema::Any),
            _ => ChildSchema::Any,
        }
    }

    /// Declared schema of a child, when there is one.
    pub fn declared_child(&self, key: &str) -> Option<SchemaNode> {
        match self.child(key) {
            ChildSchema::Declared(node) => Some(node),
            _ => None,
        }
    }

    /// `items` schema of an array fragment.
    pub fn items(&self) -> Option<SchemaNode> {
        match self.value().get("items")? {
            Value::Object(_) => self.descend("/items"),
            _ => None,
        }
    }

    /// Members of an `allOf` list.
    pub fn all_of(&self) -> Vec<SchemaNode> {
        let count = self
            .value()
            .get("allOf")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        (0..count)
            .filter_map(|i| self.descend(&format!("/allOf/{i}")))
            .collect()
    }

    /// Whether the fragment describes an object (by type or by keywords).
    pub fn is_object_like(&self) -> bool {
        let value = self.value();
        self.schema_type() == Some("object")
            || value.get("properties").is_some()
            || value.get("additionalProperties").is_some_and(Value::is_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Arc<SchemaDocument> {
        Arc::new(SchemaDocument::new(value))
    }

    #[test]
    fn test_properties_in_order() {
        let root = SchemaNode::root(doc(json!({
            "type": "object",
            "properties": {"b": {"type": "string"}, "a": {"type": "integer"}}
        })))
        .unwrap();
        let keys: Vec<_> = root.properties().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(root.property("a").unwrap().schema_type(), Some("integer"));
        assert!(root.property("c").is_none());
    }

    #[test]
    fn test_local_ref_resolution() {
        let root = SchemaNode::root(doc(json!({
            "definitions": {"area": {"type": "object", "properties": {"ui": {"type": "object"}}}},
            "properties": {"fr": {"$ref": "#/definitions/area"}}
        })))
        .unwrap();
        let fr = root.property("fr").unwrap();
        assert_eq!(fr.pointer(), "/definitions/area");
        assert!(fr.property("ui").is_some());
    }

    #[test]
    fn test_ref_cycle_rejected() {
        let document = doc(json!({
            "properties": {"x": {"$ref": "#/properties/y"}, "y": {"$ref": "#/properties/x"}}
        }));
        let root = SchemaNode::root(document).unwrap();
        assert!(root.property("x").is_none());
    }

    #[test]
    fn test_child_lookup() {
        let root = SchemaNode::root(doc(json!({
            "properties": {"list": {"type": "string"}},
            "additionalProperties": {"type": "object"}
        })))
        .unwrap();
        assert!(matches!(root.child("list"), ChildSchema::Declared(_)));
        match root.child("fr") {
            ChildSchema::Declared(node) => assert_eq!(node.pointer(), "/additionalProperties"),
            other => panic!("unexpected: {other:?}"),
        }

        let closed = SchemaNode::root(doc(json!({"properties": {}, "additionalProperties": false})))
            .unwrap();
        assert!(matches!(closed.child("x"), ChildSchema::Forbidden));
        let open = SchemaNode::root(doc(json!({}))).unwrap();
        assert!(matches!(open.child("x"), ChildSchema::Any));
    }

    #[test]
    fn test_metadata_and_escaping() {
        let root = SchemaNode::root(doc(json!({
            "properties": {
                "a/b": {"type": "string", "rte-metadata": {"filename": "a b.txt", "strategy": "S4"}}
            }
        })))
        .unwrap();
        let child = root.property("a/b").unwrap();
        assert_eq!(child.pointer(), "/properties/a~1b");
        assert_eq!(
            child.metadata(),
            Metadata {
                strategy: Some("S4".into()),
                filename: Some("a b.txt".into())
            }
        );
    }

    #[test]
    fn test_type_arrays() {
        let root = SchemaNode::root(doc(json!({"type": ["null", "object"]}))).unwrap();
        assert_eq!(root.schema_type(), Some("object"));
        assert!(root.is_object_like());
        let nullable = SchemaNode::root(doc(json!({"type": ["null"]}))).unwrap();
        assert_eq!(nullable.schema_type(), Some("null"));
    }
}
