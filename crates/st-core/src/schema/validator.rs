//! Structural validation of study documents.
//!
//! Supports the JSON Schema keywords study schemas use: `type`, `enum`,
//! `const`, numeric bounds, string length and `pattern`, `required`,
//! `properties`, `additionalProperties`, `items`, array length and `allOf`.
//! Vendor metadata is ignored. The first violation is reported.

use regex::Regex;
use serde_json::Value;
use st_common::{Address, Error, Result};
use tracing::debug;

use super::document::{ChildSchema, SchemaNode};

pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate `value` against the fragment `schema`.
    pub fn validate(schema: &SchemaNode, value: &Value) -> Result<()> {
        check(schema, value, &mut Vec::new())
    }

    /// Validate `value` as the sub-document found at `address` below `root`.
    pub fn validate_at(root: &SchemaNode, address: &Address, value: &Value) -> Result<()> {
        let mut node = root.clone();
        for (depth, segment) in address.segments().iter().enumerate() {
            match node.child(segment) {
                ChildSchema::Declared(child) => node = child,
                ChildSchema::Any => {
                    debug!(address = %address, "no schema constrains this address");
                    return Ok(());
                }
                ChildSchema::Forbidden => {
                    return Err(Error::SchemaValidation {
                        path: render(&address.segments()[..=depth]),
                        constraint: "additionalProperties: key not allowed".to_string(),
                    })
                }
            }
        }
        let mut path = address.segments().to_vec();
        check(&node, value, &mut path)
    }
}

fn render(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

fn violation(path: &[String], constraint: impl Into<String>) -> Error {
    Error::SchemaValidation {
        path: render(path),
        constraint: constraint.into(),
    }
}

fn type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => true,
    }
}

fn check(node: &SchemaNode, value: &Value, path: &mut Vec<String>) -> Result<()> {
    let schema = node.value();
    let Value::Object(keywords) = schema else {
        if schema == &Value::Bool(false) {
            return Err(violation(path, "false schema accepts nothing"));
        }
        return Ok(());
    };

    match keywords.get("type") {
        Some(Value::String(ty)) if !type_matches(ty, value) => {
            return Err(violation(path, format!("type: expected {ty}")));
        }
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            if !names.iter().any(|t| type_matches(t, value)) {
                return Err(violation(path, format!("type: expected one of {}", names.join(", "))));
            }
        }
        _ => {}
    }

    if let Some(Value::Array(options)) = keywords.get("enum") {
        if !options.contains(value) {
            return Err(violation(path, format!("enum: {value} is not allowed")));
        }
    }
    if let Some(expected) = keywords.get("const") {
        if expected != value {
            return Err(violation(path, format!("const: expected {expected}")));
        }
    }

    if let Some(n) = value.as_f64() {
        check_bounds(keywords, n, path)?;
    }
    if let Value::String(s) = value {
        check_string(node, keywords, s, path)?;
    }

    for part in node.all_of() {
        check(&part, value, path)?;
    }

    match value {
        Value::Object(entries) => check_object(node, keywords, entries, path),
        Value::Array(items) => check_array(node, keywords, items, path),
        _ => Ok(()),
    }
}

fn check_bounds(keywords: &serde_json::Map<String, Value>, n: f64, path: &[String]) -> Result<()> {
    let bound = |name: &str| keywords.get(name).and_then(Value::as_f64);
    if let Some(min) = bound("minimum") {
        if n < min {
            return Err(violation(path, format!("minimum: {n} < {min}")));
        }
    }
    if let Some(max) = bound("maximum") {
        if n > max {
            return Err(violation(path, format!("maximum: {n} > {max}")));
        }
    }
    if let Some(min) = bound("exclusiveMinimum") {
        if n <= min {
            return Err(violation(path, format!("exclusiveMinimum: {n} <= {min}")));
        }
    }
    if let Some(max) = bound("exclusiveMaximum") {
        if n >= max {
            return Err(violation(path, format!("exclusiveMaximum: {n} >= {max}")));
        }
    }
    Ok(())
}

fn check_string(
    node: &SchemaNode,
    keywords: &serde_json::Map<String, Value>,
    s: &str,
    path: &[String],
) -> Result<()> {
    let len = s.chars().count() as u64;
    if let Some(min) = keywords.get("minLength").and_then(Value::as_u64) {
        if len < min {
            return Err(violation(path, format!("minLength: {len} < {min}")));
        }
    }
    if let Some(max) = keywords.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            return Err(violation(path, format!("maxLength: {len} > {max}")));
        }
    }
    if let Some(pattern) = keywords.get("pattern").and_then(Value::as_str) {
        let re = Regex::new(pattern).map_err(|e| Error::UnsupportedSchemaShape {
            pointer: node.pointer().to_string(),
            reason: format!("invalid pattern: {e}"),
        })?;
        if !re.is_match(s) {
            return Err(violation(path, format!("pattern: '{s}' does not match {pattern}")));
        }
    }
    Ok(())
}

fn check_object(
    node: &SchemaNode,
    keywords: &serde_json::Map<String, Value>,
    entries: &serde_json::Map<String, Value>,
    path: &mut Vec<String>,
) -> Result<()> {
    if let Some(Value::Array(required)) = keywords.get("required") {
        for key in required.iter().filter_map(Value::as_str) {
            if !entries.contains_key(key) {
                return Err(violation(path, format!("required: missing '{key}'")));
            }
        }
    }

    for (key, child) in entries {
        path.push(key.clone());
        let outcome = match node.child(key) {
            ChildSchema::Declared(schema) => check(&schema, child, path),
            ChildSchema::Any => Ok(()),
            ChildSchema::Forbidden => Err(violation(path, "additionalProperties: key not allowed")),
        };
        path.pop();
        outcome?;
    }
    Ok(())
}

fn check_array(
    node: &SchemaNode,
    keywords: &serde_json::Map<String, Value>,
    items: &[Value],
    path: &mut Vec<String>,
) -> Result<()> {
    let len = items.len() as u64;
    if let Some(min) = keywords.get("minItems").and_then(Value::as_u64) {
        if len < min {
            return Err(violation(path, format!("minItems: {len} < {min}")));
        }
    }
    if let Some(max) = keywords.get("maxItems").and_then(Value::as_u64) {
        if len > max {
            return Err(violation(path, format!("maxItems: {len} > {max}")));
        }
    }

    if let Some(item_schema) = node.items() {
        for (i, item) in items.iter().enumerate() {
            path.push(i.to_string());
            let outcome = check(&item_schema, item, path);
            path.pop();
            outcome?;
        }
    }
    Ok(())
}
