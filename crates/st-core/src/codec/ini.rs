//! INI reading, typing and writing.
//!
//! Reading is two-staged: [`IniReader`] produces raw strings in first-seen
//! section order, then [`IniTypes::decode`] coerces each value to the scalar
//! type declared for its key (string when nothing is declared).
//!
//! Writing emits `key = value` lines, one blank line after each section.
//! Booleans are written `True`/`False`.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use st_common::{Error, Result};
use std::path::Path;
use tracing::trace;

use crate::fs_util;

/// Section name to key/value strings, both in first-seen order.
pub type RawSections = IndexMap<String, IndexMap<String, String>>;

// ── Reading ─────────────────────────────────────────────────────────────

/// Line-oriented INI parser.
pub struct IniReader;

impl IniReader {
    /// Parse INI text. Comment lines start with `;` or `#`; values are split
    /// at the first `=`; a repeated section merges into the first one.
    pub fn parse(content: &str) -> RawSections {
        let mut sections = RawSections::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some(section) = current.as_ref() else {
                trace!(line, "key outside of any section ignored");
                continue;
            };
            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (line, ""),
            };
            if let Some(entries) = sections.get_mut(section) {
                entries.insert(key.to_string(), value.to_string());
            }
        }

        sections
    }

    pub fn read(path: &Path) -> Result<RawSections> {
        Ok(Self::parse(&fs_util::read_to_string(path)?))
    }
}

// ── Typing ──────────────────────────────────────────────────────────────

/// Scalar type of one INI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int,
    Float,
    /// Integer when the literal is integral, float otherwise.
    Number,
    Bool,
    Str,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Int => "integer",
            ScalarType::Float => "float",
            ScalarType::Number => "number",
            ScalarType::Bool => "boolean",
            ScalarType::Str => "string",
        }
    }

    /// Map a JSON Schema `type` keyword.
    pub fn from_schema_type(ty: &str) -> Option<Self> {
        match ty {
            "integer" => Some(ScalarType::Int),
            "number" => Some(ScalarType::Number),
            "boolean" => Some(ScalarType::Bool),
            "string" => Some(ScalarType::Str),
            _ => None,
        }
    }

    /// Coerce a raw literal.
    pub fn coerce(self, raw: &str, location: &str) -> Result<Value> {
        let fail = || Error::coercion(location, self.name(), raw);
        match self {
            ScalarType::Str => Ok(Value::String(raw.to_string())),
            ScalarType::Int => raw.parse::<i64>().map(Value::from).map_err(|_| fail()),
            ScalarType::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(fail),
            ScalarType::Number => match raw.parse::<i64>() {
                Ok(n) => Ok(Value::from(n)),
                Err(_) => ScalarType::Float.coerce(raw, location).map_err(|_| fail()),
            },
            ScalarType::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(fail),
        }
    }

    /// Whether an already-typed JSON value fits this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ScalarType::Str => value.is_string(),
            ScalarType::Int => value.is_i64() || value.is_u64(),
            ScalarType::Float | ScalarType::Number => value.is_number(),
            ScalarType::Bool => value.is_boolean(),
        }
    }
}

/// Boolean literals of typed INI values.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

/// Either case, for reading the study inventory only.
pub fn parse_bool_lenient(raw: &str) -> Option<bool> {
    match raw {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

/// Static description of one section's keys, used by layout tables.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub keys: &'static [(&'static str, ScalarType)],
    pub other: Option<ScalarType>,
}

impl SectionSpec {
    pub const fn keys(keys: &'static [(&'static str, ScalarType)]) -> Self {
        Self { keys, other: None }
    }

    /// Every key shares one type.
    pub const fn all(ty: ScalarType) -> Self {
        Self {
            keys: &[],
            other: Some(ty),
        }
    }
}

/// Static description of an INI file's typing.
#[derive(Debug, Clone, Copy)]
pub struct IniSpec {
    pub sections: &'static [(&'static str, SectionSpec)],
    /// Typing applied to sections not listed in `sections`.
    pub any_section: Option<SectionSpec>,
    /// Read a missing file as an empty document.
    pub allow_missing: bool,
}

impl IniSpec {
    pub const fn sections(sections: &'static [(&'static str, SectionSpec)]) -> Self {
        Self {
            sections,
            any_section: None,
            allow_missing: false,
        }
    }

    /// Dynamic section names, all typed alike.
    pub const fn any(section: SectionSpec) -> Self {
        Self {
            sections: &[],
            any_section: Some(section),
            allow_missing: false,
        }
    }

    pub const fn untyped() -> Self {
        Self::sections(&[])
    }

    pub const fn optional(mut self) -> Self {
        self.allow_missing = true;
        self
    }
}

/// Key typing for one section.
#[derive(Debug, Clone, Default)]
pub struct SectionTypes {
    keys: IndexMap<String, ScalarType>,
    other: Option<ScalarType>,
}

impl SectionTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, name: &str, ty: ScalarType) -> Self {
        self.keys.insert(name.to_string(), ty);
        self
    }

    pub fn other(mut self, ty: ScalarType) -> Self {
        self.other = Some(ty);
        self
    }

    pub fn type_of(&self, key: &str) -> ScalarType {
        self.keys
            .get(key)
            .copied()
            .or(self.other)
            .unwrap_or(ScalarType::Str)
    }
}

impl From<&SectionSpec> for SectionTypes {
    fn from(spec: &SectionSpec) -> Self {
        let mut types = SectionTypes::new();
        for (name, ty) in spec.keys {
            types = types.key(name, *ty);
        }
        types.other = spec.other;
        types
    }
}

/// Key typing for a whole INI file.
#[derive(Debug, Clone, Default)]
pub struct IniTypes {
    sections: IndexMap<String, SectionTypes>,
    other: Option<SectionTypes>,
}

impl IniTypes {
    /// Every value is a string.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn section(mut self, name: &str, types: SectionTypes) -> Self {
        self.sections.insert(name.to_string(), types);
        self
    }

    pub fn other_sections(mut self, types: SectionTypes) -> Self {
        self.other = Some(types);
        self
    }

    pub fn type_of(&self, section: &str, key: &str) -> ScalarType {
        self.sections
            .get(section)
            .or(self.other.as_ref())
            .map(|s| s.type_of(key))
            .unwrap_or(ScalarType::Str)
    }

    /// Coerce a raw document into typed JSON: `{section: {key: scalar}}`.
    pub fn decode(&self, raw: &RawSections, origin: &Path) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        for (section, entries) in raw {
            let mut typed = Map::new();
            for (key, literal) in entries {
                let location = format!("{}:[{}].{}", origin.display(), section, key);
                let value = self.type_of(section, key).coerce(literal, &location)?;
                typed.insert(key.clone(), value);
            }
            doc.insert(section.clone(), Value::Object(typed));
        }
        Ok(doc)
    }

    /// Check that a typed section object fits the declared key types.
    pub fn check_section(&self, section: &str, value: &Value) -> Result<()> {
        let Value::Object(entries) = value else {
            return Err(Error::coercion(
                format!("[{section}]"),
                "object",
                value.to_string(),
            ));
        };
        for (key, scalar) in entries {
            self.check_scalar(section, key, scalar)?;
        }
        Ok(())
    }

    pub fn check_scalar(&self, section: &str, key: &str, value: &Value) -> Result<()> {
        let location = format!("[{section}].{key}");
        if value.is_object() || value.is_array() {
            return Err(Error::coercion(location, "scalar", value.to_string()));
        }
        let ty = self.type_of(section, key);
        match value {
            Value::Null => Ok(()),
            _ if ty.accepts(value) => Ok(()),
            // A literal is fine when it reads back as the declared type.
            Value::String(literal) => ty.coerce(literal, &location).map(|_| ()),
            _ => Err(Error::coercion(location, ty.name(), value.to_string())),
        }
    }

    /// Check a whole typed document.
    pub fn check_document(&self, value: &Value) -> Result<()> {
        let Value::Object(sections) = value else {
            return Err(Error::coercion("document", "object", value.to_string()));
        };
        for (name, section) in sections {
            self.check_section(name, section)?;
        }
        Ok(())
    }
}

impl From<&IniSpec> for IniTypes {
    fn from(spec: &IniSpec) -> Self {
        let mut types = IniTypes::untyped();
        for (name, section) in spec.sections {
            types = types.section(name, section.into());
        }
        types.other = spec.any_section.as_ref().map(SectionTypes::from);
        types
    }
}

// ── Writing ─────────────────────────────────────────────────────────────

/// INI serializer for typed (or raw string) documents.
pub struct IniWriter;

impl IniWriter {
    /// Render `{section: {key: scalar}}` as INI text.
    pub fn render(doc: &Map<String, Value>) -> Result<String> {
        let mut out = String::new();
        for (section, entries) in doc {
            let Value::Object(entries) = entries else {
                return Err(Error::coercion(
                    format!("[{section}]"),
                    "object",
                    entries.to_string(),
                ));
            };
            out.push('[');
            out.push_str(section);
            out.push_str("]\n");
            for (key, value) in entries {
                let literal = render_scalar(value, &format!("[{section}].{key}"))?;
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(&literal);
                out.push('\n');
            }
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write(path: &Path, doc: &Map<String, Value>) -> Result<()> {
        let text = Self::render(doc)?;
        fs_util::write_atomic(path, text.as_bytes())
    }
}

fn render_scalar(value: &Value, location: &str) -> Result<String> {
    match value {
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(Error::coercion(location, "scalar", other.to_string())),
    }
}

/// Raw sections as a JSON document of strings.
pub fn raw_to_json(raw: &RawSections) -> Map<String, Value> {
    raw.iter()
        .map(|(section, entries)| {
            let entries: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            (section.clone(), Value::Object(entries))
        })
        .collect()
}
