//! Study schema: a JSON Schema document carrying `rte-metadata` hints.
//!
//! - [`document`]: loading, `$ref` resolution, positions inside the document
//! - [`strategy`]: how a schema fragment maps onto directory entries
//! - [`validator`]: structural validation of produced documents

pub mod document;
pub mod strategy;
pub mod validator;

pub use document::{ChildSchema, Metadata, SchemaDocument, SchemaNode, VENDOR_KEY};
pub use strategy::{Strategy, Target};
pub use validator::SchemaValidator;
