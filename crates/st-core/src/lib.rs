//! Study tree engine.
//!
//! This crate exposes an on-disk simulation study as one JSON document:
//! - Study descriptor introspection (areas, links, clusters, outputs)
//! - INI and matrix codecs with atomic writes
//! - A lazily built node tree, from a layout table or a JSON Schema
//! - Address resolution with a depth bound, plus schema validation
//! - A studies-directory service with per-study locking

pub mod codec;
pub mod descriptor;
pub mod fs_util;
pub mod logging;
pub mod schema;
pub mod service;
pub mod study;
pub mod tree;
pub mod url;

pub use descriptor::StudyConfig;
pub use schema::{SchemaDocument, SchemaValidator, Strategy};
pub use service::StudyService;
pub use st_common::{Address, Depth, Error, Result};
pub use study::Study;
pub use url::PathResolver;
