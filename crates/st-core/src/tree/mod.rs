//! The node tree a study is exposed through.
//!
//! Folders build their children lazily from the study descriptor, either
//! through the declarative [`layout`] table or, for positions the table does
//! not cover, through the schema-driven [`factory`]. Leaves wrap exactly one
//! file and one codec.

pub mod factory;
pub mod folder;
pub mod ini_file;
pub mod layout;
pub mod matrix_file;
pub mod raw_file;
pub mod scope;

use indexmap::IndexMap;
use serde_json::Value;
use st_common::{Depth, Error, Result};

use crate::descriptor::StudyConfig;

pub use folder::FolderNode;
pub use ini_file::IniFileNode;
pub use layout::Bindings;
pub use matrix_file::MatrixNode;
pub use raw_file::RawFileNode;
pub use scope::BuildScope;

/// Children of a folder, in build order.
pub type Children = IndexMap<String, Node>;

/// Contract shared by every node.
pub trait TreeNode {
    /// Content under `address`, expanded `depth` structured levels.
    fn get(&self, scope: &mut BuildScope, address: &[String], depth: Depth) -> Result<Value>;

    /// Replace the content under `address`.
    fn save(&self, scope: &mut BuildScope, value: Value, address: &[String]) -> Result<()>;

    /// Shape check independent of any schema document.
    fn validate(&self, value: &Value) -> Result<()>;

    /// Folders and INI files; these render `{}` under an exhausted depth.
    fn is_structured(&self) -> bool;

    fn config(&self) -> &StudyConfig;
}

#[derive(Debug, Clone)]
pub enum Node {
    Folder(FolderNode),
    Ini(IniFileNode),
    Matrix(MatrixNode),
    Raw(RawFileNode),
}

impl Node {
    fn inner(&self) -> &dyn TreeNode {
        match self {
            Node::Folder(n) => n,
            Node::Ini(n) => n,
            Node::Matrix(n) => n,
            Node::Raw(n) => n,
        }
    }
}

impl TreeNode for Node {
    fn get(&self, scope: &mut BuildScope, address: &[String], depth: Depth) -> Result<Value> {
        self.inner().get(scope, address, depth)
    }

    fn save(&self, scope: &mut BuildScope, value: Value, address: &[String]) -> Result<()> {
        self.inner().save(scope, value, address)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        self.inner().validate(value)
    }

    fn is_structured(&self) -> bool {
        self.inner().is_structured()
    }

    fn config(&self) -> &StudyConfig {
        self.inner().config()
    }
}

/// Error for a leaf handed an address that goes below it.
pub(crate) fn not_consumed(config: &StudyConfig, remaining: &[String]) -> Error {
    Error::AddressNotFullyConsumed {
        path: config.path().to_path_buf(),
        remaining: remaining.join("/"),
    }
}
