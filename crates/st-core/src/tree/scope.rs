//! Per-call memo of built folder children.
//!
//! A folder's children are built at most once per `get`/`save` call. The memo
//! is keyed by the folder's logical address, not its directory: distinct
//! folders may share a directory (`output/<id>/.../links/<area>`).

use std::collections::HashMap;
use std::rc::Rc;

use st_common::{Address, Result};
use tracing::trace;

use super::{Children, FolderNode, TreeNode};

#[derive(Debug, Default)]
pub struct BuildScope {
    built: HashMap<Address, Rc<Children>>,
    builds: usize,
}

impl BuildScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children_of(&mut self, folder: &FolderNode) -> Result<Rc<Children>> {
        if let Some(children) = self.built.get(folder.address()) {
            return Ok(Rc::clone(children));
        }

        let children = Rc::new(folder.build(folder.config())?);
        self.builds += 1;
        trace!(
            address = %folder.address(),
            children = children.len(),
            "folder children built"
        );
        self.built.insert(folder.address().clone(), Rc::clone(&children));
        Ok(children)
    }

    /// Number of folders built so far in this scope.
    pub fn builds(&self) -> usize {
        self.builds
    }
}
