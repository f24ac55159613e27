//! Opaque leaf: content is never decoded.
//!
//! Reads yield a `file/<path below the study root>` reference. Writes take
//! such a reference (or the name of a default asset in the resources
//! directory) and copy that file into place.

use serde_json::Value;
use st_common::{Depth, Error, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use super::{not_consumed, BuildScope, TreeNode};
use crate::descriptor::StudyConfig;
use crate::fs_util;

/// Prefix of file reference strings.
pub const FILE_PREFIX: &str = "file/";

#[derive(Debug, Clone)]
pub struct RawFileNode {
    config: StudyConfig,
}

impl RawFileNode {
    pub fn new(config: StudyConfig) -> Self {
        Self { config }
    }

    /// Reference string for this leaf.
    pub fn reference(&self) -> String {
        format!("{FILE_PREFIX}{}", self.config.relative_path())
    }

    fn source_of(&self, value: &str) -> Result<PathBuf> {
        let (base, rel) = match value.strip_prefix(FILE_PREFIX) {
            Some(rel) => (self.config.root_path(), rel),
            None => match self.config.resources_path() {
                Some(resources) => (resources, value),
                None => {
                    return Err(Error::BackingFileMissing {
                        path: PathBuf::from(value),
                    })
                }
            },
        };
        if !stays_below(rel) {
            warn!(reference = %value, "file reference leaves its base directory");
            return Err(Error::coercion(
                self.config.relative_path(),
                "file reference below the study or resources directory",
                value,
            ));
        }
        Ok(base.join(rel))
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.config.path().exists() {
            Ok(())
        } else {
            Err(Error::BackingFileMissing {
                path: self.config.path().to_path_buf(),
            })
        }
    }
}

/// Relative, with no `..` component.
fn stays_below(rel: &str) -> bool {
    Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl TreeNode for RawFileNode {
    fn get(&self, _scope: &mut BuildScope, address: &[String], _depth: Depth) -> Result<Value> {
        if !address.is_empty() {
            return Err(not_consumed(&self.config, address));
        }
        self.ensure_exists()?;
        Ok(Value::String(self.reference()))
    }

    fn save(&self, _scope: &mut BuildScope, value: Value, address: &[String]) -> Result<()> {
        if !address.is_empty() {
            return Err(not_consumed(&self.config, address));
        }
        let Value::String(reference) = value else {
            return Err(Error::coercion(
                self.config.relative_path(),
                "file reference",
                value.to_string(),
            ));
        };

        let source = self.source_of(&reference)?;
        let target = self.config.path();
        if source == target {
            return Ok(());
        }
        if !source.is_file() {
            return Err(Error::BackingFileMissing { path: source });
        }

        let bytes = fs::read(&source).map_err(|e| Error::io(&source, e))?;
        fs_util::write_atomic(target, &bytes)?;
        info!(
            from = %source.display(),
            to = %target.display(),
            bytes = bytes.len(),
            "raw file copied"
        );
        Ok(())
    }

    fn validate(&self, _value: &Value) -> Result<()> {
        self.ensure_exists()
    }

    fn is_structured(&self) -> bool {
        false
    }

    fn config(&self) -> &StudyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Inventory;
    use serde_json::json;
    use tempfile::tempdir;

    fn study(root: &std::path::Path) -> StudyConfig {
        fs::create_dir_all(root.join("settings/resources")).unwrap();
        fs::write(root.join("settings/resources/study.ico"), b"\x00\x01icon").unwrap();
        fs::write(root.join("settings/comments.txt"), "hello").unwrap();
        StudyConfig::new(root, Inventory::default())
    }

    #[test]
    fn test_get_returns_reference() {
        let dir = tempdir().expect("tempdir");
        let node = RawFileNode::new(study(dir.path()).next("settings").next("comments.txt"));
        let value = node.get(&mut BuildScope::new(), &[], Depth::Unbounded).unwrap();
        assert_eq!(value, json!("file/settings/comments.txt"));
    }

    #[test]
    fn test_get_missing_file() {
        let dir = tempdir().expect("tempdir");
        let node = RawFileNode::new(study(dir.path()).next("absent.txt"));
        assert!(matches!(
            node.get(&mut BuildScope::new(), &[], Depth::Unbounded).unwrap_err(),
            Error::BackingFileMissing { .. }
        ));
        assert!(node.validate(&json!(null)).is_err());
    }

    #[test]
    fn test_save_copies_referenced_file() {
        let dir = tempdir().expect("tempdir");
        let node = RawFileNode::new(study(dir.path()).next("logs").next("copy.ico"));
        node.save(
            &mut BuildScope::new(),
            json!("file/settings/resources/study.ico"),
            &[],
        )
        .unwrap();
        assert_eq!(fs::read(dir.path().join("logs/copy.ico")).unwrap(), b"\x00\x01icon");
    }

    #[test]
    fn test_save_onto_itself_is_noop() {
        let dir = tempdir().expect("tempdir");
        let node = RawFileNode::new(study(dir.path()).next("settings").next("comments.txt"));
        node.save(&mut BuildScope::new(), json!("file/settings/comments.txt"), &[])
            .unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("settings/comments.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_save_from_resources() {
        let dir = tempdir().expect("tempdir");
        let resources = tempdir().expect("tempdir");
        fs::write(resources.path().join("empty_matrix.txt"), "").unwrap();
        let config = study(dir.path()).with_resources(resources.path());
        let node = RawFileNode::new(config.next("input").next("series.txt"));
        node.save(&mut BuildScope::new(), json!("empty_matrix.txt"), &[])
            .unwrap();
        assert!(dir.path().join("input/series.txt").is_file());
    }

    #[test]
    fn test_save_rejects_escaping_references() {
        let dir = tempdir().expect("tempdir");
        let outside = tempdir().expect("tempdir");
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        let resources = dir.path().join("settings/resources");
        let config = study(dir.path()).with_resources(&resources);
        let node = RawFileNode::new(config.next("settings").next("comments.txt"));
        let mut scope = BuildScope::new();

        let escaping = [
            "file/../../etc/passwd".to_string(),
            format!("file/../{}/secret.txt", outside.path().display()),
            format!("file/{}", outside.path().join("secret.txt").display()),
            "../../comments.txt".to_string(),
            outside.path().join("secret.txt").display().to_string(),
        ];
        for reference in escaping {
            let err = node.save(&mut scope, json!(reference.clone()), &[]).unwrap_err();
            assert!(matches!(err, Error::TypeCoercion { .. }), "{reference}: {err:?}");
        }
        assert_eq!(fs::read_to_string(dir.path().join("settings/comments.txt")).unwrap(), "hello");

        node.save(&mut scope, json!("file/./settings/resources/study.ico"), &[])
            .unwrap();
        assert_eq!(fs::read(dir.path().join("settings/comments.txt")).unwrap(), b"\x00\x01icon");
    }

    #[test]
    fn test_save_without_source() {
        let dir = tempdir().expect("tempdir");
        let node = RawFileNode::new(study(dir.path()).next("x.txt"));
        let mut scope = BuildScope::new();
        assert!(matches!(
            node.save(&mut scope, json!("study.ico"), &[]).unwrap_err(),
            Error::BackingFileMissing { .. }
        ));
        assert!(matches!(
            node.save(&mut scope, json!("file/nope.txt"), &[]).unwrap_err(),
            Error::BackingFileMissing { .. }
        ));
        assert!(matches!(
            node.save(&mut scope, json!(12), &[]).unwrap_err(),
            Error::TypeCoercion { .. }
        ));
    }
}
