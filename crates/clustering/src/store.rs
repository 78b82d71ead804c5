//! On-disk seed and working module trees

use modmap_core::error::Result;
use modmap_core::module_tree::ModuleTree;
use modmap_core::persist::{read_json_if_present, write_json_atomic};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Seed tree, written once and reused by later runs
pub const FIRST_MODULE_TREE: &str = "first_module_tree.json";

/// Working tree, replaced after every successful run
pub const MODULE_TREE: &str = "module_tree.json";

/// Module tree files of one output directory.
///
/// Single writer: concurrent runs against the same directory must be
/// serialized by the caller.
#[derive(Debug, Clone)]
pub struct TreeStore {
    output_dir: PathBuf,
}

impl TreeStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn seed_path(&self) -> PathBuf {
        self.output_dir.join(FIRST_MODULE_TREE)
    }

    pub fn working_path(&self) -> PathBuf {
        self.output_dir.join(MODULE_TREE)
    }

    /// Seed tree of a previous run, if one was persisted
    pub fn load_seed(&self) -> Result<Option<ModuleTree>> {
        let seed = read_json_if_present::<ModuleTree>(&self.seed_path())?;
        if let Some(tree) = &seed {
            info!(
                path = %self.seed_path().display(),
                modules = tree.module_count(),
                "Loaded seed module tree"
            );
        }
        Ok(seed)
    }

    /// Persist the seed tree unless one already exists.
    ///
    /// Returns whether the file was written.
    pub fn save_seed(&self, tree: &ModuleTree) -> Result<bool> {
        let path = self.seed_path();
        if path.exists() {
            debug!(path = %path.display(), "Seed module tree already present, not overwriting");
            return Ok(false);
        }
        write_json_atomic(&path, tree)?;
        info!(path = %path.display(), modules = tree.module_count(), "Saved seed module tree");
        Ok(true)
    }

    /// Overwrite the seed tree, used when a persisted seed turned out unusable
    pub fn replace_seed(&self, tree: &ModuleTree) -> Result<()> {
        let path = self.seed_path();
        write_json_atomic(&path, tree)?;
        info!(path = %path.display(), modules = tree.module_count(), "Replaced seed module tree");
        Ok(())
    }

    pub fn save_working(&self, tree: &ModuleTree) -> Result<()> {
        let path = self.working_path();
        write_json_atomic(&path, tree)?;
        debug!(path = %path.display(), "Saved working module tree");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmap_core::module_tree::ModuleNode;

    fn tree(name: &str) -> ModuleTree {
        [ModuleNode::new(name, "", vec!["a.X".to_string()])]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_seed_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = TreeStore::new(dir.path().join("out"));

        assert_eq!(store.load_seed().unwrap(), None);
        assert!(store.save_seed(&tree("First")).unwrap());
        assert!(!store.save_seed(&tree("Second")).unwrap());
        assert_eq!(store.load_seed().unwrap(), Some(tree("First")));
    }

    #[test]
    fn test_working_tree_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = TreeStore::new(dir.path());

        store.save_working(&tree("First")).unwrap();
        store.save_working(&tree("Second")).unwrap();
        let content = std::fs::read_to_string(store.working_path()).unwrap();
        assert!(content.contains("Second"));
        assert!(!content.contains("First"));
    }
}
