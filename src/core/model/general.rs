// src/core/model/general.rs
use tracing::debug;

use crate::error::{HexviewError, Result};
use super::super::directory::{base_name, parent_path, DirectoryTree};
use super::super::store::ObjectStore;
use super::group::Group;

/// Grouping that mirrors the raw directory tree
pub struct GeneralModel<'a> {
    tree: &'a DirectoryTree,
    store: &'a ObjectStore,
    root_name: String,
}

impl<'a> GeneralModel<'a> {
    /// `fallback_name` labels the root group when the tree root has no name
    pub fn new(tree: &'a DirectoryTree, store: &'a ObjectStore, fallback_name: &str) -> Self {
        let root_name = if tree.root_name().is_empty() {
            fallback_name.to_string()
        } else {
            tree.root_name().to_string()
        };
        Self {
            tree,
            store,
            root_name,
        }
    }

    /// One group per directory, nested like the directories themselves.
    ///
    /// Parents are looked up by full path, so equally named directories in
    /// different branches stay apart.
    pub fn grouping(&self) -> Result<Group> {
        let root_path = self.tree.root_path().to_string();
        let mut root: Option<Group> = None;

        let outcome = self.tree.walk_root_dir(|path, ids| {
            let objects = self.store.get_objects(ids)?;

            if path == root_path {
                root = Some(Group::new(&self.root_name, path, objects));
                return Ok(());
            }

            let parent = parent_path(path);
            let root_group = root
                .as_mut()
                .ok_or_else(|| HexviewError::NotFound(root_path.clone()))?;
            let parent_group = root_group
                .find_group_mut(parent)
                .ok_or_else(|| HexviewError::NotFound(parent.to_string()))?;

            debug!("Grouping {} ({} objects) under {}", path, objects.len(), parent_group.path);
            parent_group
                .sub_groups
                .push(Group::new(base_name(path), path, objects));
            Ok(())
        });
        outcome.into_result()?;

        root.ok_or(HexviewError::NotFound(root_path))
    }
}
