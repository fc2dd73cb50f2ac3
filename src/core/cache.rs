//! Insertion cache (spec §4.D) — a single-slot optimiser that exploits the
//! sequential sizer's depth-first-by-time-of-return traversal to graft a
//! freshly scanned directory under its parent in O(1) instead of walking
//! from the tree root every time.

use std::path::{Component, Path, PathBuf};

use crate::core::node::{relative_components, DirTree, NodeId};

#[derive(Debug)]
pub struct InsertionCache {
    last_path: Option<PathBuf>,
    last_parent: NodeId,
    hits: u64,
    misses: u64,
}

impl Default for InsertionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InsertionCache {
    pub fn new() -> Self {
        Self {
            last_path: None,
            last_parent: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// `path` strictly extends `last_path` by exactly one path component.
    fn hit_name(&self, path: &Path) -> Option<String> {
        let last = self.last_path.as_ref()?;
        if last.as_os_str().is_empty() {
            return None;
        }
        if path.as_os_str().len() <= last.as_os_str().len() {
            return None;
        }
        let remainder = path.strip_prefix(last).ok()?;
        let mut components = remainder.components();
        let first = components.next()?;
        if components.next().is_some() {
            return None;
        }
        match first {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    /// Resolve the parent node under which `path` should be grafted,
    /// creating placeholder nodes on a miss. Returns `(parent, leaf_name)`;
    /// `leaf_name` is `None` only when `path` is the tree root itself.
    pub fn resolve(&mut self, tree: &mut DirTree, root_path: &Path, path: &Path) -> (NodeId, Option<String>) {
        if path == root_path {
            self.last_path = Some(path.to_path_buf());
            self.last_parent = tree.root;
            return (tree.root, None);
        }

        let (parent, leaf) = if let Some(name) = self.hit_name(path) {
            self.hits += 1;
            (self.last_parent, name)
        } else {
            self.misses += 1;
            let components = relative_components(root_path, path);
            let split = components.len().saturating_sub(1);
            let (ancestors, leaf) = components.split_at(split);
            let parent = tree.ensure_path(ancestors);
            (parent, leaf.first().cloned().unwrap_or_default())
        };

        self.last_path = Some(path.to_path_buf());
        self.last_parent = parent;
        (parent, Some(leaf))
    }
}

/// Graft a freshly scanned summary for `path` into `tree`.
pub fn graft_summary(
    tree: &mut DirTree,
    cache: &mut InsertionCache,
    root_path: &Path,
    path: &Path,
    files_size: u64,
    incomplete: bool,
) {
    let (parent, leaf) = cache.resolve(tree, root_path, path);
    let id = match leaf {
        Some(name) => tree.ensure_child(parent, &name),
        None => tree.root,
    };
    tree.add_summary(id, files_size, incomplete);
}

/// Graft an entire stocked/reused subtree for `path` into `tree`.
pub fn graft_subtree(tree: &mut DirTree, cache: &mut InsertionCache, root_path: &Path, path: &Path, subtree: &DirTree) {
    let (parent, leaf) = cache.resolve(tree, root_path, path);
    let id = match leaf {
        Some(name) => tree.ensure_child(parent, &name),
        None => tree.root,
    };
    tree.merge_at(id, subtree, subtree.root);
}
