//! In-memory tree of per-directory size aggregates.
//!
//! [`DirTree`] is arena-backed — nodes live in a flat `Vec` and reference
//! each other by index ([`NodeId`]), the same shape the original TUI's
//! `DirTree`/`TreeNode` used for its display tree. Here a node's children
//! are keyed by name (not an ordered `Vec`) because grafting and merging
//! are name-addressed operations, and the arena gives the insertion cache
//! genuine O(1) access to "the node the last graft landed under" without
//! fighting the borrow checker over a recursively-owned structure.

use std::collections::HashMap;
use std::path::{Component, Path};

/// Index into [`DirTree::nodes`].
pub type NodeId = usize;

/// A single directory's aggregate. Mirrors the data model in spec §3:
/// `files_size`, a derived `size`, a monotonic `incomplete` flag, and
/// named children.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Sum of byte lengths of regular files directly inside this directory.
    pub files_size: u64,
    /// `files_size + Σ child.size`. Zero until [`DirTree::roll_up`] runs.
    pub size: u64,
    /// True iff *this* directory's own enumeration hit an access error.
    /// This is deliberately local, not propagated — [`DirTree::is_incomplete_at`]
    /// does the propagating DFS described in spec §3 invariant 2.
    pub incomplete: bool,
    pub children: HashMap<String, NodeId>,
    pub parent: Option<NodeId>,
}

/// Arena-backed tree of [`Node`]s.
#[derive(Debug, Clone)]
pub struct DirTree {
    nodes: Vec<Node>,
    pub root: NodeId,
}

impl Default for DirTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DirTree {
    /// A tree containing only an empty root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            root: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Look up (or create, as an empty placeholder) the child named `name`
    /// under `parent`.
    pub fn ensure_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(&id) = self.nodes[parent].children.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            ..Node::default()
        });
        self.nodes[parent].children.insert(name.to_string(), id);
        id
    }

    /// Walk from the root creating placeholder nodes for every component
    /// that doesn't already exist, returning the final node. An empty slice
    /// returns the root itself.
    pub fn ensure_path(&mut self, components: &[String]) -> NodeId {
        let mut cur = self.root;
        for name in components {
            cur = self.ensure_child(cur, name);
        }
        cur
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent].children.get(name).copied()
    }

    /// Sum `files_size` into `id` and OR its `incomplete` flag — the
    /// per-node half of the merge semantics in spec §4.C, used when
    /// grafting a freshly scanned summary (never has children of its own
    /// yet; those are queued separately).
    pub fn add_summary(&mut self, id: NodeId, files_size: u64, incomplete: bool) {
        let node = self.node_mut(id);
        node.files_size = node.files_size.saturating_add(files_size);
        node.incomplete |= incomplete;
    }

    /// `merge(main, add)` from spec §4.C: `files_size` sums, `incomplete`
    /// ORs, children are unioned (recurse on name collision, graft wholesale
    /// otherwise). `self` is `main`; `other`'s subtree rooted at `other_id`
    /// is merged into `self`'s node `self_id`.
    pub fn merge_at(&mut self, self_id: NodeId, other: &DirTree, other_id: NodeId) {
        let other_node = other.node(other_id);
        self.add_summary(self_id, other_node.files_size, other_node.incomplete);

        for (name, &other_child) in &other_node.children {
            if let Some(existing) = self.child(self_id, name) {
                self.merge_at(existing, other, other_child);
            } else {
                let new_id = self.graft_copy(other, other_child, self_id, name.clone());
                self.nodes[self_id].children.insert(name.clone(), new_id);
            }
        }
    }

    /// Merge an entire other tree into `self` at `self`'s root.
    pub fn merge(&mut self, other: &DirTree) {
        self.merge_at(self.root, other, other.root);
    }

    /// Deep-copy `other`'s subtree rooted at `other_id` into `self` under
    /// `parent`, returning the new node's id.
    fn graft_copy(&mut self, other: &DirTree, other_id: NodeId, parent: NodeId, _name: String) -> NodeId {
        let other_node = other.node(other_id);
        let id = self.nodes.len();
        self.nodes.push(Node {
            files_size: other_node.files_size,
            size: 0,
            incomplete: other_node.incomplete,
            children: HashMap::new(),
            parent: Some(parent),
        });
        for (child_name, &other_child) in &other_node.children {
            let child_id = self.graft_copy(other, other_child, id, child_name.clone());
            self.nodes[id].children.insert(child_name.clone(), child_id);
        }
        id
    }

    /// Post-order pass setting `size = files_size + Σ children.size` for
    /// every node (spec §4.A, invariant 1). Must be called exactly once per
    /// completed analysis, after all grafts, before any reader observes
    /// sizes.
    pub fn roll_up(&mut self) {
        self.roll_up_at(self.root);
    }

    fn roll_up_at(&mut self, id: NodeId) -> u64 {
        let child_ids: Vec<NodeId> = self.nodes[id].children.values().copied().collect();
        let mut total = self.nodes[id].files_size;
        for child_id in child_ids {
            total = total.saturating_add(self.roll_up_at(child_id));
        }
        self.nodes[id].size = total;
        total
    }

    /// Short-circuiting DFS: true iff `id` or any descendant has
    /// `incomplete == true` (spec §3 invariant 2, §4.A).
    pub fn is_incomplete_at(&self, id: NodeId) -> bool {
        if self.nodes[id].incomplete {
            return true;
        }
        self.nodes[id]
            .children
            .values()
            .any(|&child| self.is_incomplete_at(child))
    }

    pub fn is_incomplete_recursive(&self) -> bool {
        self.is_incomplete_at(self.root)
    }

    /// Immediate children of `id`, sorted by descending `size`, ties broken
    /// by ascending name. Only meaningful after [`Self::roll_up`].
    pub fn sorted_children(&self, id: NodeId) -> Vec<(String, u64, u64, bool)> {
        let mut out: Vec<(String, u64, u64, bool)> = self.nodes[id]
            .children
            .iter()
            .map(|(name, &child_id)| {
                let child = &self.nodes[child_id];
                (
                    name.clone(),
                    child.size,
                    child.files_size,
                    self.is_incomplete_at(child_id),
                )
            })
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

/// Split `path` into its component names relative to `root`. Returns an
/// empty vec when `path == root`. Non-`Normal` components (root prefixes,
/// `.`/`..`) are dropped, matching invariant 3 ("never `.`/`..`").
pub fn relative_components(root: &Path, path: &Path) -> Vec<String> {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}
