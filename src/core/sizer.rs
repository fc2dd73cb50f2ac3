//! Single-threaded sizing engine (spec §4.C) and the [`Sizer`] trait shared
//! with [`crate::core::coordinator::Coordinator`] so callers can swap
//! between sequential and parallel analysis behind one interface.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::core::cache::{graft_subtree, graft_summary, InsertionCache};
use crate::core::error::EngineError;
use crate::core::node::{DirTree, Node, NodeId};
use crate::core::scanner::scan;

/// Common surface exposed by both [`SequentialSizer`] and
/// [`crate::core::coordinator::Coordinator`] — everything
/// [`crate::core::navigator::Navigator`] needs, and nothing more.
pub trait Sizer {
    /// Start (or restart) an analysis rooted at `root`. Fails only if
    /// `root` itself does not exist; an unreadable-but-present root
    /// completes successfully with `incomplete == true`.
    fn set_root(&mut self, root: &Path) -> Result<(), EngineError>;

    /// Run to completion. Idempotent once finished.
    fn run(&mut self) -> Result<(), EngineError>;

    /// Hand a previously computed subtree, rooted at the absolute path
    /// `subtree_path`, to this sizer for grafting in place of a rescan once
    /// the traversal reaches that path (spec §4.C "stock"/reuse, §4.G).
    /// Must be called before [`Self::run`]; consumed at most once.
    fn reuse(&mut self, subtree: DirTree, subtree_path: PathBuf);

    /// Post-order pass setting every node's derived `size`. `run()` already
    /// calls this once internally; exposed so a caller merging several
    /// completed analyses (the coordinator) can re-roll after merging.
    fn roll_up(&mut self);

    fn tree(&self) -> &DirTree;

    fn root_path(&self) -> &Path;
}

/// Depth-first-by-time-of-return, single-threaded sizer (spec §4.C). Also
/// the primitive [`crate::core::worker::Worker`] drives locally between
/// `Share` checkpoints: its `step`/`queue_len`/`peel_tail` methods are the
/// vocabulary the work-stealing protocol is built from.
pub struct SequentialSizer {
    root: PathBuf,
    tree: DirTree,
    cache: InsertionCache,
    /// FIFO work list: the *front* is removed next; a scanned directory's
    /// subdirectories are *prepended* to the front, so traversal behaves
    /// depth-first across levels but breadth-first within one directory's
    /// children (spec §4.C).
    queue: VecDeque<PathBuf>,
    /// A subtree handed in via [`Sizer::reuse`], consumed the first time
    /// the work list's front matches its path.
    stock: Option<(PathBuf, DirTree)>,
    finished: bool,
}

impl SequentialSizer {
    pub fn new() -> Self {
        Self {
            root: PathBuf::new(),
            tree: DirTree::new(),
            cache: InsertionCache::new(),
            queue: VecDeque::new(),
            stock: None,
            finished: true,
        }
    }

    /// Number of directories still queued for this sizer alone.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return up to `n` paths from the *tail* (back) of the
    /// queue, for handing to an idle peer. The front of the queue — the
    /// work about to be processed next — is never touched, preserving the
    /// caller's own traversal locality (spec §4.E/§9).
    pub fn peel_tail(&mut self, n: usize) -> Vec<PathBuf> {
        let take = n.min(self.queue.len());
        let mut peeled = Vec::with_capacity(take);
        for _ in 0..take {
            match self.queue.pop_back() {
                Some(path) => peeled.push(path),
                None => break,
            }
        }
        peeled.reverse();
        peeled
    }

    /// Hand paths received from a peer (or a fresh assignment) into this
    /// sizer's queue.
    pub fn accept(&mut self, paths: Vec<PathBuf>) {
        self.queue.extend(paths);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Scan and graft one queued directory, prepending its subdirectories.
    /// If the queue's front matches a stocked path, the stocked subtree is
    /// grafted instead of rescanning. Returns `false` once the queue is
    /// empty (nothing stepped).
    pub fn step(&mut self) -> bool {
        let Some(path) = self.queue.pop_front() else {
            return false;
        };

        if matches!(&self.stock, Some((stocked_path, _)) if *stocked_path == path) {
            let (_, stocked_tree) = self.stock.take().expect("just matched Some above");
            graft_subtree(&mut self.tree, &mut self.cache, &self.root, &path, &stocked_tree);
            return true;
        }

        let outcome = scan(&path);
        graft_summary(&mut self.tree, &mut self.cache, &self.root, &path, outcome.files_size, outcome.incomplete);
        for subdir in outcome.subdirs.into_iter().rev() {
            self.queue.push_front(subdir);
        }
        true
    }

    /// Run up to `burst` steps, or until the queue drains, whichever comes
    /// first (spec §5's busy-worker burst size).
    pub fn step_burst(&mut self, burst: usize) -> usize {
        let mut done = 0;
        while done < burst && self.step() {
            done += 1;
        }
        done
    }

    fn node_for_path(&self, path: &Path) -> Option<NodeId> {
        if path == self.root {
            return Some(self.tree.root);
        }
        let components = crate::core::node::relative_components(&self.root, path);
        let mut cur = self.tree.root;
        for name in &components {
            cur = self.tree.child(cur, name)?;
        }
        Some(cur)
    }

    pub fn node_at(&self, path: &Path) -> Option<&Node> {
        self.node_for_path(path).map(|id| self.tree.node(id))
    }
}

impl Default for SequentialSizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sizer for SequentialSizer {
    fn set_root(&mut self, root: &Path) -> Result<(), EngineError> {
        if std::fs::symlink_metadata(root).is_err() {
            return Err(EngineError::RootNotFound(root.to_path_buf()));
        }
        self.root = root.to_path_buf();
        self.tree = DirTree::new();
        self.cache = InsertionCache::new();
        self.queue = VecDeque::from([root.to_path_buf()]);
        self.finished = false;
        Ok(())
    }

    fn run(&mut self) -> Result<(), EngineError> {
        if self.finished {
            return Ok(());
        }
        while self.step() {}
        self.roll_up();
        self.finished = true;
        Ok(())
    }

    fn reuse(&mut self, subtree: DirTree, subtree_path: PathBuf) {
        self.stock = Some((subtree_path, subtree));
    }

    fn roll_up(&mut self) {
        self.tree.roll_up();
    }

    fn tree(&self) -> &DirTree {
        &self.tree
    }

    fn root_path(&self) -> &Path {
        &self.root
    }
}
