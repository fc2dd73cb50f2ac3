//! Post-analysis navigation over a sized tree (spec §4.G).
//!
//! A [`Navigator`] wraps anything implementing [`Sizer`] — a finished
//! [`crate::core::sizer::SequentialSizer`] or [`crate::core::coordinator::Coordinator`]
//! — and walks its [`DirTree`] the way a shell's `cd` walks a filesystem.
//! `cd` is path-based: it resolves the target against the current
//! directory and the analysis root, and only falls back to a fresh
//! analysis when the target actually requires one — re-entering anything
//! already analysed never triggers a re-scan.

use std::path::{Component, Path, PathBuf};

use crate::core::error::EngineError;
use crate::core::node::{relative_components, NodeId};
use crate::core::sizer::Sizer;

pub struct Navigator<S: Sizer> {
    sizer: S,
    /// Absolute paths from the analysis root `B` (inclusive) down to the
    /// current directory `C` (inclusive). Always has at least one element.
    dir_chain: Vec<PathBuf>,
}

impl<S: Sizer> Navigator<S> {
    /// Wrap a sizer whose analysis has already completed at `sizer.root_path()`.
    pub fn new(sizer: S) -> Self {
        let root = sizer.root_path().to_path_buf();
        Self {
            sizer,
            dir_chain: vec![root],
        }
    }

    pub fn current_dir_path(&self) -> &Path {
        self.dir_chain.last().expect("dir_chain is never empty")
    }

    fn base_root(&self) -> PathBuf {
        self.sizer.root_path().to_path_buf()
    }

    fn current_node_id(&self) -> NodeId {
        self.node_id_for(self.current_dir_path())
    }

    fn node_id_for(&self, path: &Path) -> NodeId {
        let components = relative_components(self.sizer.root_path(), path);
        let mut cur = self.sizer.tree().root;
        for name in &components {
            match self.sizer.tree().child(cur, name) {
                Some(id) => cur = id,
                None => return cur, // unreachable given a validated dir_chain
            }
        }
        cur
    }

    /// `(size, files_size, incomplete)` for the current directory.
    pub fn current_summary(&self) -> (u64, u64, bool) {
        let id = self.current_node_id();
        let node = self.sizer.tree().node(id);
        (node.size, node.files_size, self.sizer.tree().is_incomplete_at(id))
    }

    /// Immediate children of the current directory, sorted by descending
    /// size (ties broken by name) — the listing `cdi`'s index refers into.
    pub fn current_children_sorted(&self) -> Vec<(String, u64, u64, bool)> {
        self.sizer.tree().sorted_children(self.current_node_id())
    }

    /// Descend one level into the named child of the current directory,
    /// which must already be part of the analysed tree. Used internally by
    /// `cd`/`cdi`'s stepwise descent; leaves `dir_chain` unchanged on
    /// failure.
    fn descend_child(&mut self, name: &str) -> Result<(), EngineError> {
        let current = self.current_node_id();
        match self.sizer.tree().child(current, name) {
            Some(_) => {
                self.dir_chain.push(self.current_dir_path().join(name));
                Ok(())
            }
            None => Err(EngineError::InvalidNavigation(format!("no such child: {name}"))),
        }
    }

    /// Navigate by index into [`Self::current_children_sorted`]'s ordering,
    /// per spec §4.G: `None` resets to the analysis root; a negative index
    /// pops `|i|` names off the chain (clamped at the root, never an
    /// error); a non-negative index descends into that child.
    pub fn cdi(&mut self, index: Option<i64>) -> Result<(), EngineError> {
        match index {
            None => {
                self.dir_chain = vec![self.base_root()];
                Ok(())
            }
            Some(i) if i < 0 => {
                let pop = (-i) as usize;
                let keep = self.dir_chain.len().saturating_sub(pop).max(1);
                self.dir_chain.truncate(keep);
                Ok(())
            }
            Some(i) => {
                let idx = i as usize;
                let children = self.current_children_sorted();
                let Some((name, ..)) = children.get(idx) else {
                    return Err(EngineError::InvalidNavigation(format!("index out of range: {idx}")));
                };
                let name = name.clone();
                self.descend_child(&name)
            }
        }
    }

    /// Resolve and move to `path` per spec §4.G's full `cd` algorithm.
    ///
    /// `None` (or an empty path) resets to the analysis root `B`. A
    /// relative `path` is made absolute against the current directory `C`
    /// first. The result is then classified against `C` and `B`:
    ///
    /// - disjoint from `C` (neither is an ancestor of the other): start a
    ///   fresh analysis rooted at `path`, no reuse.
    /// - equal to `B`: just clear the dir chain back to the root.
    /// - strictly inside `B`: clear the chain, then descend component by
    ///   component (failing if some component was never analysed).
    /// - strictly containing `B` (i.e. `B` is inside `path`): start a
    ///   fresh analysis rooted at `path`, handing the whole current master
    ///   subtree into the sizer's reuse slot so it's grafted, not rescanned.
    pub fn cd(&mut self, path: Option<&Path>) -> Result<(), EngineError> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            self.dir_chain = vec![self.base_root()];
            return Ok(());
        };

        let current = self.current_dir_path().to_path_buf();
        let base = self.base_root();
        let absolute = lexically_normalize(&if path.is_absolute() { path.to_path_buf() } else { current.join(path) });

        let disjoint = !current.starts_with(&absolute) && !absolute.starts_with(&current);
        if disjoint {
            self.sizer.set_root(&absolute)?;
            self.sizer.run()?;
            self.dir_chain = vec![absolute];
            return Ok(());
        }

        if absolute == base {
            self.dir_chain = vec![base];
            return Ok(());
        }

        if absolute.starts_with(&base) {
            // Strictly inside B (equality already handled above): descend
            // component by component, validating the whole path atomically.
            let components = relative_components(&base, &absolute);
            let mut cur = self.sizer.tree().root;
            let mut chain = vec![base];
            for name in &components {
                match self.sizer.tree().child(cur, name) {
                    Some(id) => {
                        cur = id;
                        chain.push(chain.last().unwrap().join(name));
                    }
                    None => {
                        return Err(EngineError::InvalidNavigation(format!("not analysed: {}", absolute.display())));
                    }
                }
            }
            self.dir_chain = chain;
            return Ok(());
        }

        // B strictly inside `absolute`: widen the analysis, reusing the
        // current master tree instead of rescanning it.
        let stocked = self.sizer.tree().clone();
        self.sizer.reuse(stocked, base);
        self.sizer.set_root(&absolute)?;
        self.sizer.run()?;
        self.dir_chain = vec![absolute];
        Ok(())
    }

    pub fn sizer(&self) -> &S {
        &self.sizer
    }

    pub fn into_sizer(self) -> S {
        self.sizer
    }
}

/// Collapse `.`/`..` components without touching the filesystem.
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sizer::SequentialSizer;

    fn analyzed(dir: &Path) -> Navigator<SequentialSizer> {
        std::fs::create_dir(dir.join("a")).unwrap();
        std::fs::write(dir.join("a").join("f"), vec![0u8; 10]).unwrap();
        std::fs::create_dir(dir.join("a").join("deep")).unwrap();
        std::fs::write(dir.join("a").join("deep").join("g"), vec![0u8; 5]).unwrap();
        std::fs::create_dir(dir.join("b")).unwrap();

        let mut sizer = SequentialSizer::new();
        sizer.set_root(dir).unwrap();
        sizer.run().unwrap();
        Navigator::new(sizer)
    }

    #[test]
    fn cd_descends_and_relative_dotdot_climbs_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());

        nav.cd(Some(Path::new("a"))).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path().join("a"));
        nav.cd(Some(Path::new("deep"))).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path().join("a").join("deep"));
        nav.cd(Some(Path::new(".."))).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path().join("a"));
    }

    #[test]
    fn cd_none_resets_to_the_analysis_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        nav.cd(Some(Path::new("a"))).unwrap();
        nav.cd(None).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path());
    }

    #[test]
    fn cd_to_unanalysed_child_leaves_chain_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        let before = nav.current_dir_path().to_path_buf();
        let err = nav.cd(Some(Path::new("nope"))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidNavigation(_)));
        assert_eq!(nav.current_dir_path(), before);
    }

    #[test]
    fn cd_to_base_root_clears_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        nav.cd(Some(Path::new("a"))).unwrap();
        nav.cd(Some(Path::new("deep"))).unwrap();
        nav.cd(Some(dir.path())).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path());
    }

    #[test]
    fn cd_absolute_descendant_validates_the_whole_path_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        nav.cd(Some(&dir.path().join("a").join("deep"))).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path().join("a").join("deep"));

        let before = nav.current_dir_path().to_path_buf();
        let err = nav.cd(Some(&dir.path().join("a").join("ghost"))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidNavigation(_)));
        assert_eq!(nav.current_dir_path(), before);
    }

    #[test]
    fn cd_to_disjoint_path_starts_a_fresh_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());

        let elsewhere = tempfile::tempdir().unwrap();
        std::fs::write(elsewhere.path().join("only.bin"), vec![0u8; 7]).unwrap();

        nav.cd(Some(elsewhere.path())).unwrap();
        assert_eq!(nav.current_dir_path(), elsewhere.path());
        let (size, ..) = nav.current_summary();
        assert_eq!(size, 7);
    }

    #[test]
    fn cd_to_an_ancestor_of_the_root_reuses_the_master_subtree() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("outside.bin"), vec![0u8; 3]).unwrap();
        let inner = outer.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(inner.join("inside.bin"), vec![0u8; 9]).unwrap();

        let mut sizer = SequentialSizer::new();
        sizer.set_root(&inner).unwrap();
        sizer.run().unwrap();
        let mut nav = Navigator::new(sizer);

        nav.cd(Some(outer.path())).unwrap();
        assert_eq!(nav.current_dir_path(), outer.path());
        let (size, ..) = nav.current_summary();
        assert_eq!(size, 3 + 9, "the previously analysed inner subtree was grafted in, not rescanned");
    }

    #[test]
    fn cdi_descends_by_descending_size_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        // "a" (15 bytes) sorts before "b" (0 bytes).
        nav.cdi(Some(0)).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path().join("a"));
    }

    #[test]
    fn cdi_none_resets_to_root_and_negative_pops_levels() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        nav.cd(Some(Path::new("a"))).unwrap();
        nav.cd(Some(Path::new("deep"))).unwrap();

        nav.cdi(Some(-1)).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path().join("a"));

        nav.cdi(None).unwrap();
        assert_eq!(nav.current_dir_path(), dir.path());
    }

    #[test]
    fn cdi_negative_past_root_clamps_instead_of_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let mut nav = analyzed(dir.path());
        nav.cd(Some(Path::new("a"))).unwrap();
        assert!(nav.cdi(Some(-50)).is_ok());
        assert_eq!(nav.current_dir_path(), dir.path());
    }
}
