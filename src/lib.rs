//! Parallel directory-tree sizing engine.
//!
//! This crate is the core of an interactive disk-usage explorer: given a
//! root directory it computes the total on-disk size of every directory in
//! the subtree, using a pool of worker threads that cooperatively traverse
//! the filesystem with dynamic work-stealing, and exposes incremental
//! navigation over the resulting tree so that re-entering an
//! already-analysed subtree never triggers a re-scan.
//!
//! The interactive shell, the size formatter, and CLI argument parsing are
//! deliberately not part of this crate — see `src/bin/duaengine.rs` for a
//! minimal demonstration binary that wires the engine together.

pub mod core;

pub use crate::core::config::EngineConfig;
pub use crate::core::coordinator::Coordinator;
pub use crate::core::error::EngineError;
pub use crate::core::navigator::Navigator;
pub use crate::core::node::DirTree;
pub use crate::core::sizer::{SequentialSizer, Sizer};
