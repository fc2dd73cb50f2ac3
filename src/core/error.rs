//! Error kinds that are fatal to a single analysis.
//!
//! Per-entry and per-directory access failures are *not* represented here —
//! they are recovered locally by folding into [`crate::core::node::Node::incomplete`]
//! (see `core::scanner`). Only the handful of failures that would otherwise
//! corrupt the tree or leave an analysis half-finished get an `EngineError`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested root does not exist. Fatal only at the top of an
    /// analysis; an unreadable-but-existing root is recovered as
    /// `incomplete` instead (see `core::scanner::scan`).
    #[error("root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// A worker thread died unexpectedly mid-analysis. The whole analysis
    /// is aborted and the master tree discarded; the caller may retry.
    #[error("worker {worker} crashed during analysis")]
    WorkerCrash { worker: usize },

    /// `cd`/`cdi` referenced an index or child name that does not exist.
    /// Navigator state is left unchanged.
    #[error("invalid navigation: {0}")]
    InvalidNavigation(String),
}
