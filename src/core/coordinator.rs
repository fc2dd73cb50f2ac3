//! Parallel, work-stealing analysis coordinator (spec §4.F, §5, §7).
//!
//! One thread per [`crate::core::worker`] plus this coordinator, talking
//! over channel pairs. The coordinator never touches a node mutably while a
//! worker might also touch it — trees are merged by value once a worker
//! reports `Done`, grafted via the same insertion cache the sequential
//! sizer uses (spec §4.D). At most one `Share` request is ever outstanding
//! pool-wide, matching spec §5's load-balancing invariant.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::cache::{graft_subtree, InsertionCache};
use crate::core::config::EngineConfig;
use crate::core::error::EngineError;
use crate::core::node::DirTree;
use crate::core::sizer::Sizer;
use crate::core::worker::{self, FromWorker, ToWorker, WorkerHandle};

/// An in-flight load-balancing request, with the two-phase expiry spec
/// §4.F describes: the clock elapsing only *flags* it as expired; it is
/// discarded on the following pass, so a `ShareResponse` racing the clock
/// is never dropped on the same tick it expires.
struct PendingShare {
    worker: usize,
    expiration: Instant,
    expired: bool,
}

pub struct Coordinator {
    config: EngineConfig,
    root: PathBuf,
    workers: Vec<WorkerHandle>,
    pending_share: Option<PendingShare>,
    /// A subtree handed in via [`Sizer::reuse`], attached to the very next
    /// `Process` sent to worker 0 in [`Sizer::set_root`].
    stock: Option<(PathBuf, DirTree)>,
    master: DirTree,
    master_cache: InsertionCache,
    finished: bool,
}

impl Coordinator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            root: PathBuf::new(),
            workers: Vec::new(),
            pending_share: None,
            stock: None,
            master: DirTree::new(),
            master_cache: InsertionCache::new(),
            finished: true,
        }
    }

    fn expire_pending_share(&mut self) {
        let Some(pending) = &mut self.pending_share else { return };
        if pending.expired {
            self.pending_share = None;
        } else if Instant::now() >= pending.expiration {
            pending.expired = true;
        }
    }

    fn handle_message(&mut self, id: usize, msg: FromWorker) {
        match msg {
            FromWorker::Done { path, subtree } => {
                graft_subtree(&mut self.master, &mut self.master_cache, &self.root, &path, &subtree);
                if let Some(w) = self.workers.iter_mut().find(|w| w.id == id) {
                    w.is_idle = true;
                    w.task_count += 1;
                }
                tracing::debug!(worker = id, path = %path.display(), "grafted completed assignment");
            }
            FromWorker::ShareResponse { paths } => {
                let matched = self.pending_share.as_ref().map(|p| p.worker == id).unwrap_or(false);
                if !matched {
                    tracing::warn!(worker = id, "discarding unexpected ShareResponse");
                    return;
                }
                self.pending_share = None;

                let idle_ids: Vec<usize> = self.workers.iter().filter(|w| w.is_idle).map(|w| w.id).collect();
                for (target_id, path) in idle_ids.into_iter().zip(paths) {
                    if let Some(target) = self.workers.iter_mut().find(|w| w.id == target_id) {
                        if target.to_worker.send(ToWorker::Process { path, stock: None }).is_ok() {
                            target.is_idle = false;
                            tracing::debug!(worker = target_id, "assigned peeled work");
                        }
                    }
                }
            }
        }
    }

    /// If some worker is idle, nothing is already pending, and some other
    /// worker is busy, ask that busy worker to give up to `idle_count`
    /// paths (spec §4.F).
    fn try_balance(&mut self) {
        if self.pending_share.is_some() {
            return;
        }
        let idle_count = self.workers.iter().filter(|w| w.is_idle).count();
        if idle_count == 0 {
            return;
        }
        let Some(donor) = self.workers.iter().find(|w| !w.is_idle) else {
            return;
        };
        let expiration = Instant::now() + self.config.share_expiration;
        if donor.to_worker.send(ToWorker::Share { n: idle_count, expiration }).is_ok() {
            tracing::debug!(worker = donor.id, n = idle_count, "share requested");
            self.pending_share = Some(PendingShare { worker: donor.id, expiration, expired: false });
        }
    }

    fn all_idle(&self) -> bool {
        self.workers.iter().all(|w| w.is_idle)
    }

    fn check_crashed(&self) -> Option<usize> {
        self.workers.iter().find(|w| w.join.is_finished()).map(|w| w.id)
    }

    fn shutdown(&mut self) {
        for worker in &self.workers {
            let _ = worker.to_worker.send(ToWorker::Quit);
        }
        let deadline = Instant::now() + self.config.quit_grace;
        for worker in self.workers.drain(..) {
            while Instant::now() < deadline {
                match worker.from_worker.recv_timeout(self.config.idle_poll_interval) {
                    Ok(FromWorker::Done { path, subtree }) => {
                        graft_subtree(&mut self.master, &mut self.master_cache, &self.root, &path, &subtree);
                        break;
                    }
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
            // Best-effort join; a worker that missed the grace window is
            // dropped unjoined. Safe Rust has no forced-kill primitive, so
            // this is the practical substitute for "terminate".
            if worker.join.is_finished() {
                let _ = worker.join.join();
            }
        }
    }
}

impl Sizer for Coordinator {
    fn set_root(&mut self, root: &Path) -> Result<(), EngineError> {
        if std::fs::symlink_metadata(root).is_err() {
            return Err(EngineError::RootNotFound(root.to_path_buf()));
        }

        self.root = root.to_path_buf();
        self.master = DirTree::new();
        self.master_cache = InsertionCache::new();
        self.pending_share = None;

        let count = self.config.resolved_worker_count().max(1);
        self.workers = (0..count)
            .map(|id| worker::spawn(id, self.config.idle_poll_interval, self.config.busy_burst))
            .collect();

        if let Some(first) = self.workers.first_mut() {
            let stock = self.stock.take();
            if first.to_worker.send(ToWorker::Process { path: root.to_path_buf(), stock }).is_ok() {
                first.is_idle = false;
            }
        }

        self.finished = false;
        tracing::info!(root = %root.display(), workers = count, "analysis started");
        Ok(())
    }

    fn run(&mut self) -> Result<(), EngineError> {
        if self.finished {
            return Ok(());
        }

        loop {
            if let Some(crashed) = self.check_crashed() {
                self.shutdown();
                return Err(EngineError::WorkerCrash { worker: crashed });
            }

            let ids: Vec<usize> = self.workers.iter().map(|w| w.id).collect();
            let mut any_message = false;
            for id in ids {
                let Some(idx) = self.workers.iter().position(|w| w.id == id) else { continue };
                while let Ok(msg) = self.workers[idx].from_worker.try_recv() {
                    any_message = true;
                    self.handle_message(id, msg);
                }
            }

            self.expire_pending_share();

            if self.all_idle() && self.pending_share.is_none() {
                break;
            }

            self.try_balance();

            if !any_message && self.workers.iter().all(|w| !w.is_idle) {
                std::thread::sleep(self.config.coordinator_tick);
            }
        }

        self.shutdown();
        self.master.roll_up();
        self.finished = true;
        tracing::info!(root = %self.root.display(), "analysis finished");
        Ok(())
    }

    fn reuse(&mut self, subtree: DirTree, subtree_path: PathBuf) {
        self.stock = Some((subtree_path, subtree));
    }

    fn roll_up(&mut self) {
        self.master.roll_up();
    }

    fn tree(&self) -> &DirTree {
        &self.master
    }

    fn root_path(&self) -> &Path {
        &self.root
    }
}
