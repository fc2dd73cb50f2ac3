//! Worker thread loop (spec §4.E, §5).
//!
//! A worker starts Idle (no assignment) and stays that way until the
//! coordinator sends `Process`, which re-roots it at a fresh path and
//! drives it Busy. It alternates bursts of scanning with non-blocking
//! polls of its inbound channel while Busy, and reports `Done` the moment
//! its own local work list drains — not only at teardown. Workers talk to
//! the coordinator over a bidirectional pair of `std::sync::mpsc` channels,
//! mirroring the spawn-a-thread-plus-channel-pair convention the sizing
//! runtime used for its background jobs.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::core::node::DirTree;
use crate::core::sizer::{SequentialSizer, Sizer};

/// Messages the coordinator sends to a worker.
pub enum ToWorker {
    /// Sender promises the worker is Idle. The worker re-roots at `path`,
    /// discarding any previous local tree, and performs one scan
    /// iteration synchronously to seed that root before entering its main
    /// loop. `stock`, when present, is handed to the local sizer's
    /// `reuse()` first — this is how the coordinator's own `reuse()` (spec
    /// §4.G's "B inside path" case, fanned out per `[AMBIENT-TRAIT]`)
    /// reaches the one worker that will actually scan the new root.
    Process {
        path: PathBuf,
        stock: Option<(PathBuf, DirTree)>,
    },
    /// Ask for up to `n` queued paths; ignored outright once `expiration`
    /// has passed.
    Share { n: usize, expiration: Instant },
    Quit,
}

/// Messages a worker sends back to the coordinator.
pub enum FromWorker {
    /// The local work list emptied: the assignment rooted at `path` is
    /// complete. Carries the worker's locally built tree. Transitions the
    /// worker to Idle.
    Done { path: PathBuf, subtree: DirTree },
    /// Reply to a `Share`. Empty if the worker was Idle or had nothing
    /// spare to give.
    ShareResponse { paths: Vec<PathBuf> },
}

/// Coordinator-side handle to a running worker thread, carrying the
/// diagnostic state spec.md §6 says every handle carries: "a boolean
/// `is_idle`, an integer `task_count`, and a channel."
pub struct WorkerHandle {
    pub id: usize,
    pub is_idle: bool,
    pub task_count: usize,
    pub to_worker: Sender<ToWorker>,
    pub from_worker: Receiver<FromWorker>,
    pub join: std::thread::JoinHandle<()>,
}

/// Spawn a worker thread, returning the coordinator's handle to it. The
/// worker starts Idle with no assignment; the coordinator gives it one via
/// `ToWorker::Process`.
pub fn spawn(id: usize, poll_interval: Duration, busy_burst: usize) -> WorkerHandle {
    let (to_tx, to_rx) = std::sync::mpsc::channel();
    let (from_tx, from_rx) = std::sync::mpsc::channel();

    let join = std::thread::Builder::new()
        .name(format!("dua-engine-worker-{id}"))
        .spawn(move || run(id, to_rx, from_tx, poll_interval, busy_burst))
        .expect("failed to spawn worker thread");

    WorkerHandle {
        id,
        is_idle: true,
        task_count: 0,
        to_worker: to_tx,
        from_worker: from_rx,
        join,
    }
}

fn run(id: usize, to_rx: Receiver<ToWorker>, from_tx: Sender<FromWorker>, poll_interval: Duration, busy_burst: usize) {
    let mut sizer: Option<SequentialSizer> = None;
    let mut current_path: Option<PathBuf> = None;

    loop {
        // Idle: block up to poll_interval waiting for an assignment. Busy:
        // never block, so queued work keeps draining between polls.
        let message = if sizer.is_some() {
            match to_rx.try_recv() {
                Ok(m) => Some(m),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return,
            }
        } else {
            match to_rx.recv_timeout(poll_interval) {
                Ok(m) => Some(m),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        };

        match message {
            Some(ToWorker::Process { path, stock }) => {
                tracing::debug!(worker = id, path = %path.display(), "processing assignment");
                let mut next = SequentialSizer::new();
                if next.set_root(&path).is_ok() {
                    if let Some((stock_path, stock_tree)) = stock {
                        next.reuse(stock_tree, stock_path);
                    }
                    next.step();
                }
                current_path = Some(path);
                sizer = Some(next);
            }
            Some(ToWorker::Share { n, expiration }) => {
                if Instant::now() > expiration {
                    continue;
                }
                let paths = match sizer.as_mut() {
                    None => Vec::new(),
                    Some(active) => {
                        let spare = active.queue_len().saturating_sub(1);
                        active.peel_tail(n.min(spare))
                    }
                };
                if from_tx.send(FromWorker::ShareResponse { paths }).is_err() {
                    return;
                }
            }
            Some(ToWorker::Quit) => return,
            None => {}
        }

        if let Some(active) = sizer.as_mut() {
            active.step_burst(busy_burst);
            if active.queue_len() == 0 {
                let mut finished = sizer.take().expect("sizer present in this branch");
                finished.roll_up();
                let path = current_path.take().expect("current_path set alongside sizer");
                let subtree = finished.tree().clone();
                tracing::debug!(worker = id, path = %path.display(), "assignment done");
                if from_tx.send(FromWorker::Done { path, subtree }).is_err() {
                    return;
                }
            }
        }
    }
}
