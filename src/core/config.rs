//! Tunables for the coordinator's scheduling loop (spec §5).
//!
//! Every constant here has a spec-mandated default; they're kept as fields
//! rather than hardcoded so tests can shrink the timing windows instead of
//! sleeping through the real ones.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long the coordinator sleeps when every worker is busy and no
    /// message is waiting, before polling liveness again.
    pub idle_poll_interval: Duration,
    /// Number of queued subdirectories a worker drains in one burst before
    /// yielding back to the coordinator's message loop.
    pub busy_burst: usize,
    /// How long a `Share` request may go unanswered before the coordinator
    /// treats it as abandoned and frees the requester to ask again.
    pub share_expiration: Duration,
    /// Sleep between iterations of the coordinator's scheduling loop when
    /// it has nothing better to do.
    pub coordinator_tick: Duration,
    /// Grace period given to a worker after a `Quit` before the coordinator
    /// gives up joining it and drops the handle unjoined.
    pub quit_grace: Duration,
    /// Number of worker threads to spawn. `0` means "use available
    /// parallelism".
    pub worker_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval: Duration::from_millis(200),
            busy_burst: 20,
            share_expiration: Duration::from_secs(5),
            coordinator_tick: Duration::from_secs(1),
            quit_grace: Duration::from_secs(3),
            worker_count: 0,
        }
    }
}

impl EngineConfig {
    /// Resolve `worker_count == 0` against the machine's available
    /// parallelism, the way the original TUI sized its pool.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.idle_poll_interval, Duration::from_millis(200));
        assert_eq!(cfg.busy_burst, 20);
        assert_eq!(cfg.share_expiration, Duration::from_secs(5));
        assert_eq!(cfg.coordinator_tick, Duration::from_secs(1));
        assert_eq!(cfg.quit_grace, Duration::from_secs(3));
    }

    #[test]
    fn explicit_worker_count_is_not_overridden() {
        let cfg = EngineConfig {
            worker_count: 4,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.resolved_worker_count(), 4);
    }
}
