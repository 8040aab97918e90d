use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Result of a single request attempt, sent from a worker to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// HTTP status, or 0 when no response was received.
    pub status: u16,
    pub latency_ms: u64,
    /// Body plus header bytes; 0 on network failure.
    pub size: u64,
}

impl OutcomeRecord {
    #[must_use]
    pub const fn network_failure(latency_ms: u64) -> Self {
        Self {
            status: 0,
            latency_ms,
            size: 0,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        OutcomeKind::classify(self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    NetworkFailed,
    BadStatus,
}

impl OutcomeKind {
    #[must_use]
    pub const fn classify(status: u16) -> Self {
        match status {
            0 => OutcomeKind::NetworkFailed,
            200..=299 => OutcomeKind::Success,
            _ => OutcomeKind::BadStatus,
        }
    }
}

/// Diagnostic notice for a failed request attempt.
#[derive(Debug, Clone)]
pub struct ErrorNotice {
    pub worker_id: usize,
    pub message: String,
}

/// A response body forwarded for `--dump`. `slot` counts down from the
/// configured budget.
#[derive(Debug, Clone)]
pub struct DumpedBody {
    pub slot: usize,
    pub body: String,
}

/// Shared countdown of how many response bodies may still be dumped.
#[derive(Debug)]
pub struct DumpBudget {
    remaining: AtomicUsize,
}

impl DumpBudget {
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(limit),
        }
    }

    /// Claims one dump slot, returning its number, or `None` once spent.
    pub fn take(&self) -> Option<usize> {
        self.remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |value| {
                value.checked_sub(1)
            })
            .ok()
    }
}

/// Per-worker tallies. Each record has exactly one writer (its worker);
/// the runner reads it when building the final snapshot.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    requests: AtomicU64,
    success: AtomicU64,
    network_failed: AtomicU64,
    bad_failed: AtomicU64,
}

impl WorkerCounters {
    pub fn record(&self, kind: OutcomeKind) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let slot = match kind {
            OutcomeKind::Success => &self.success,
            OutcomeKind::NetworkFailed => &self.network_failed,
            OutcomeKind::BadStatus => &self.bad_failed,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn requests_issued(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            network_failed: self.network_failed.load(Ordering::Relaxed),
            bad_failed: self.bad_failed.load(Ordering::Relaxed),
        }
    }
}

/// One counters record per worker, allocated up front and indexed by worker id.
#[derive(Debug, Clone)]
pub struct WorkerCounterSet {
    slots: Arc<[WorkerCounters]>,
}

impl WorkerCounterSet {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let slots: Vec<WorkerCounters> = (0..workers).map(|_| WorkerCounters::default()).collect();
        Self {
            slots: slots.into(),
        }
    }

    #[must_use]
    pub fn get(&self, worker_id: usize) -> Option<&WorkerCounters> {
        self.slots.get(worker_id)
    }

    /// Sums every worker's counters.
    #[must_use]
    pub fn merged(&self) -> CounterSnapshot {
        self.slots
            .iter()
            .map(WorkerCounters::snapshot)
            .fold(CounterSnapshot::default(), CounterSnapshot::merge)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub requests: u64,
    pub success: u64,
    pub network_failed: u64,
    pub bad_failed: u64,
}

impl CounterSnapshot {
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            requests: self.requests.saturating_add(other.requests),
            success: self.success.saturating_add(other.success),
            network_failed: self.network_failed.saturating_add(other.network_failed),
            bad_failed: self.bad_failed.saturating_add(other.bad_failed),
        }
    }
}
