use std::sync::atomic::{AtomicU64, Ordering};

/// Bytes moved across every connection of a run. Incremented by the counting
/// transport on each successful read/write; read once at report time.
#[derive(Debug, Default)]
pub struct ThroughputCounters {
    read: AtomicU64,
    written: AtomicU64,
}

impl ThroughputCounters {
    pub fn add_read(&self, bytes: usize) {
        self.read.fetch_add(to_u64(bytes), Ordering::Relaxed);
    }

    pub fn add_written(&self, bytes: usize) {
        self.written.fetch_add(to_u64(bytes), Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> ThroughputSnapshot {
        ThroughputSnapshot {
            bytes_read: self.read.load(Ordering::Relaxed),
            bytes_written: self.written.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThroughputSnapshot {
    pub bytes_read: u64,
    pub bytes_written: u64,
}

fn to_u64(bytes: usize) -> u64 {
    u64::try_from(bytes).unwrap_or(u64::MAX)
}
