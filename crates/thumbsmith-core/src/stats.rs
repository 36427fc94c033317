//! Run statistics and the shared counters behind them.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate accounting for one pipeline run.
///
/// Zeroed at run start, read once at run completion. Failed-item counts are
/// carried explicitly so a caller can audit `inputs == fetched + failed`
/// without diffing directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Total bytes staged by the fetch stage
    pub downloaded_bytes: u64,

    /// Total bytes of encoded variants written by the resize stage
    pub produced_bytes: u64,

    /// Number of variant files written
    pub variants_written: u64,

    /// Sources that could not be fetched
    pub fetch_failures: u64,

    /// Artifacts that could not be resized
    pub resize_failures: u64,
}

/// Shared counters, incremented from any worker.
///
/// All mutation goes through atomic adds, so no two concurrent increments
/// can be lost: the final snapshot equals the exact sum of per-worker
/// contributions regardless of worker count.
#[derive(Debug, Default)]
pub struct Counters {
    downloaded_bytes: AtomicU64,
    produced_bytes: AtomicU64,
    variants_written: AtomicU64,
    fetch_failures: AtomicU64,
    resize_failures: AtomicU64,
}

impl Counters {
    /// Create a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record bytes staged by a fetch worker.
    pub fn add_downloaded(&self, bytes: u64) {
        self.downloaded_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record bytes of encoded variants written by a resize worker.
    pub fn add_produced(&self, bytes: u64) {
        self.produced_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record `n` variant files written.
    pub fn add_variants(&self, n: u64) {
        self.variants_written.fetch_add(n, Ordering::Relaxed);
    }

    /// Record one source that could not be fetched.
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one artifact that could not be resized.
    pub fn record_resize_failure(&self) {
        self.resize_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters into a [`RunStats`].
    pub fn snapshot(&self) -> RunStats {
        RunStats {
            downloaded_bytes: self.downloaded_bytes.load(Ordering::Relaxed),
            produced_bytes: self.produced_bytes.load(Ordering::Relaxed),
            variants_written: self.variants_written.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            resize_failures: self.resize_failures.load(Ordering::Relaxed),
        }
    }
}
