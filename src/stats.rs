// Lock-free pipeline statistics using atomic operations
//
// Counters live for the lifetime of the client and are never reset.
// Producers increment `submitted`; the dispatch path increments
// `succeeded`/`failed` from whichever task observed the outcome.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Statistics {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one accepted enqueue. Counted regardless of eventual delivery
    /// outcome, including actions dropped by backpressure; calls the
    /// pipeline rejects outright are never counted.
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_succeeded(&self, count: u64) {
        self.succeeded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failed(&self, count: u64) {
        self.failed.fetch_add(count, Ordering::Relaxed);
    }

    /// Get an immutable snapshot of the current counters (lock-free)
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of pipeline statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl StatisticsSnapshot {
    /// Number of actions still in flight (queued or buffered). Once the
    /// pipeline is quiescent, submitted == succeeded + failed.
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.succeeded + self.failed)
    }

    /// True once every submitted action has a recorded outcome.
    pub fn is_drained(&self) -> bool {
        self.submitted == self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_basic_counting() {
        let stats = Statistics::new();

        stats.record_submitted();
        stats.record_submitted();
        stats.record_succeeded(1);
        stats.record_failed(1);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.failed, 1);
        assert!(snapshot.is_drained());
        assert_eq!(snapshot.pending(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let stats = Arc::new(Statistics::new());
        let mut handles = vec![];

        // Stress atomic increments from multiple producer threads
        for _ in 0..10 {
            let stats_clone = Arc::clone(&stats);
            let handle = thread::spawn(move || {
                for j in 0..100 {
                    stats_clone.record_submitted();
                    if j % 2 == 0 {
                        stats_clone.record_succeeded(1);
                    } else {
                        stats_clone.record_failed(1);
                    }
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.submitted, 1000);
        assert_eq!(snapshot.succeeded, 500);
        assert_eq!(snapshot.failed, 500);
        assert!(snapshot.is_drained());
    }

    #[test]
    fn test_pending_never_underflows() {
        let stats = Statistics::new();
        stats.record_succeeded(3);
        assert_eq!(stats.snapshot().pending(), 0);
    }
}
