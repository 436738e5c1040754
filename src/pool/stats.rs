//! Pool statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Snapshot of a pool's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of handles.
    pub capacity: usize,
    /// Handles currently acquired.
    pub in_use: usize,
    /// Successful acquires.
    pub acquisitions: u64,
    /// Acquires served by the free-handle scan.
    pub fast_path: u64,
    /// Acquires that waited on a round-robin handle.
    pub slow_path: u64,
    /// Connects attempted while healing handles.
    pub connect_attempts: u64,
    /// Of those, connects that failed.
    pub connect_failures: u64,
}

impl PoolStats {
    /// Share of handles in use, 0.0 to 1.0.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.in_use as f64 / self.capacity as f64
        }
    }
}

/// Live counters, updated without taking any handle lock.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub in_use: AtomicUsize,
    pub acquisitions: AtomicU64,
    pub fast_path: AtomicU64,
    pub slow_path: AtomicU64,
    pub connect_attempts: AtomicU64,
    pub connect_failures: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, capacity: usize) -> PoolStats {
        PoolStats {
            capacity,
            in_use: self.in_use.load(Ordering::SeqCst),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            fast_path: self.fast_path.load(Ordering::Relaxed),
            slow_path: self.slow_path.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization() {
        let stats = PoolStats {
            capacity: 4,
            in_use: 1,
            ..Default::default()
        };
        assert_eq!(stats.utilization(), 0.25);
        assert_eq!(PoolStats::default().utilization(), 0.0);
    }

    #[test]
    fn test_snapshot() {
        let counters = Counters::default();
        Counters::bump(&counters.acquisitions);
        Counters::bump(&counters.fast_path);
        counters.in_use.fetch_add(1, Ordering::SeqCst);

        let stats = counters.snapshot(2);
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.in_use, 1);
        assert_eq!(stats.acquisitions, 1);
        assert_eq!(stats.fast_path, 1);
        assert_eq!(stats.slow_path, 0);
    }
}
