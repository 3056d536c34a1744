//! Reindex counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the index coordinator.
#[derive(Default)]
pub struct IndexMetrics {
    units_entered: AtomicU64,
    units_skipped: AtomicU64,
    units_retracted: AtomicU64,
    corrupt_units: AtomicU64,
    classes_entered: AtomicU64,
}

/// Point-in-time copy of [`IndexMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexMetricsSnapshot {
    /// Units decoded and entered into the graph.
    pub units_entered: u64,
    /// Units whose payload matched the cached one.
    pub units_skipped: u64,
    /// Files whose prior contribution was retracted.
    pub units_retracted: u64,
    /// Payloads rejected as corrupt.
    pub corrupt_units: u64,
    /// Classes entered across all units.
    pub classes_entered: u64,
}

impl IndexMetrics {
    /// Reads the counters.
    pub fn snapshot(&self) -> IndexMetricsSnapshot {
        IndexMetricsSnapshot {
            units_entered: self.units_entered.load(Ordering::Relaxed),
            units_skipped: self.units_skipped.load(Ordering::Relaxed),
            units_retracted: self.units_retracted.load(Ordering::Relaxed),
            corrupt_units: self.corrupt_units.load(Ordering::Relaxed),
            classes_entered: self.classes_entered.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn unit_entered(&self, classes: usize) {
        self.units_entered.fetch_add(1, Ordering::Relaxed);
        self.classes_entered.fetch_add(classes as u64, Ordering::Relaxed);
    }

    pub(crate) fn unit_skipped(&self) {
        self.units_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn unit_retracted(&self) {
        self.units_retracted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn corrupt_unit(&self) {
        self.corrupt_units.fetch_add(1, Ordering::Relaxed);
    }
}
