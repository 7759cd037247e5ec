//! Counters for filter activity
//!
//! Lock-free so they can be bumped from the capture path right after the
//! epoch lock is released. A snapshot is published on the health endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide filter counters
#[derive(Debug, Default)]
pub struct Metrics {
    /// Filters allocated (one per epoch)
    pub filters_created: AtomicU64,
    /// Bytes currently held by live filters
    pub bytes_allocated: AtomicU64,
    /// Membership checks, one per sighting
    pub lookups: AtomicU64,
    /// Checks that found the item already present (repeat or false positive)
    pub lookups_positive: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record allocation of a filter of `size_bits` bits
    pub fn record_filter_created(&self, size_bits: usize) {
        self.filters_created.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated
            .fetch_add(size_bits.div_ceil(8) as u64, Ordering::Relaxed);
    }

    /// Record release of a filter of `size_bits` bits
    pub fn record_filter_dropped(&self, size_bits: usize) {
        let bytes = size_bits.div_ceil(8) as u64;
        // Saturate instead of wrapping if a drop is recorded twice
        let _ = self
            .bytes_allocated
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    pub fn record_lookup(&self, found: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if found {
            self.lookups_positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            filters_created: self.filters_created.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            lookups_positive: self.lookups_positive.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Metrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub filters_created: u64,
    pub bytes_allocated: u64,
    pub lookups: u64,
    pub lookups_positive: u64,
}

impl MetricsSnapshot {
    /// Fraction of sightings whose item was already in the filter
    pub fn duplicate_ratio(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.lookups_positive as f64 / self.lookups as f64
        }
    }

    /// Sightings that added a new item
    pub fn novel_insertions(&self) -> u64 {
        self.lookups - self.lookups_positive
    }
}
