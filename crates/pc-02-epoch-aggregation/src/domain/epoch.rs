//! Per-epoch state
//!
//! An `EpochState` is live for exactly one window. Rotation replaces it
//! wholesale and turns the old one into an `EpochSnapshot`, which nothing
//! mutates afterwards.

use chrono::{DateTime, Duration, Utc};
use pc_01_bloom_filter::{estimate_count, BloomFilter, FilterParams};
use serde::{Deserialize, Serialize};

use super::consumer::{Consumer, PendingChanges};

/// Time bounds of an epoch, unix seconds, `[start, end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochWindow {
    pub start: i64,
    pub end: i64,
}

impl EpochWindow {
    /// Window beginning at `start` and nominally lasting `interval`
    pub fn starting_at(start: DateTime<Utc>, interval: Duration) -> Self {
        let start = start.timestamp();
        Self {
            start,
            end: start.saturating_add(interval.num_seconds()),
        }
    }

    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }
}

/// Mutable record of the epoch currently accumulating observations
#[derive(Clone, Debug)]
pub struct EpochState {
    index: u64,
    window: EpochWindow,
    filter: BloomFilter,
    pending: PendingChanges,
    detections: u64,
}

impl EpochState {
    /// Fresh epoch with an empty filter and no pending changes
    pub fn new(index: u64, params: &FilterParams, window: EpochWindow) -> Self {
        Self {
            index,
            window,
            filter: BloomFilter::with_params(params),
            pending: PendingChanges::default(),
            detections: 0,
        }
    }

    /// Record a sighting; returns true if the identifier is new this epoch
    ///
    /// A false positive in the filter makes a new identifier look seen; it
    /// is then not counted as a detection.
    pub fn observe(&mut self, identifier: &[u8]) -> bool {
        if self.filter.check(identifier) {
            return false;
        }
        self.filter.add(identifier);
        self.detections += 1;
        true
    }

    pub fn enqueue_registration(&mut self, consumer: Consumer) {
        self.pending.registrations.insert(consumer);
    }

    pub fn enqueue_unregistration(&mut self, consumer: Consumer) {
        self.pending.unregistrations.insert(consumer);
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn window(&self) -> EpochWindow {
        self.window
    }

    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }

    /// Close this epoch
    ///
    /// Returns the immutable snapshot addressed to `audience` and the
    /// pending changes to apply at this boundary.
    pub fn close(self, audience: Vec<Consumer>) -> (EpochSnapshot, PendingChanges) {
        let snapshot = EpochSnapshot {
            index: self.index,
            window: self.window,
            filter: self.filter,
            consumers: audience,
            detections: self.detections,
        };
        (snapshot, self.pending)
    }
}

/// A closed epoch, ready for reporting
#[derive(Clone, Debug)]
pub struct EpochSnapshot {
    pub index: u64,
    pub window: EpochWindow,
    pub filter: BloomFilter,
    /// Consumers that were active for the whole epoch
    pub consumers: Vec<Consumer>,
    /// First sightings recorded during the epoch
    pub detections: u64,
}

impl EpochSnapshot {
    /// Estimated distinct devices, `None` if the filter saturated
    pub fn estimated_count(&self) -> Option<u64> {
        estimate_count(&self.filter).ok()
    }

    pub fn consumer_ids(&self) -> Vec<&str> {
        self.consumers.iter().map(|c| c.id.as_str()).collect()
    }
}
