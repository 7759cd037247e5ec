//! Inbound Ports (Driving Ports)
//!
//! Implemented by `SensorDaemon`, driven by the registration HTTP service.

use pc_01_bloom_filter::MetricsSnapshot;
use serde::{Deserialize, Serialize};

use crate::domain::{Consumer, EpochWindow};

/// Point-in-time view of the daemon
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub epoch_index: u64,
    pub window: EpochWindow,
    /// Set bits in the live filter
    pub set_bits: usize,
    pub filter_size_bits: usize,
    pub detections: u64,
    pub active_consumers: usize,
    pub pending_registrations: usize,
    pub pending_unregistrations: usize,
    /// Filter counters since the daemon started
    pub filter: MetricsSnapshot,
}

/// Consumer (de)registration
///
/// Requests are queued for the current epoch and take effect at the next
/// rotation. Implementations must not block on rotation or network I/O.
pub trait ConsumerRegistry: Send + Sync {
    fn enqueue_registration(&self, consumer: Consumer);

    fn enqueue_unregistration(&self, consumer: Consumer);

    fn status(&self) -> DaemonStatus;
}
