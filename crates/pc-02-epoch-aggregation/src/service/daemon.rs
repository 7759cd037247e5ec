//! Sensor Daemon
//!
//! Owns the live `EpochState` and the active consumer set behind one lock.
//!
//! The lock covers only in-memory work: a filter check/add in `observe`, a
//! set insert when a registration is queued, and the swap-and-apply step of
//! `rotate_epoch`. Nothing that touches the network runs while it is held.
//!
//! Constructing a `SensorDaemon` is the Idle -> Running transition; there is
//! no way back short of dropping it.

use std::mem;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use pc_01_bloom_filter::{calculate_parameters, FilterParams, Metrics, MetricsSnapshot};
use sensor_telemetry::{ACTIVE_CONSUMERS, DETECTIONS, EPOCHS_ROTATED, EPOCH_SET_BITS, PROBE_REQUESTS};
use tracing::{debug, info, warn};

use crate::domain::{CapturedFrame, Consumer, ConsumerSet, EpochSnapshot, EpochState, EpochWindow};
use crate::error::SensorError;
use crate::ports::{ConsumerRegistry, DaemonStatus};

struct DaemonState {
    epoch: EpochState,
    consumers: ConsumerSet,
}

/// Epoch aggregation daemon
pub struct SensorDaemon {
    params: FilterParams,
    interval: Duration,
    state: Mutex<DaemonState>,
    metrics: Metrics,
}

impl SensorDaemon {
    /// Start the first epoch now
    ///
    /// # Errors
    /// `Filter` if `capacity` or `false_positive_rate` are invalid.
    pub fn init(
        capacity: usize,
        false_positive_rate: f64,
        interval: Duration,
    ) -> Result<Self, SensorError> {
        Self::init_at(capacity, false_positive_rate, interval, Utc::now())
    }

    /// As [`SensorDaemon::init`], with the first epoch starting at `now`
    pub fn init_at(
        capacity: usize,
        false_positive_rate: f64,
        interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, SensorError> {
        let params = calculate_parameters(capacity, false_positive_rate)?;
        let metrics = Metrics::new();
        metrics.record_filter_created(params.size_bits);

        let epoch = EpochState::new(0, &params, EpochWindow::starting_at(now, interval));
        info!(
            size_bits = params.size_bits,
            hash_count = params.hash_count,
            capacity,
            false_positive_rate,
            interval_secs = interval.num_seconds(),
            "Sensor daemon running"
        );
        ACTIVE_CONSUMERS.set(0.0);

        Ok(Self {
            params,
            interval,
            state: Mutex::new(DaemonState {
                epoch,
                consumers: ConsumerSet::new(),
            }),
            metrics,
        })
    }

    pub fn filter_params(&self) -> &FilterParams {
        &self.params
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a sighting of `identifier`
    ///
    /// Returns true if it was not yet in this epoch's filter.
    pub fn observe(&self, identifier: &str) -> bool {
        let is_new = {
            let mut state = self.state.lock();
            state.epoch.observe(identifier.as_bytes())
        };

        self.metrics.record_lookup(!is_new);
        if is_new {
            DETECTIONS.inc();
            debug!(source = identifier, "Detection");
        }
        is_new
    }

    /// Observe the source of `frame` if it is a probe request
    ///
    /// Returns `None` for frames that are ignored.
    pub fn observe_frame(&self, frame: &CapturedFrame) -> Option<bool> {
        let source = frame.probe_source()?;
        PROBE_REQUESTS.inc();
        Some(self.observe(&source.to_string()))
    }

    /// Close the current epoch and start the next one now
    pub fn rotate_epoch(&self) -> EpochSnapshot {
        self.rotate_epoch_at(Utc::now())
    }

    /// Close the current epoch; the next one starts at `now`
    ///
    /// The snapshot is addressed to the consumers active during the closed
    /// epoch. Pending (un)registrations are applied in the same critical
    /// section, so they first affect the next epoch's report.
    pub fn rotate_epoch_at(&self, now: DateTime<Utc>) -> EpochSnapshot {
        let (snapshot, active) = {
            let mut state = self.state.lock();
            let next = EpochState::new(
                state.epoch.index() + 1,
                &self.params,
                EpochWindow::starting_at(now, self.interval),
            );
            let closed = mem::replace(&mut state.epoch, next);
            let (snapshot, pending) = closed.close(state.consumers.to_vec());
            if !pending.is_empty() {
                state.consumers.apply(pending);
            }
            (snapshot, state.consumers.len())
        };

        self.metrics.record_filter_created(self.params.size_bits);
        self.metrics.record_filter_dropped(self.params.size_bits);
        EPOCHS_ROTATED.inc();
        ACTIVE_CONSUMERS.set(active as f64);

        let set_bits = snapshot.filter.set_bit_count();
        EPOCH_SET_BITS.set(set_bits as f64);
        match snapshot.estimated_count() {
            Some(estimated_count) => info!(
                epoch = snapshot.index,
                epoch_start = snapshot.window.start,
                epoch_end = snapshot.window.end,
                set_bits,
                estimated_count,
                detections = snapshot.detections,
                consumers = ?snapshot.consumer_ids(),
                "Epoch closed"
            ),
            None => warn!(
                epoch = snapshot.index,
                set_bits,
                "Epoch filter saturated; raise the filter capacity"
            ),
        }
        snapshot
    }

    /// Filter operation counters since start
    pub fn filter_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl ConsumerRegistry for SensorDaemon {
    fn enqueue_registration(&self, consumer: Consumer) {
        debug!(consumer_id = %consumer.id, "Registration queued for next epoch");
        self.state.lock().epoch.enqueue_registration(consumer);
    }

    fn enqueue_unregistration(&self, consumer: Consumer) {
        debug!(consumer_id = %consumer.id, "Unregistration queued for next epoch");
        self.state.lock().epoch.enqueue_unregistration(consumer);
    }

    fn status(&self) -> DaemonStatus {
        let state = self.state.lock();
        let epoch = &state.epoch;
        DaemonStatus {
            epoch_index: epoch.index(),
            window: epoch.window(),
            set_bits: epoch.filter().set_bit_count(),
            filter_size_bits: epoch.filter().size_bits(),
            detections: epoch.detections(),
            active_consumers: state.consumers.len(),
            pending_registrations: epoch.pending().registrations.len(),
            pending_unregistrations: epoch.pending().unregistrations.len(),
            filter: self.metrics.snapshot(),
        }
    }
}
