//! Reporting Pipeline
//!
//! Turns a closed epoch into an `EpochReport`: encrypt the filter once per
//! consumer (concurrently), wait for every call to finish, then transmit.
//!
//! Failures never escape the pipeline. A failed encryption drops that
//! consumer's entry; a failed transmission drops the report. Neither is
//! retried.
//!
//! Snapshots reach the pipeline through a bounded queue drained by a single
//! worker, so reports go out one at a time and in epoch order. When the
//! queue is full the newest snapshot is dropped.

use std::sync::Arc;

use futures::future::join_all;
use sensor_telemetry::{HistogramTimer, ENCRYPTION_FAILURES, REPORTS, REPORT_DURATION};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::domain::{EpochReport, EpochSnapshot};
use crate::error::SensorError;
use crate::ports::{EncryptionService, ReportSink};

/// Encrypts and delivers epoch reports
pub struct ReportingPipeline {
    sensor_id: String,
    encryption: Arc<dyn EncryptionService>,
    sink: Arc<dyn ReportSink>,
}

impl ReportingPipeline {
    pub fn new(
        sensor_id: impl Into<String>,
        encryption: Arc<dyn EncryptionService>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            encryption,
            sink,
        }
    }

    /// Build the report for `snapshot`
    ///
    /// Consumers whose encryption fails are left out.
    pub async fn assemble(&self, snapshot: &EpochSnapshot) -> EpochReport {
        let bits = snapshot.filter.to_bit_array();
        let encryption = &self.encryption;

        let results = join_all(snapshot.consumers.iter().map(|consumer| {
            let bits = &bits;
            async move { (consumer, encryption.encrypt(consumer, bits).await) }
        }))
        .await;

        let mut report = EpochReport::new(self.sensor_id.clone(), snapshot.window);
        for (consumer, result) in results {
            match result {
                Ok(ciphertext) => {
                    report
                        .encrypted_bloom_filters
                        .insert(consumer.id.clone(), ciphertext);
                }
                Err(e) => {
                    ENCRYPTION_FAILURES.inc();
                    warn!(
                        epoch = snapshot.index,
                        consumer_id = %consumer.id,
                        error = %e,
                        "Encryption failed; consumer omitted from report"
                    );
                }
            }
        }
        report
    }

    /// Assemble and transmit the report for `snapshot`
    ///
    /// # Errors
    /// `TransportError` if the server did not accept the report. The error
    /// is already logged and counted.
    pub async fn publish(&self, snapshot: EpochSnapshot) -> Result<EpochReport, SensorError> {
        let _timer = HistogramTimer::new(&REPORT_DURATION);
        let report = self.assemble(&snapshot).await;

        match self.sink.transmit(&report).await {
            Ok(()) => {
                REPORTS.with_label_values(&["sent"]).inc();
                info!(
                    epoch = snapshot.index,
                    epoch_start = report.epoch_start_timestamp,
                    epoch_end = report.epoch_end_timestamp,
                    consumers = ?report.encrypted_bloom_filters.keys().collect::<Vec<_>>(),
                    "Epoch report sent"
                );
                Ok(report)
            }
            Err(e) => {
                REPORTS.with_label_values(&["failed"]).inc();
                error!(
                    epoch = snapshot.index,
                    error = %e,
                    "Epoch report lost; reports are not retried"
                );
                Err(e)
            }
        }
    }

    /// Publish snapshots from `queue` until every sender is dropped
    pub async fn run(self, mut queue: mpsc::Receiver<EpochSnapshot>) {
        info!(sensor_id = %self.sensor_id, "Reporting worker started");
        while let Some(snapshot) = queue.recv().await {
            // Errors are logged inside publish
            let _ = self.publish(snapshot).await;
        }
        info!("Reporting worker stopped");
    }
}

/// Sending half of the snapshot queue
#[derive(Clone)]
pub struct SnapshotQueue {
    tx: mpsc::Sender<EpochSnapshot>,
}

/// Create a snapshot queue holding at most `depth` pending reports
pub fn snapshot_queue(depth: usize) -> (SnapshotQueue, mpsc::Receiver<EpochSnapshot>) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (SnapshotQueue { tx }, rx)
}

impl SnapshotQueue {
    /// Hand a snapshot to the reporting worker without waiting
    ///
    /// Returns false if it was dropped because the worker is behind or gone.
    pub fn submit(&self, snapshot: EpochSnapshot) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(snapshot)) => {
                REPORTS.with_label_values(&["dropped"]).inc();
                warn!(
                    epoch = snapshot.index,
                    "Previous reports still in flight; dropping this epoch's report"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(snapshot)) => {
                REPORTS.with_label_values(&["dropped"]).inc();
                error!(epoch = snapshot.index, "Reporting worker is gone; dropping report");
                false
            }
        }
    }
}
