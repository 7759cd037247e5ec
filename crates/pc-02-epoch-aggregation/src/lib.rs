//! # PC-02 Epoch Aggregation
//!
//! Accumulates the distinct devices seen during fixed-length epochs and
//! reports an encrypted copy of each epoch's Bloom filter to every
//! registered consumer.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): frames, consumers, `EpochState`, `EpochReport`
//! - **Ports** (`ports/`): `ConsumerRegistry` (inbound); `FrameSource`,
//!   `EncryptionService`, `ReportSink` (outbound)
//! - **Service** (`service/`): `SensorDaemon`, `ReportingPipeline`
//! - **Adapters** (`adapters/`): JSON-lines/channel frame sources, reqwest
//!   clients for the encryption service and the collection server
//!
//! ## Data flow
//!
//! ```text
//! FrameSource -> run_capture -> SensorDaemon::observe        (lock)
//! timer       -> SensorDaemon::rotate_epoch -> SnapshotQueue (lock, swap)
//! SnapshotQueue -> ReportingPipeline::run -> EncryptionService x N -> ReportSink
//! ```
//!
//! ## Guarantees
//!
//! - Each epoch is closed exactly once and handed over as an owned snapshot;
//!   later observations only touch the next epoch's filter
//! - The consumer set changes only at rotation; a report goes to the
//!   consumers that were active for the whole epoch
//! - No network I/O happens while the daemon lock is held

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{
    build_client, run_capture, ChannelFrameSource, HttpEncryptionClient, HttpReportSink,
    JsonLinesFrameSource,
};
pub use domain::{
    CapturedFrame, Ciphertext, Consumer, ConsumerSet, EpochReport, EpochSnapshot, EpochState,
    EpochWindow, FrameType, MacAddress, PendingChanges,
};
pub use error::SensorError;
pub use ports::{ConsumerRegistry, DaemonStatus, EncryptionService, FrameSource, ReportSink};
pub use service::{snapshot_queue, ReportingPipeline, SensorDaemon, SnapshotQueue};
