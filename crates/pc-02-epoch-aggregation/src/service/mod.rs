//! Service layer: the daemon and the reporting pipeline

pub mod daemon;
pub mod reporting;

pub use daemon::SensorDaemon;
pub use reporting::{snapshot_queue, ReportingPipeline, SnapshotQueue};
