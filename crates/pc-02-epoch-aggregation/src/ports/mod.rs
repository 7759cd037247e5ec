//! Ports (hexagonal boundaries)
//!
//! - `inbound`: what the registration API drives
//! - `outbound`: what the daemon and pipeline depend on

pub mod inbound;
pub mod outbound;

pub use inbound::{ConsumerRegistry, DaemonStatus};
pub use outbound::{EncryptionService, FrameSource, ReportSink};
