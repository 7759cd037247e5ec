//! Adapters: concrete implementations of the outbound ports

pub mod capture;
pub mod http;

pub use capture::{run_capture, ChannelFrameSource, JsonLinesFrameSource};
pub use http::{build_client, HttpEncryptionClient, HttpReportSink};
