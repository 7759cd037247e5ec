//! Error types for epoch aggregation
//!
//! Only `Filter` can occur at startup. Everything else is a runtime failure
//! confined to one request, one consumer or one epoch: it is logged and the
//! daemon keeps running.

use pc_01_bloom_filter::FilterError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    /// Registration payload missing or with an invalid field
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Encryption for one consumer failed; only that consumer's entry is lost
    #[error("Encryption failed for consumer {consumer_id}: {reason}")]
    EncryptionServiceError { consumer_id: String, reason: String },

    /// Delivering the epoch report failed; the report is not retried
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Reading the capture feed failed at `line`
    #[error("Capture error at line {line}: {reason}")]
    Capture { line: u64, reason: String },

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl SensorError {
    /// Short label used as a metric/log outcome
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::EncryptionServiceError { .. } => "encryption",
            Self::TransportError(_) => "transport",
            Self::Capture { .. } => "capture",
            Self::Filter(_) => "filter",
        }
    }
}
