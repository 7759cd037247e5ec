//! Outbound Ports (Driven Ports)
//!
//! External collaborators of the sensor: the frame source, the encryption
//! service and the collection server.

use async_trait::async_trait;

use crate::domain::{CapturedFrame, Ciphertext, Consumer, EpochReport};
use crate::error::SensorError;

/// Encrypts a filter's bit array under a consumer's public key
#[async_trait]
pub trait EncryptionService: Send + Sync {
    /// `bits` is the filter as `m` values, each 0 or 1
    ///
    /// # Errors
    /// `EncryptionServiceError` naming `consumer.id`.
    async fn encrypt(&self, consumer: &Consumer, bits: &[u8]) -> Result<Ciphertext, SensorError>;
}

/// Delivers epoch reports to the collection server
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// # Errors
    /// `TransportError` if the report was not accepted.
    async fn transmit(&self, report: &EpochReport) -> Result<(), SensorError>;
}

/// Stream of parsed frames from the capture collaborator
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the source is exhausted
    async fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SensorError>;
}
