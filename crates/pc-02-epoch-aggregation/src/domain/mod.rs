//! Domain layer: pure types, no I/O

pub mod consumer;
pub mod epoch;
pub mod frame;
pub mod report;

pub use consumer::{Consumer, ConsumerSet, PendingChanges};
pub use epoch::{EpochSnapshot, EpochState, EpochWindow};
pub use frame::{CapturedFrame, FrameType, MacAddress, PROBE_REQUEST_SUBTYPE};
pub use report::{Ciphertext, EpochReport};
