//! # PC-03 Registration API
//!
//! Minimal HTTP surface of the sensor. Consumers ask to start or stop
//! receiving encrypted epoch reports; requests are queued on the daemon and
//! take effect at the next epoch boundary, so every report corresponds to a
//! consumer set that was stable for its whole window.
//!
//! ## Wire format
//!
//! ```text
//! POST /register   {"pkc": "<consumer id>", "serializedPkc": "<public key>"}
//! 200 {"result": {"message": "..."}}
//! 400 {"error":  {"message": "..."}}
//! ```

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{parse_consumer, Operation, RegistrationConfig};
pub use error::RegistrationError;
pub use service::RegistrationService;
