//! Request parsing and route configuration

pub mod config;
pub mod request;

pub use config::{RegistrationConfig, RESERVED_PATHS};
pub use request::{parse_consumer, Operation};
