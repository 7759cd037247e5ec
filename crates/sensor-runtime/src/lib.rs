//! # Presence Sensor Runtime
//!
//! Process wiring for the `presence-sensor` binary.
//!
//! ## Startup Sequence
//!
//! 1. Initialise logging and metrics from `PC_*` environment variables
//! 2. Load `sensor.toml`, apply environment overrides, validate
//! 3. Build the daemon; the first epoch starts immediately
//! 4. Start the reporting worker and the epoch timer
//! 5. Bind the registration API
//! 6. Open the capture feed and start observing
//!
//! Ctrl+C (or a fatal API error) stops every task. Closed epochs already
//! queued are still reported.

pub mod config;
pub mod runtime;
pub mod scheduler;

pub use config::{config_path, ConfigError, SensorConfig, CONFIG_PATH_VAR};
pub use runtime::SensorRuntime;
pub use scheduler::EpochScheduler;
