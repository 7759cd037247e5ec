//! # Sensor Telemetry
//!
//! Structured logging and Prometheus metrics shared by every sensor crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sensor_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `PC_JSON_LOGS` | `true` in containers | JSON log lines instead of pretty output |
//! | `PC_SERVICE_NAME` | `presence-sensor` | Service name attached to startup log |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, ACTIVE_CONSUMERS, DETECTIONS,
    ENCRYPTION_FAILURES, EPOCHS_ROTATED, EPOCH_SET_BITS, FRAMES_RECEIVED, PROBE_REQUESTS,
    REGISTRATION_REQUESTS, REPORTS, REPORT_DURATION,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Failed to encode metrics: {0}")]
    Encode(String),
}

/// Install the log subscriber and register all metrics.
///
/// Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
