//! # Presence Sensor
//!
//! Counts distinct Wi-Fi devices per epoch without retaining identifiers and
//! reports the per-epoch filter, encrypted for each registered consumer.
//!
//! ```text
//! presence-sensor [CONFIG]      # or PC_CONFIG=/etc/presence/sensor.toml
//! ```

use anyhow::{Context, Result};
use sensor_runtime::{config_path, SensorConfig, SensorRuntime, CONFIG_PATH_VAR};
use sensor_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialise telemetry")?;

    let path = config_path(std::env::args().nth(1), std::env::var(CONFIG_PATH_VAR).ok());
    let config = SensorConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");

    let mut runtime = SensorRuntime::new(config)?;
    runtime.start().await?;

    info!("Sensor is running. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("failed to listen for Ctrl+C")?,
        _ = runtime.stopped() => {}
    }

    runtime.shutdown().await;
    Ok(())
}
