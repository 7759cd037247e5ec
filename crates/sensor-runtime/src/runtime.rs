//! Task wiring
//!
//! Four long-lived tasks share one `SensorDaemon`:
//!
//! ```text
//!  capture feed ──observe──→ SensorDaemon ←──enqueue── registration API
//!                                 │
//!                  epoch timer ──rotate──→ snapshot queue ──→ reporting worker
//! ```
//!
//! All of them watch the same shutdown channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use pc_02_epoch_aggregation::{
    build_client, run_capture, snapshot_queue, ConsumerRegistry, EncryptionService,
    HttpEncryptionClient, HttpReportSink, JsonLinesFrameSource, ReportSink, ReportingPipeline,
    SensorDaemon,
};
use pc_03_registration_api::RegistrationService;
use tokio::fs::File;
use tokio::io::{stdin, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::SensorConfig;
use crate::scheduler::EpochScheduler;

/// The running sensor
pub struct SensorRuntime {
    config: SensorConfig,
    daemon: Arc<SensorDaemon>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl SensorRuntime {
    /// Build the daemon; the first epoch starts now
    ///
    /// # Errors
    /// Invalid filter parameters or an interval chrono cannot represent.
    pub fn new(config: SensorConfig) -> Result<Self> {
        let interval = chrono::Duration::from_std(config.epoch.interval())
            .context("epoch interval out of range")?;
        let daemon = SensorDaemon::init(
            config.filter.capacity,
            config.filter.false_positive_rate,
            interval,
        )
        .context("failed to initialise sensor daemon")?;

        let params = daemon.filter_params();
        info!(
            sensor_id = %config.sensor_id,
            capacity = params.capacity,
            false_positive_rate = params.false_positive_rate,
            size_bits = params.size_bits,
            hash_count = params.hash_count,
            "Sensor daemon initialised"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            daemon: Arc::new(daemon),
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        })
    }

    pub fn daemon(&self) -> &Arc<SensorDaemon> {
        &self.daemon
    }

    /// Start every task
    ///
    /// # Errors
    /// Invalid registration routes, an unbindable listener, an unreadable
    /// capture feed or an HTTP client that cannot be built.
    pub async fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  Presence Sensor v{}", env!("CARGO_PKG_VERSION"));
        info!("  Sensor: {}", self.config.sensor_id);
        info!("===========================================");

        self.start_reporting()?;
        self.start_registration().await?;
        self.start_capture().await?;
        Ok(())
    }

    fn start_reporting(&mut self) -> Result<()> {
        let endpoints = &self.config.endpoints;
        let client = build_client(endpoints.request_timeout())
            .context("failed to build HTTP client")?;
        let encryption: Arc<dyn EncryptionService> = Arc::new(HttpEncryptionClient::new(
            client.clone(),
            endpoints.encryption_service_url.clone(),
        ));
        let sink: Arc<dyn ReportSink> =
            Arc::new(HttpReportSink::new(client, endpoints.server_url.clone()));
        let pipeline = ReportingPipeline::new(self.config.sensor_id.clone(), encryption, sink);

        let (queue, rx) = snapshot_queue(self.config.epoch.report_queue_depth);
        self.tasks.push(("reporting", tokio::spawn(pipeline.run(rx))));

        let scheduler = EpochScheduler::new(
            Arc::clone(&self.daemon),
            queue,
            self.config.epoch.interval(),
        );
        let shutdown = self.shutdown_rx.clone();
        self.tasks.push((
            "epoch-timer",
            tokio::spawn(async move {
                scheduler.run(shutdown).await;
            }),
        ));
        Ok(())
    }

    async fn start_registration(&mut self) -> Result<()> {
        let registry: Arc<dyn ConsumerRegistry> = self.daemon.clone();
        let service = RegistrationService::new(self.config.registration.clone(), registry)?;
        let listener = service.bind().await?;
        let shutdown = self.shutdown_rx.clone();
        let shutdown_tx = self.shutdown_tx.clone();
        self.tasks.push((
            "registration",
            tokio::spawn(async move {
                if let Err(e) = service.serve(listener, shutdown).await {
                    error!(error = %e, "Registration API failed");
                    let _ = shutdown_tx.send(true);
                }
            }),
        ));
        Ok(())
    }

    async fn start_capture(&mut self) -> Result<()> {
        let capture = &self.config.capture;
        info!(interface = %capture.interface, feed = %capture.feed, "Starting capture");

        let daemon = Arc::clone(&self.daemon);
        let shutdown = self.shutdown_rx.clone();
        let shutdown_tx = self.shutdown_tx.clone();
        let handle = if capture.reads_stdin() {
            let source = JsonLinesFrameSource::new(BufReader::new(stdin()));
            tokio::spawn(capture_task(source, daemon, shutdown, shutdown_tx))
        } else {
            let path = PathBuf::from(&capture.feed);
            let file = File::open(&path)
                .await
                .with_context(|| format!("failed to open capture feed {}", path.display()))?;
            let source = JsonLinesFrameSource::new(BufReader::new(file));
            tokio::spawn(capture_task(source, daemon, shutdown, shutdown_tx))
        };
        self.tasks.push(("capture", handle));
        Ok(())
    }

    /// Resolves when a task has requested shutdown
    pub async fn stopped(&self) {
        let mut rx = self.shutdown_rx.clone();
        let _ = rx.wait_for(|stop| *stop).await;
    }

    /// Signal every task and wait for them to finish
    ///
    /// Epochs closed before this point are still reported; the open epoch
    /// is discarded.
    pub async fn shutdown(self) {
        info!("Shutting down presence sensor");
        let _ = self.shutdown_tx.send(true);

        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "Task ended abnormally");
            }
        }
        info!("Presence sensor stopped");
    }
}

/// Runs the capture loop; a feed that ends or fails stops the whole sensor
async fn capture_task<R>(
    source: JsonLinesFrameSource<R>,
    daemon: Arc<SensorDaemon>,
    shutdown: watch::Receiver<bool>,
    shutdown_tx: watch::Sender<bool>,
) where
    R: tokio::io::AsyncBufRead + Unpin + Send,
{
    match run_capture(source, daemon, shutdown).await {
        Ok(frames) if *shutdown_tx.borrow() => info!(frames, "Capture finished"),
        Ok(frames) => warn!(frames, "Capture feed ended, stopping sensor"),
        Err(e) => error!(error = %e, "Capture failed, stopping sensor"),
    }
    let _ = shutdown_tx.send(true);
}
