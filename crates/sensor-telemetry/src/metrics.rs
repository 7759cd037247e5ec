//! Prometheus metrics for the sensor.
//!
//! All metrics follow the naming convention: `pc_<metric>_<unit>`
//!
//! - **Capture**: frames seen, probe requests, distinct detections
//! - **Epochs**: rotations, set bits of the last closed filter
//! - **Reporting**: report outcomes, per-consumer encryption failures, duration
//! - **Registration**: HTTP requests by operation and outcome, active consumers

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CAPTURE
    // =========================================================================

    /// Frames delivered by the capture source
    pub static ref FRAMES_RECEIVED: Counter = Counter::new(
        "pc_frames_received_total",
        "Total frames delivered by the capture source"
    ).expect("metric creation failed");

    /// Probe-request frames carrying a source address
    pub static ref PROBE_REQUESTS: Counter = Counter::new(
        "pc_probe_requests_total",
        "Total probe-request frames with a source address"
    ).expect("metric creation failed");

    /// Identifiers not yet present in the epoch filter
    pub static ref DETECTIONS: Counter = Counter::new(
        "pc_detections_total",
        "Total first sightings of a device within an epoch"
    ).expect("metric creation failed");

    // =========================================================================
    // EPOCHS
    // =========================================================================

    pub static ref EPOCHS_ROTATED: Counter = Counter::new(
        "pc_epochs_rotated_total",
        "Total epoch rotations"
    ).expect("metric creation failed");

    /// Set bits of the most recently closed epoch filter
    pub static ref EPOCH_SET_BITS: Gauge = Gauge::new(
        "pc_epoch_set_bits",
        "Set bits in the last closed epoch filter"
    ).expect("metric creation failed");

    // =========================================================================
    // REPORTING
    // =========================================================================

    pub static ref REPORTS: CounterVec = CounterVec::new(
        Opts::new("pc_reports_total", "Epoch reports by outcome"),
        &["outcome"]  // outcome: sent/failed/dropped
    ).expect("metric creation failed");

    pub static ref ENCRYPTION_FAILURES: Counter = Counter::new(
        "pc_encryption_failures_total",
        "Per-consumer encryption requests that failed"
    ).expect("metric creation failed");

    /// Time from snapshot hand-off to report delivery
    pub static ref REPORT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pc_report_duration_seconds",
            "Time spent encrypting and transmitting one epoch report"
        ).buckets(exponential_buckets(0.01, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    pub static ref REGISTRATION_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("pc_registration_requests_total", "Registration API requests"),
        &["operation", "outcome"]  // operation: register/unregister, outcome: accepted/rejected
    ).expect("metric creation failed");

    /// Consumers receiving reports
    pub static ref ACTIVE_CONSUMERS: Gauge = Gauge::new(
        "pc_active_consumers",
        "Consumers currently receiving epoch reports"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Capture
        Box::new(FRAMES_RECEIVED.clone()),
        Box::new(PROBE_REQUESTS.clone()),
        Box::new(DETECTIONS.clone()),
        // Epochs
        Box::new(EPOCHS_ROTATED.clone()),
        Box::new(EPOCH_SET_BITS.clone()),
        // Reporting
        Box::new(REPORTS.clone()),
        Box::new(ENCRYPTION_FAILURES.clone()),
        Box::new(REPORT_DURATION.clone()),
        // Registration
        Box::new(REGISTRATION_REQUESTS.clone()),
        Box::new(ACTIVE_CONSUMERS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Encode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Encode(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
