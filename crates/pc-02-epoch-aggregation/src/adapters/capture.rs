//! Frame sources and the capture loop
//!
//! The external capture helper writes one JSON frame per line, e.g.
//!
//! ```text
//! {"type":"management","subtype":4,"addr2":"a4:5e:60:c1:22:9f"}
//! ```
//!
//! to stdin or a FIFO. `JsonLinesFrameSource` reads that stream;
//! `ChannelFrameSource` takes frames from inside the process.

use std::sync::Arc;

use async_trait::async_trait;
use sensor_telemetry::FRAMES_RECEIVED;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::domain::CapturedFrame;
use crate::error::SensorError;
use crate::ports::FrameSource;
use crate::service::SensorDaemon;

/// Frames pushed through a tokio channel
pub struct ChannelFrameSource {
    rx: mpsc::Receiver<CapturedFrame>,
}

impl ChannelFrameSource {
    pub fn new(rx: mpsc::Receiver<CapturedFrame>) -> Self {
        Self { rx }
    }

    /// Source plus the sender that feeds it
    pub fn channel(capacity: usize) -> (mpsc::Sender<CapturedFrame>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl FrameSource for ChannelFrameSource {
    async fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SensorError> {
        Ok(self.rx.recv().await)
    }
}

/// Newline-delimited JSON frames from any buffered reader
///
/// Lines are read as raw bytes. Blank lines are ignored; lines that are not
/// a JSON frame (including invalid UTF-8) are counted and skipped.
pub struct JsonLinesFrameSource<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: u64,
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesFrameSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines that could not be parsed so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for JsonLinesFrameSource<R> {
    async fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SensorError> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|e| SensorError::Capture {
                    line: self.line_no + 1,
                    reason: e.to_string(),
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<CapturedFrame>(line) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_no, error = %e, "Skipping malformed frame");
                }
            }
        }
    }
}

/// Feed frames from `source` into `daemon` until the source ends or
/// `shutdown` flips to true
///
/// Returns the number of frames read.
///
/// # Errors
/// `Capture` if reading the source fails. Undecodable lines are not errors.
pub async fn run_capture<S: FrameSource>(
    mut source: S,
    daemon: Arc<SensorDaemon>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, SensorError> {
    let mut frames = 0u64;
    loop {
        let next = tokio::select! {
            next = source.next_frame() => next?,
            _ = shutdown.changed() => {
                info!(frames, "Capture stopped by shutdown");
                return Ok(frames);
            }
        };

        let Some(frame) = next else {
            info!(frames, "Capture source ended");
            return Ok(frames);
        };
        frames += 1;
        FRAMES_RECEIVED.inc();
        daemon.observe_frame(&frame);
    }
}
