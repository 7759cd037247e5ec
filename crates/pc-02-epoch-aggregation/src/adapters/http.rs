//! HTTP adapters for the encryption service and the collection server

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Ciphertext, Consumer, EpochReport};
use crate::error::SensorError;
use crate::ports::{EncryptionService, ReportSink};

/// Shared client with a per-request timeout
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SensorError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SensorError::TransportError(format!("failed to build HTTP client: {e}")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncryptRequest<'a> {
    public_key: &'a str,
    bloom_filter: &'a [u8],
}

#[derive(Deserialize)]
struct EncryptResponse {
    result: Ciphertext,
}

/// `POST {"publicKey", "bloomFilter"}` -> `{"result": <ciphertext>}`
pub struct HttpEncryptionClient {
    client: reqwest::Client,
    url: String,
}

impl HttpEncryptionClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EncryptionService for HttpEncryptionClient {
    async fn encrypt(&self, consumer: &Consumer, bits: &[u8]) -> Result<Ciphertext, SensorError> {
        let failed = |reason: String| SensorError::EncryptionServiceError {
            consumer_id: consumer.id.clone(),
            reason,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&EncryptRequest {
                public_key: &consumer.public_key,
                bloom_filter: bits,
            })
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("status {status}")));
        }

        let body: EncryptResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid response body: {e}")))?;
        debug!(consumer_id = %consumer.id, bytes = body.result.len(), "Filter encrypted");
        Ok(body.result)
    }
}

/// POSTs the epoch report as JSON to the collection server
pub struct HttpReportSink {
    client: reqwest::Client,
    url: String,
}

impl HttpReportSink {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn transmit(&self, report: &EpochReport) -> Result<(), SensorError> {
        let response = self
            .client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .map_err(|e| SensorError::TransportError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SensorError::TransportError(format!(
                "server responded with status {status}"
            )))
        }
    }
}
