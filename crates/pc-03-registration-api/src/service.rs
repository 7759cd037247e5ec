//! Registration HTTP service
//!
//! Routes:
//! - `POST <register_path>` / `POST <unregister_path>`: queue a consumer
//!   change for the next epoch boundary
//! - `GET /health`: daemon status
//! - `GET /metrics`: Prometheus text exposition
//!
//! Anything else gets `400 {"error": {"message": "Unknown path"}}`. Bodies
//! are taken as raw bytes so that every rejection, including an oversized
//! body, carries the same JSON error shape.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pc_02_epoch_aggregation::ConsumerRegistry;
use sensor_telemetry::{encode_metrics, REGISTRATION_REQUESTS};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::domain::{parse_consumer, Operation, RegistrationConfig};
use crate::error::RegistrationError;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    registry: Arc<dyn ConsumerRegistry>,
    max_body_bytes: usize,
}

/// Consumer registration endpoint
pub struct RegistrationService {
    config: RegistrationConfig,
    registry: Arc<dyn ConsumerRegistry>,
}

impl RegistrationService {
    /// # Errors
    /// `Config` if the route configuration is invalid.
    pub fn new(
        config: RegistrationConfig,
        registry: Arc<dyn ConsumerRegistry>,
    ) -> Result<Self, RegistrationError> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: Arc::clone(&self.registry),
            max_body_bytes: self.config.max_body_bytes,
        };

        Router::new()
            .route(
                &self.config.register_path,
                post(handle_register).fallback(unknown_path),
            )
            .route(
                &self.config.unregister_path,
                post(handle_unregister).fallback(unknown_path),
            )
            .route("/health", get(health_check).fallback(unknown_path))
            .route("/metrics", get(metrics).fallback(unknown_path))
            .fallback(unknown_path)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener, RegistrationError> {
        let addr = self.config.bind_addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| RegistrationError::Server(format!("bind {addr}: {e}")))
    }

    /// Serve on `listener` until `shutdown` flips to true
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), RegistrationError> {
        let local = listener
            .local_addr()
            .map_err(|e| RegistrationError::Server(e.to_string()))?;
        info!(
            addr = %local,
            register_path = %self.config.register_path,
            unregister_path = %self.config.unregister_path,
            "Registration API listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await
            .map_err(|e| RegistrationError::Server(e.to_string()))
    }
}

async fn handle_register(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    handle(&state, Operation::Register, body)
}

async fn handle_unregister(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    handle(&state, Operation::Unregister, body)
}

fn read_body(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<Bytes, RegistrationError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RegistrationError::PayloadTooLarge(state.max_body_bytes)
        } else {
            RegistrationError::MalformedRequest(rejection.body_text())
        }
    })
}

fn handle(
    state: &AppState,
    operation: Operation,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let parsed = read_body(state, body).and_then(|bytes| parse_consumer(operation, &bytes));
    let consumer = match parsed {
        Ok(consumer) => consumer,
        Err(e) => {
            REGISTRATION_REQUESTS
                .with_label_values(&[operation.as_str(), "rejected"])
                .inc();
            warn!(operation = operation.as_str(), error = %e, "Registration request rejected");
            return e.into_response();
        }
    };

    info!(
        operation = operation.as_str(),
        consumer_id = %consumer.id,
        "Consumer change queued for next epoch"
    );
    match operation {
        Operation::Register => state.registry.enqueue_registration(consumer),
        Operation::Unregister => state.registry.enqueue_unregistration(consumer),
    }
    REGISTRATION_REQUESTS
        .with_label_values(&[operation.as_str(), "accepted"])
        .inc();

    (
        StatusCode::OK,
        Json(json!({ "result": { "message": operation.success_message() } })),
    )
        .into_response()
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "presence-sensor",
        "version": env!("CARGO_PKG_VERSION"),
        "epoch": state.registry.status(),
    }))
}

async fn metrics() -> Result<Response, RegistrationError> {
    let body = encode_metrics().map_err(|e| RegistrationError::Metrics(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

async fn unknown_path() -> RegistrationError {
    RegistrationError::UnknownPath
}
