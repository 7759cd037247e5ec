//! # HTTP Flows
//!
//! The sensor's three HTTP conversations over real loopback sockets: the
//! registration API it serves, and the encryption service and collection
//! server it calls. Both upstream services are small in-process axum apps.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{extract::State, routing::post, Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::sync::watch;

    use pc_02_epoch_aggregation::{
        build_client, ConsumerRegistry, HttpEncryptionClient, HttpReportSink, ReportingPipeline,
        SensorDaemon,
    };
    use pc_03_registration_api::{RegistrationConfig, RegistrationService};

    type Received = Arc<Mutex<Vec<Value>>>;

    async fn spawn_app(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Echoes `enc(<publicKey>:<filter length>)`
    async fn encrypt(State(seen): State<Received>, Json(body): Json<Value>) -> Json<Value> {
        let key = body["publicKey"].as_str().unwrap_or_default().to_string();
        let len = body["bloomFilter"].as_array().map(Vec::len).unwrap_or(0);
        seen.lock().push(body);
        Json(json!({ "result": format!("enc({}:{})", key, len) }))
    }

    async fn collect(State(seen): State<Received>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().push(body);
        Json(json!({ "ok": true }))
    }

    #[tokio::test]
    async fn test_register_rotate_report_over_http() {
        // Upstream services
        let encrypted: Received = Arc::default();
        let collected: Received = Arc::default();
        let encryption_url = format!(
            "{}/encrypt",
            spawn_app(
                Router::new()
                    .route("/encrypt", post(encrypt))
                    .with_state(encrypted.clone())
            )
            .await
        );
        let server_url = format!(
            "{}/epoch",
            spawn_app(
                Router::new()
                    .route("/epoch", post(collect))
                    .with_state(collected.clone())
            )
            .await
        );

        // Sensor
        let daemon =
            Arc::new(SensorDaemon::init(100, 0.01, chrono::Duration::seconds(300)).unwrap());
        let config = RegistrationConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..RegistrationConfig::default()
        };
        let service = RegistrationService::new(config, daemon.clone()).unwrap();
        let listener = service.bind().await.unwrap();
        let api = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(service.serve(listener, shutdown_rx));

        let client = build_client(Duration::from_secs(5)).unwrap();
        let pipeline = ReportingPipeline::new(
            "sensor-http",
            Arc::new(HttpEncryptionClient::new(client.clone(), encryption_url)),
            Arc::new(HttpReportSink::new(client.clone(), server_url)),
        );

        // Register over the wire
        let response = client
            .post(format!("{}/register", api))
            .json(&json!({ "pkc": "alice", "serializedPkc": "ka" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(daemon.status().pending_registrations, 1);

        let response = client
            .post(format!("{}/register", api))
            .json(&json!({ "serializedPkc": "ka" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"]["message"].is_string());

        // Two epochs: the first predates alice
        daemon.observe("02:00:00:00:00:01");
        pipeline.publish(daemon.rotate_epoch()).await.unwrap();
        daemon.observe("02:00:00:00:00:02");
        pipeline.publish(daemon.rotate_epoch()).await.unwrap();

        {
            let encrypted = encrypted.lock();
            assert_eq!(encrypted.len(), 1, "Only the second epoch has a consumer");
            assert_eq!(encrypted[0]["publicKey"], "ka");
            let bits = encrypted[0]["bloomFilter"].as_array().unwrap();
            assert_eq!(bits.len(), 959);
            assert!(bits.iter().all(|b| b == 0 || b == 1));
        }
        {
            let collected = collected.lock();
            assert_eq!(collected.len(), 2);
            assert_eq!(collected[0]["sensor_id"], "sensor-http");
            assert_eq!(collected[0]["encrypted_bloom_filters"], json!({}));
            assert_eq!(collected[1]["encrypted_bloom_filters"]["alice"], "enc(ka:959)");
        }

        // Health reflects the live epoch
        let health: Value = client
            .get(format!("{}/health", api))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["epoch"]["epoch_index"], 2);

        // Close pooled keep-alive connections so graceful shutdown can finish
        drop(pipeline);
        drop(client);
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("registration API should stop")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_collector_loses_only_that_report() {
        let daemon =
            Arc::new(SensorDaemon::init(100, 0.01, chrono::Duration::seconds(300)).unwrap());
        let client = build_client(Duration::from_secs(2)).unwrap();

        // Bind and drop to get a closed port
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_url = format!("http://{}/epoch", closed.local_addr().unwrap());
        drop(closed);

        let pipeline = ReportingPipeline::new(
            "sensor-http",
            Arc::new(HttpEncryptionClient::new(client.clone(), dead_url.clone())),
            Arc::new(HttpReportSink::new(client, dead_url)),
        );

        daemon.observe("02:00:00:00:00:01");
        assert!(pipeline.publish(daemon.rotate_epoch()).await.is_err());

        // The daemon is unaffected and keeps counting
        assert!(daemon.observe("02:00:00:00:00:01"));
        assert_eq!(daemon.status().epoch_index, 1);
    }
}
