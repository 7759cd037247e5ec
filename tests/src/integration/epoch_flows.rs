//! # Epoch Flows
//!
//! Registration router, sensor daemon and reporting pipeline wired together
//! with in-memory encryption and collection ports.
//!
//! ## Flows Tested:
//!
//! 1. **Register → rotate → report**: consumers join at the next epoch boundary
//! 2. **Unregister → rotate → report**: consumers leave after the current epoch
//! 3. **Capture → filter → estimate**: deduplication and the count estimate
//! 4. **Timer → queue → worker → sink**: reports leave in epoch order

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use parking_lot::Mutex;
    use serde_json::Value;
    use tokio::sync::watch;
    use tower::ServiceExt;

    use pc_01_bloom_filter::{calculate_parameters, estimate_count};
    use pc_02_epoch_aggregation::{
        snapshot_queue, CapturedFrame, Ciphertext, Consumer, ConsumerRegistry, EncryptionService,
        EpochReport, MacAddress, ReportSink, ReportingPipeline, SensorDaemon, SensorError,
    };
    use pc_03_registration_api::{RegistrationConfig, RegistrationService};
    use sensor_runtime::EpochScheduler;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Ciphertext is "<public key>/<set bits>"
    struct FakeEncryption;

    #[async_trait]
    impl EncryptionService for FakeEncryption {
        async fn encrypt(
            &self,
            consumer: &Consumer,
            bits: &[u8],
        ) -> Result<Ciphertext, SensorError> {
            let ones = bits.iter().filter(|&&b| b == 1).count();
            Ok(format!("{}/{}", consumer.public_key, ones))
        }
    }

    #[derive(Default)]
    struct Collector {
        reports: Mutex<Vec<EpochReport>>,
    }

    #[async_trait]
    impl ReportSink for Collector {
        async fn transmit(&self, report: &EpochReport) -> Result<(), SensorError> {
            self.reports.lock().push(report.clone());
            Ok(())
        }
    }

    struct Sensor {
        daemon: Arc<SensorDaemon>,
        router: Router,
        pipeline: ReportingPipeline,
        collector: Arc<Collector>,
    }

    fn sensor(capacity: usize) -> Sensor {
        let daemon =
            Arc::new(SensorDaemon::init(capacity, 0.01, chrono::Duration::seconds(60)).unwrap());
        let router = RegistrationService::new(RegistrationConfig::default(), daemon.clone())
            .unwrap()
            .router();
        let collector = Arc::new(Collector::default());
        let pipeline =
            ReportingPipeline::new("sensor-it", Arc::new(FakeEncryption), collector.clone());
        Sensor {
            daemon,
            router,
            pipeline,
            collector,
        }
    }

    async fn post(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn consumer_body(id: &str, key: &str) -> String {
        format!(r#"{{"pkc":"{}","serializedPkc":"{}"}}"#, id, key)
    }

    fn mac(i: usize) -> MacAddress {
        MacAddress::new([0x02, 0, 0, 0, (i / 256) as u8, (i % 256) as u8])
    }

    // =========================================================================
    // CONSUMER LIFECYCLE
    // =========================================================================

    /// A consumer registered mid-epoch is absent from that epoch's report and
    /// present exactly once in every report after it
    #[tokio::test]
    async fn test_mid_epoch_registration_applies_from_next_epoch() {
        let s = sensor(100);
        s.daemon.observe("02:00:00:00:00:01");

        let (status, _) = post(&s.router, "/register", &consumer_body("alice", "ka")).await;
        assert_eq!(status, StatusCode::OK);

        let epoch0 = s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();
        assert!(
            epoch0.encrypted_bloom_filters.is_empty(),
            "Registration must not affect the epoch it arrived in"
        );

        for _ in 0..3 {
            s.daemon.observe("02:00:00:00:00:02");
            let report = s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();
            assert_eq!(report.encrypted_bloom_filters.len(), 1);
            assert!(report.encrypted_bloom_filters["alice"].starts_with("ka/"));
        }

        // Duplicate registration does not add a second entry
        post(&s.router, "/register", &consumer_body("alice", "ka")).await;
        let report = s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();
        assert_eq!(report.encrypted_bloom_filters.len(), 1);

        assert_eq!(s.collector.reports.lock().len(), 5);
    }

    /// An unregistered consumer still receives the epoch it was active for
    #[tokio::test]
    async fn test_unregistration_applies_after_current_epoch() {
        let s = sensor(100);
        post(&s.router, "/register", &consumer_body("alice", "ka")).await;
        post(&s.router, "/register", &consumer_body("bob", "kb")).await;
        s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();

        let (status, body) = post(&s.router, "/unregister", &consumer_body("alice", "ka")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["result"]["message"],
            "Public key (pkc) of consumer added to be unregistered"
        );

        let current = s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();
        assert_eq!(
            current.encrypted_bloom_filters.keys().collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );

        let next = s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();
        assert_eq!(
            next.encrypted_bloom_filters.keys().collect::<Vec<_>>(),
            vec!["bob"]
        );
    }

    /// Missing pkc: 400 with a message, nothing queued
    #[tokio::test]
    async fn test_registration_missing_pkc_rejected() {
        let s = sensor(100);
        let (status, body) = post(&s.router, "/register", r#"{"serializedPkc":"ka"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].is_string());
        let daemon_status = s.daemon.status();
        assert_eq!(daemon_status.pending_registrations, 0);
        assert_eq!(daemon_status.pending_unregistrations, 0);

        let report = s.pipeline.publish(s.daemon.rotate_epoch()).await.unwrap();
        assert!(report.encrypted_bloom_filters.is_empty());
        assert_eq!(s.daemon.status().active_consumers, 0);
    }

    /// Zero consumers: empty map, report still transmitted
    #[tokio::test]
    async fn test_rotation_without_consumers_still_reports() {
        let s = sensor(100);
        s.daemon.observe("02:00:00:00:00:01");
        let snapshot = s.daemon.rotate_epoch();
        let window = snapshot.window;

        let report = s.pipeline.publish(snapshot).await.unwrap();
        assert!(report.encrypted_bloom_filters.is_empty());
        assert_eq!(report.sensor_id, "sensor-it");
        assert_eq!(report.window(), window);
        assert!(report.epoch_end_timestamp > report.epoch_start_timestamp);
        assert_eq!(s.collector.reports.lock().len(), 1);
    }

    // =========================================================================
    // CAPTURE AND ESTIMATION
    // =========================================================================

    /// n=100, p=0.01: 50 distinct devices then 25 repeats
    #[tokio::test]
    async fn test_capacity_100_scenario() {
        let params = calculate_parameters(100, 0.01).unwrap();
        assert_eq!(params.size_bits, 959);
        assert_eq!(params.hash_count, 6);

        let s = sensor(100);
        for i in 0..50 {
            let seen = s.daemon.observe_frame(&CapturedFrame::probe_request(mac(i)));
            assert_eq!(seen, Some(true), "Device {} should be new", i);
        }
        let bits_after_distinct = s.daemon.status().set_bits;

        for i in 0..25 {
            let seen = s.daemon.observe_frame(&CapturedFrame::probe_request(mac(i * 2)));
            assert_eq!(seen, Some(false), "Repeat {} should be known", i);
        }
        assert_eq!(
            s.daemon.status().set_bits,
            bits_after_distinct,
            "Repeats must not change the filter"
        );

        let snapshot = s.daemon.rotate_epoch();
        assert_eq!(snapshot.detections, 50);
        let estimate = estimate_count(&snapshot.filter).unwrap();
        assert!(
            (45..=55).contains(&estimate),
            "Estimate {} should be close to 50",
            estimate
        );
    }

    // =========================================================================
    // SCHEDULED REPORTING
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_timer_drives_reports_in_epoch_order() {
        let s = sensor(100);
        post(&s.router, "/register", &consumer_body("alice", "ka")).await;

        let (queue, rx) = snapshot_queue(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = EpochScheduler::new(s.daemon.clone(), queue, Duration::from_secs(60));
        let timer = tokio::spawn(scheduler.run(shutdown_rx));
        let worker = tokio::spawn(s.pipeline.run(rx));

        s.daemon.observe("02:00:00:00:00:01");
        tokio::time::sleep(Duration::from_secs(190)).await;
        shutdown_tx.send(true).unwrap();

        assert_eq!(timer.await.unwrap(), 3);
        worker.await.unwrap();

        let reports = s.collector.reports.lock();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].encrypted_bloom_filters.is_empty());
        assert!(reports[1].encrypted_bloom_filters.contains_key("alice"));
        assert!(reports[2].encrypted_bloom_filters.contains_key("alice"));
        for pair in reports.windows(2) {
            assert!(
                pair[0].epoch_start_timestamp <= pair[1].epoch_start_timestamp,
                "Reports must arrive in epoch order"
            );
        }
    }
}
