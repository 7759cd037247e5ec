//! # Presence Sensor Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Filter add / check (n=1000, p=0.01) | < 1µs |
//! | Count estimate | < 10µs |
//! | Intersection estimate | < 50µs |
//! | Daemon observe under the lock | < 2µs |
//! | Epoch rotation | < 100µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pc_01_bloom_filter::{estimate_count, estimate_intersection, BloomFilter};
use pc_02_epoch_aggregation::{MacAddress, SensorDaemon};
use rand::Rng;
use std::time::Duration;

fn random_macs(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 6];
            rng.fill(&mut bytes);
            MacAddress::new(bytes).to_string()
        })
        .collect()
}

// ============================================================================
// PC-01: Bloom Filter
// ============================================================================

fn bench_filter_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-01-bloom-filter");
    group.measurement_time(Duration::from_secs(5));

    for capacity in [100, 1000, 10_000] {
        let macs = random_macs(capacity);
        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(BenchmarkId::new("add_to_capacity", capacity), &macs, |b, m| {
            b.iter(|| {
                let mut filter = BloomFilter::create(capacity, 0.01).unwrap();
                for mac in m {
                    filter.add(mac.as_bytes());
                }
                black_box(filter.set_bit_count())
            })
        });
    }

    let macs = random_macs(1000);
    let mut filter = BloomFilter::create(1000, 0.01).unwrap();
    for mac in &macs[..500] {
        filter.add(mac.as_bytes());
    }
    group.throughput(Throughput::Elements(1));
    group.bench_function("check_present", |b| {
        b.iter(|| black_box(filter.check(macs[0].as_bytes())))
    });
    group.bench_function("check_absent", |b| {
        b.iter(|| black_box(filter.check(macs[999].as_bytes())))
    });

    let mut other = BloomFilter::create(1000, 0.01).unwrap();
    for mac in &macs[250..750] {
        other.add(mac.as_bytes());
    }
    group.bench_function("estimate_count", |b| {
        b.iter(|| black_box(estimate_count(&filter)))
    });
    group.bench_function("estimate_intersection", |b| {
        b.iter(|| black_box(estimate_intersection(&filter, &other)))
    });

    group.finish();
}

// ============================================================================
// PC-02: Sensor Daemon
// ============================================================================

fn bench_daemon_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-02-epoch-aggregation");
    group.measurement_time(Duration::from_secs(5));

    let daemon = SensorDaemon::init(1000, 0.01, chrono::Duration::seconds(300)).unwrap();
    let macs = random_macs(1000);
    let mut i = 0usize;
    group.bench_function("observe", |b| {
        b.iter(|| {
            i = (i + 1) % macs.len();
            black_box(daemon.observe(&macs[i]))
        })
    });

    group.bench_function("rotate_epoch", |b| {
        b.iter(|| black_box(daemon.rotate_epoch().detections))
    });

    group.finish();
}

criterion_group!(benches, bench_filter_operations, bench_daemon_operations);

criterion_main!(benches);
