//! # PC-01 Bloom Filter
//!
//! Probabilistic presence set used by the sensor to deduplicate device
//! identifiers within an epoch, plus the estimators consumers use to recover
//! crowd size and crowd flow from filters.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O, no async
//!   - `BloomFilter`: fixed-shape bit array with a seeded MurmurHash3 family
//!   - `parameters`: size/hash-count formulas
//!   - `estimator`: cardinality, union and intersection estimators
//! - **Metrics** (`metrics`): lock-free counters for filter allocation and
//!   membership checks
//!
//! ## Invariants
//!
//! - **No false negatives**: after `add(x)`, `check(x)` is always true
//! - **Shape is fixed**: `m` and `k` never change; bits are only cleared by
//!   replacing the whole filter
//! - **Idempotent add**: re-adding a present item never changes `set_bit_count()`
//!
//! ## Usage Example
//!
//! ```
//! use pc_01_bloom_filter::{estimate_count, BloomFilter};
//!
//! let mut filter = BloomFilter::create(100, 0.01).unwrap();
//! filter.add(b"cc:00:00:00:00:01");
//!
//! assert!(filter.check(b"cc:00:00:00:00:01"));
//! assert!(estimate_count(&filter).unwrap() >= 1);
//! ```

pub mod domain;
pub mod error;
pub mod metrics;

pub use domain::{
    calculate_parameters, estimate_count, estimate_intersection, estimate_union,
    expected_false_positive_rate, BloomFilter, FilterParams, IntersectionEstimate,
};
pub use error::{EstimatorError, FilterError};
pub use metrics::{Metrics, MetricsSnapshot};
