//! Domain Layer - Pure logic
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - Pure functions where possible

pub mod bloom_filter;
pub mod estimator;
pub mod hash_functions;
pub mod parameters;

pub use bloom_filter::BloomFilter;
pub use estimator::{estimate_count, estimate_intersection, estimate_union, IntersectionEstimate};
pub use parameters::{calculate_parameters, expected_false_positive_rate, FilterParams};
