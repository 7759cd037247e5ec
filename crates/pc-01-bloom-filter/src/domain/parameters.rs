//! Bloom filter shape calculation
//!
//! Formulas:
//! - m = ceil(-n*ln(p) / (ln(2)^2))  -- bits
//! - k = floor((m/n) * ln(2))        -- hash functions, at least 1

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Shape of a Bloom filter derived from its design parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Expected number of distinct items (n)
    pub capacity: usize,
    /// Target false positive probability (p)
    pub false_positive_rate: f64,
    /// Number of bits in the filter (m)
    pub size_bits: usize,
    /// Number of hash functions (k)
    pub hash_count: usize,
}

/// Calculate the filter shape for `capacity` items at false positive rate `fpr`
///
/// # Errors
/// `InvalidParameter` if `capacity == 0` or `fpr` is not strictly inside `(0, 1)`.
pub fn calculate_parameters(capacity: usize, fpr: f64) -> Result<FilterParams, FilterError> {
    if capacity == 0 {
        return Err(FilterError::InvalidParameter {
            reason: "expected item count must be positive".to_string(),
        });
    }
    // NaN fails both comparisons, so it is rejected here too
    if !(fpr > 0.0 && fpr < 1.0) {
        return Err(FilterError::InvalidParameter {
            reason: format!("false positive probability {fpr} must be in (0, 1)"),
        });
    }

    let n = capacity as f64;
    let m = (-n * fpr.ln() / (LN_2 * LN_2)).ceil();
    if !m.is_finite() || m > usize::MAX as f64 {
        return Err(FilterError::InvalidParameter {
            reason: format!("filter for n={capacity}, p={fpr} does not fit in memory"),
        });
    }
    let size_bits = (m as usize).max(1);
    let hash_count = (((size_bits as f64) / n) * LN_2).floor() as usize;

    Ok(FilterParams {
        capacity,
        false_positive_rate: fpr,
        size_bits,
        hash_count: hash_count.max(1),
    })
}

/// Expected false positive rate after `n` distinct insertions
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn expected_false_positive_rate(size_bits: usize, hash_count: usize, n: usize) -> f64 {
    if size_bits == 0 {
        return 1.0;
    }
    let exponent = -(hash_count as f64) * (n as f64) / (size_bits as f64);
    (1.0 - exponent.exp()).powi(hash_count as i32)
}
