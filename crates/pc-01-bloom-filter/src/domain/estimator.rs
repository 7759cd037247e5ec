//! Cardinality estimators
//!
//! Recover approximate distinct-item counts from set-bit counts.
//!
//! - count:        ceil( -(m/k) * ln(1 - t/m) )
//! - intersection: c1 treats the bitwise AND as a filter built from the
//!   intersection alone; c2 corrects for bits two independently populated
//!   filters share by chance:
//!
//!   c2 = ceil( (ln(m - (t*m - t1*t2)/(m - t1 - t2 + t)) - ln(m)) / (k * ln(1 - 1/m)) )
//!
//! All results are estimates. Relative error grows as the true intersection
//! approaches 0 and as the union approaches filter capacity.

use serde::{Deserialize, Serialize};

use super::bloom_filter::BloomFilter;
use crate::error::EstimatorError;

/// Result of `estimate_intersection`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionEstimate {
    /// First-order estimate from the AND filter; overestimates when many
    /// bits coincide by chance
    pub naive: u64,
    /// Estimate corrected for incidental overlap, clamped at 0
    pub corrected: u64,
}

/// Estimate the number of distinct items added to `filter`
///
/// # Errors
/// `DegenerateFilter` if every bit is set.
pub fn estimate_count(filter: &BloomFilter) -> Result<u64, EstimatorError> {
    count_from_bits(
        filter.size_bits(),
        filter.hash_count(),
        filter.set_bit_count(),
    )
}

/// Estimate the size of the union of the sets behind two filters
///
/// # Errors
/// `IncompatibleFilters` on shape mismatch, `DegenerateFilter` if the OR of
/// the two filters is saturated.
pub fn estimate_union(a: &BloomFilter, b: &BloomFilter) -> Result<u64, EstimatorError> {
    ensure_same_shape(a, b)?;
    count_from_bits(a.size_bits(), a.hash_count(), a.or_count(b))
}

/// Estimate the size of the intersection of the sets behind two filters
///
/// # Errors
/// - `IncompatibleFilters` if `m` or `k` differ
/// - `DegenerateFilter` if either filter (or their AND) is saturated, or the
///   corrected formula leaves its domain
pub fn estimate_intersection(
    a: &BloomFilter,
    b: &BloomFilter,
) -> Result<IntersectionEstimate, EstimatorError> {
    ensure_same_shape(a, b)?;

    let m = a.size_bits();
    let k = a.hash_count();
    if m < 2 {
        return Err(EstimatorError::degenerate("intersection needs at least 2 bits"));
    }

    let t = a.and_count(b);
    let t1 = a.set_bit_count();
    let t2 = b.set_bit_count();
    if t1 == m || t2 == m {
        return Err(EstimatorError::degenerate("input filter is saturated"));
    }

    let naive = count_from_bits(m, k, t)?;

    let (mf, kf) = (m as f64, k as f64);
    let (tf, t1f, t2f) = (t as f64, t1 as f64, t2 as f64);

    let denominator = mf - t1f - t2f + tf;
    if denominator <= 0.0 {
        return Err(EstimatorError::degenerate(format!(
            "m - t1 - t2 + t = {denominator} is not positive"
        )));
    }
    let log_arg = mf - (tf * mf - t1f * t2f) / denominator;
    if log_arg <= 0.0 {
        return Err(EstimatorError::degenerate(format!(
            "log argument {log_arg} is not positive"
        )));
    }

    let raw = (log_arg.ln() - mf.ln()) / (kf * (1.0 - 1.0 / mf).ln());
    if !raw.is_finite() {
        return Err(EstimatorError::degenerate("corrected estimate is not finite"));
    }
    // Negative values are noise around a true intersection of 0
    let corrected = raw.ceil().max(0.0) as u64;

    Ok(IntersectionEstimate { naive, corrected })
}

fn count_from_bits(m: usize, k: usize, t: usize) -> Result<u64, EstimatorError> {
    if t >= m {
        return Err(EstimatorError::degenerate(format!(
            "all {m} bits are set"
        )));
    }
    let (mf, kf, tf) = (m as f64, k as f64, t as f64);
    let estimate = (-(mf / kf) * (1.0 - tf / mf).ln()).ceil();
    Ok(estimate.max(0.0) as u64)
}

fn ensure_same_shape(a: &BloomFilter, b: &BloomFilter) -> Result<(), EstimatorError> {
    if a.same_shape(b) {
        Ok(())
    } else {
        Err(EstimatorError::IncompatibleFilters {
            left_size: a.size_bits(),
            left_hashes: a.hash_count(),
            right_size: b.size_bits(),
            right_hashes: b.hash_count(),
        })
    }
}
