//! Core Bloom filter
//!
//! INVARIANTS:
//! - No false negatives: if added, `check()` MUST return true
//! - Shape (m, k) is fixed for the lifetime of the filter
//! - Bits are never cleared; a new epoch gets a new filter

use bitvec::prelude::*;

use super::hash_functions::hash_positions;
use super::parameters::{calculate_parameters, FilterParams};
use crate::error::FilterError;

/// Fixed-capacity probabilistic set of device identifiers
///
/// False positives are possible, false negatives are not. The false positive
/// rate approaches the design `p` as the filter reaches its capacity `n` and
/// keeps rising beyond it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    bits: BitVec<u8, Lsb0>,
    /// Size in bits (m)
    m: usize,
    /// Number of hash functions (k)
    k: usize,
}

impl BloomFilter {
    /// Create a filter sized for `capacity` items at false positive rate `fpr`
    ///
    /// # Errors
    /// `InvalidParameter` if `capacity == 0` or `fpr` is not in `(0, 1)`.
    pub fn create(capacity: usize, fpr: f64) -> Result<Self, FilterError> {
        let params = calculate_parameters(capacity, fpr)?;
        Ok(Self::with_params(&params))
    }

    /// Create an empty filter with a previously calculated shape
    pub fn with_params(params: &FilterParams) -> Self {
        Self::with_shape(params.size_bits, params.hash_count)
    }

    /// Create an empty filter with an explicit shape
    ///
    /// `m` and `k` are raised to 1 if given as 0.
    pub fn with_shape(m: usize, k: usize) -> Self {
        let m = m.max(1);
        Self {
            bits: bitvec![u8, Lsb0; 0; m],
            m,
            k: k.max(1),
        }
    }

    /// Insert an item
    ///
    /// Idempotent: re-adding an item only touches bits that are already set.
    pub fn add(&mut self, item: &[u8]) {
        for pos in hash_positions(item, self.k, self.m) {
            self.bits.set(pos, true);
        }
    }

    /// Test whether an item might be in the set
    ///
    /// Returns `false` only if the item was definitely never added.
    pub fn check(&self, item: &[u8]) -> bool {
        hash_positions(item, self.k, self.m).all(|pos| self.bits[pos])
    }

    /// Number of bits currently set (t)
    pub fn set_bit_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Filter size in bits (m)
    pub fn size_bits(&self) -> usize {
        self.m
    }

    /// Number of hash functions (k)
    pub fn hash_count(&self) -> usize {
        self.k
    }

    /// Whether every bit is set; estimators are undefined on such a filter
    pub fn is_saturated(&self) -> bool {
        self.bits.all()
    }

    /// Whether two filters share `m` and `k`
    pub fn same_shape(&self, other: &BloomFilter) -> bool {
        self.m == other.m && self.k == other.k
    }

    /// Export the bit array as `m` integers, each `0` or `1`
    ///
    /// This is the plaintext handed to the encryption service.
    pub fn to_bit_array(&self) -> Vec<u8> {
        self.bits.iter().map(|bit| u8::from(*bit)).collect()
    }

    /// Number of positions set in both filters
    ///
    /// Callers must check `same_shape` first.
    pub(crate) fn and_count(&self, other: &BloomFilter) -> usize {
        self.raw()
            .iter()
            .zip(other.raw())
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Number of positions set in either filter
    pub(crate) fn or_count(&self, other: &BloomFilter) -> usize {
        self.raw()
            .iter()
            .zip(other.raw())
            .map(|(a, b)| (a | b).count_ones() as usize)
            .sum()
    }

    /// Backing bytes; bits past `m` in the last byte are always zero
    fn raw(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}
