//! Hash family for the Bloom filter
//!
//! Slot `i` of an item is `murmur3_32(item, seed = i)` reduced modulo `m`.
//! The 32-bit digest is read as a signed integer and reduced with a
//! non-negative remainder, which keeps bit positions identical to the
//! deployed sensors that share filters with this implementation.

use std::io::Cursor;

/// MurmurHash3 (x86, 32-bit) of `item` with the given seed
pub fn murmur_hash(item: &[u8], seed: u32) -> u32 {
    let mut cursor = Cursor::new(item);
    // Reading from an in-memory cursor cannot fail
    murmur3::murmur3_32(&mut cursor, seed).unwrap_or(0)
}

/// Bit position of `item` for hash function `seed` in a filter of `m` bits
pub fn slot(item: &[u8], seed: u32, m: usize) -> usize {
    let signed = murmur_hash(item, seed) as i32 as i64;
    signed.rem_euclid(m as i64) as usize
}

/// Iterate the `k` bit positions of `item` in a filter of `m` bits
pub fn hash_positions(item: &[u8], k: usize, m: usize) -> impl Iterator<Item = usize> + '_ {
    (0..k as u32).map(move |seed| slot(item, seed, m))
}
