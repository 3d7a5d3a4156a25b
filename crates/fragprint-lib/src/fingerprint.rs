//! Fingerprint result types
//!
//! Both results are sparse: a bit fingerprint keeps the set of populated
//! positions, a count fingerprint keeps position -> frequency for the
//! populated positions only. Neither holds a reference to the vocabulary
//! they were built from; translating positions back to keys goes through
//! [`FingerprintView`](crate::view::FingerprintView).
//!
//! In this engine the "hash" of a bin is its vocabulary position.

use crate::error::{FingerprintError, Result};
use ahash::AHashMap;
use std::collections::BTreeSet;

/// Common surface of bit and count fingerprints
pub trait Fingerprint {
    /// Dimension of the fingerprint (the vocabulary size)
    fn size(&self) -> usize;

    /// Whether the bin at `position` was populated for this molecule
    fn is_populated(&self, position: usize) -> bool;

    /// Populated positions in ascending order
    fn populated_positions(&self) -> Vec<usize>;
}

/// Presence/absence fingerprint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitFingerprint {
    size: usize,
    set_positions: BTreeSet<usize>,
}

impl BitFingerprint {
    pub(crate) fn new(size: usize, set_positions: BTreeSet<usize>) -> Self {
        debug_assert!(set_positions.iter().all(|&p| p < size));
        Self { size, set_positions }
    }

    /// Number of set bits
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.set_positions.len()
    }

    /// Whether the bit at `position` is set
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `position >= size()`.
    pub fn get(&self, position: usize) -> Result<bool> {
        if position >= self.size {
            return Err(FingerprintError::out_of_range(position as i128, self.size));
        }
        Ok(self.set_positions.contains(&position))
    }

    /// Set positions in ascending order
    pub fn set_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.set_positions.iter().copied()
    }

    /// Dense 0/1 vector of length `size()`
    pub fn to_dense_bit_array(&self) -> Vec<u8> {
        let mut dense = vec![0u8; self.size];
        for &position in &self.set_positions {
            dense[position] = 1;
        }
        dense
    }
}

impl Fingerprint for BitFingerprint {
    fn size(&self) -> usize {
        self.size
    }

    fn is_populated(&self, position: usize) -> bool {
        self.set_positions.contains(&position)
    }

    fn populated_positions(&self) -> Vec<usize> {
        self.set_positions.iter().copied().collect()
    }
}

/// Frequency fingerprint
///
/// Counts are stored exactly as supplied, so a caller-provided zero or
/// negative frequency is kept as a populated bin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountFingerprint {
    size: usize,
    count_of: AHashMap<usize, i64>,
}

impl CountFingerprint {
    pub(crate) fn new(size: usize, count_of: AHashMap<usize, i64>) -> Self {
        debug_assert!(count_of.keys().all(|&p| p < size));
        Self { size, count_of }
    }

    /// Number of entries in the sparse map
    ///
    /// Equals `size()` only when every vocabulary key occurred.
    #[inline]
    pub fn num_populated_bins(&self) -> usize {
        self.count_of.len()
    }

    /// Count at `position`, 0 for an unpopulated bin
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `position >= size()`.
    pub fn get_count(&self, position: usize) -> Result<i64> {
        if position >= self.size {
            return Err(FingerprintError::out_of_range(position as i128, self.size));
        }
        Ok(self.count_of.get(&position).copied().unwrap_or(0))
    }

    /// Hash of the bin at `position`, which is the position itself
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `position >= size()`.
    pub fn get_hash(&self, position: usize) -> Result<usize> {
        if position >= self.size {
            return Err(FingerprintError::out_of_range(position as i128, self.size));
        }
        Ok(position)
    }

    /// Count for the bin whose hash is `hash`; same as [`get_count`](Self::get_count)
    pub fn get_count_for_hash(&self, hash: usize) -> Result<i64> {
        self.get_count(hash)
    }

    /// Populated `(position, count)` pairs in ascending position order
    pub fn populated_bins(&self) -> Vec<(usize, i64)> {
        let mut bins: Vec<(usize, i64)> = self.count_of.iter().map(|(&p, &c)| (p, c)).collect();
        bins.sort_unstable_by_key(|&(p, _)| p);
        bins
    }

    /// Dense count vector of length `size()`
    pub fn to_dense_count_array(&self) -> Vec<i64> {
        let mut dense = vec![0i64; self.size];
        for (&position, &count) in &self.count_of {
            dense[position] = count;
        }
        dense
    }

    /// Merging count fingerprints is not provided
    pub fn merge(&mut self, _other: &CountFingerprint) -> Result<()> {
        Err(FingerprintError::Unsupported("merging count fingerprints"))
    }

    /// Switching a count fingerprint to bit behaviour is not provided
    pub fn set_behave_as_bit_fingerprint(&mut self, _behave_as_bits: bool) -> Result<()> {
        Err(FingerprintError::Unsupported("behave-as-bit-fingerprint mode"))
    }
}

impl Fingerprint for CountFingerprint {
    fn size(&self) -> usize {
        self.size
    }

    fn is_populated(&self, position: usize) -> bool {
        self.count_of.contains_key(&position)
    }

    fn populated_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.count_of.keys().copied().collect();
        positions.sort_unstable();
        positions
    }
}
