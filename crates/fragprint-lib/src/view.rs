//! Query view pairing a fingerprint with its vocabulary
//!
//! Positions on this surface are signed so that callers passing a negative
//! position get `IndexOutOfRange` instead of a wrapped index.

use crate::error::{FingerprintError, Result};
use crate::fingerprint::{BitFingerprint, CountFingerprint, Fingerprint};
use crate::vocabulary::VocabularyIndex;

/// Read-only view over a fingerprint and the vocabulary it was built from
#[derive(Clone, Copy, Debug)]
pub struct FingerprintView<'a, F> {
    index: &'a VocabularyIndex,
    fingerprint: &'a F,
}

impl<'a, F: Fingerprint> FingerprintView<'a, F> {
    /// Pair `fingerprint` with `index`
    ///
    /// The fingerprint must have been built from `index`; a dimension
    /// mismatch is reported as `InvalidVocabulary`.
    pub fn new(index: &'a VocabularyIndex, fingerprint: &'a F) -> Result<Self> {
        if index.size() != fingerprint.size() {
            return Err(FingerprintError::InvalidVocabulary {
                reason: format!(
                    "fingerprint of size {} does not match vocabulary of size {}",
                    fingerprint.size(),
                    index.size()
                ),
            });
        }
        Ok(Self { index, fingerprint })
    }

    /// Dimension of the fingerprint
    #[inline]
    pub fn size(&self) -> usize {
        self.fingerprint.size()
    }

    /// Underlying fingerprint
    pub fn fingerprint(&self) -> &'a F {
        self.fingerprint
    }

    /// Underlying vocabulary
    pub fn index(&self) -> &'a VocabularyIndex {
        self.index
    }

    fn checked_position(&self, position: i64) -> Result<usize> {
        usize::try_from(position)
            .ok()
            .filter(|&p| p < self.size())
            .ok_or_else(|| FingerprintError::out_of_range(position.into(), self.size()))
    }

    /// Vocabulary key behind `position`
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` for negative positions or `position >= size()`.
    pub fn get_bit_definition(&self, position: i64) -> Result<&'a str> {
        let position = self.checked_position(position)?;
        self.index.key_at(position)
    }

    /// Whether the vocabulary defines a hash at `position`
    ///
    /// This asks whether the key at `position` is known to the index lookup,
    /// not whether this molecule populated the bin.
    pub fn has_hash(&self, position: i64) -> bool {
        match self.checked_position(position) {
            Ok(p) => self
                .index
                .key_at(p)
                .map(|key| self.index.contains(key))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Keys of the populated bins, in position order
    pub fn populated_keys(&self) -> Result<Vec<&'a str>> {
        self.fingerprint
            .populated_positions()
            .into_iter()
            .map(|position| self.index.key_at(position))
            .collect()
    }
}

impl<'a> FingerprintView<'a, BitFingerprint> {
    /// Number of set bits
    pub fn cardinality(&self) -> usize {
        self.fingerprint.cardinality()
    }

    /// Dense 0/1 vector of length `size()`
    pub fn to_dense_bit_array(&self) -> Vec<u8> {
        self.fingerprint.to_dense_bit_array()
    }

    /// Whether `key` is in the vocabulary and set in this fingerprint
    pub fn contains_key(&self, key: &str) -> bool {
        self.index
            .position_of(key)
            .is_some_and(|p| self.fingerprint.is_populated(p))
    }
}

impl<'a> FingerprintView<'a, CountFingerprint> {
    /// Number of populated bins
    pub fn num_populated_bins(&self) -> usize {
        self.fingerprint.num_populated_bins()
    }

    /// Count at `position`, 0 for an unpopulated bin
    pub fn get_count(&self, position: i64) -> Result<i64> {
        let position = self.checked_position(position)?;
        self.fingerprint.get_count(position)
    }

    /// Hash of the bin at `position` (the position itself)
    pub fn get_hash(&self, position: i64) -> Result<usize> {
        let position = self.checked_position(position)?;
        self.fingerprint.get_hash(position)
    }

    /// Same as [`get_count`](Self::get_count)
    pub fn get_count_for_hash(&self, hash: i64) -> Result<i64> {
        self.get_count(hash)
    }

    /// Count recorded for `key`, 0 when the key is not in the vocabulary
    pub fn count_occurrences_of(&self, key: &str) -> Result<i64> {
        match self.index.position_of(key) {
            Some(position) => self.fingerprint.get_count(position),
            None => Ok(0),
        }
    }

    /// Dense count vector of length `size()`
    pub fn to_dense_count_array(&self) -> Vec<i64> {
        self.fingerprint.to_dense_count_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Fingerprinter;

    fn vocabulary() -> VocabularyIndex {
        VocabularyIndex::new(["C(=O)O", "CN", "O", "c1ccccc1"]).unwrap()
    }

    #[test]
    fn test_bit_definition_round_trip() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index).bit_fingerprint(["O", "c1ccccc1"]).unwrap();
        let view = FingerprintView::new(&index, &fp).unwrap();

        assert_eq!(view.get_bit_definition(2).unwrap(), "O");
        assert_eq!(view.populated_keys().unwrap(), vec!["O", "c1ccccc1"]);
        assert!(view.contains_key("O"));
        assert!(!view.contains_key("CN"));
        assert!(!view.contains_key("S"));
    }

    #[test]
    fn test_bounds() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index).count_fingerprint(["O", "O"]).unwrap();
        let view = FingerprintView::new(&index, &fp).unwrap();

        for position in [-1, 4, 100] {
            assert!(matches!(
                view.get_count(position),
                Err(FingerprintError::IndexOutOfRange { .. })
            ));
            assert!(view.get_hash(position).is_err());
            assert!(view.get_bit_definition(position).is_err());
            assert!(!view.has_hash(position));
        }
        assert_eq!(view.get_count(2).unwrap(), 2);
    }

    #[test]
    fn test_has_hash_ignores_population() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index).count_fingerprint(["O"]).unwrap();
        let view = FingerprintView::new(&index, &fp).unwrap();

        assert!(view.has_hash(0));
        assert!(view.has_hash(2));
        assert!(view.has_hash(3));
    }

    #[test]
    fn test_count_occurrences_of() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index)
            .count_fingerprint(["CN", "CN", "CN", "S"])
            .unwrap();
        let view = FingerprintView::new(&index, &fp).unwrap();

        assert_eq!(view.count_occurrences_of("CN").unwrap(), 3);
        assert_eq!(view.count_occurrences_of("O").unwrap(), 0);
        assert_eq!(view.count_occurrences_of("S").unwrap(), 0);
    }

    #[test]
    fn test_mismatched_vocabulary() {
        let index = vocabulary();
        let other = VocabularyIndex::new(["C"]).unwrap();
        let fp = Fingerprinter::new(&other).bit_fingerprint(["C"]).unwrap();
        assert!(FingerprintView::new(&index, &fp).is_err());
    }
}
