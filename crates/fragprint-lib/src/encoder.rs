//! Bit and count fingerprint construction
//!
//! A [`Fingerprinter`] borrows a [`VocabularyIndex`] and nothing else. Every
//! call validates its whole input, then returns a freshly allocated result;
//! nothing is cached between calls, so one fingerprinter (or many sharing
//! the same index) can be used from several threads at once.
//!
//! Count fingerprints have two entry points. The repeated-key list path
//! reduces the list to frequencies and hands them to the frequency path, so
//! both produce identical results for the same multiset.

use crate::constants::is_blank;
use crate::error::{FingerprintError, KeyFault, Result};
use crate::fingerprint::{BitFingerprint, CountFingerprint};
use crate::vocabulary::{validate_keys, VocabularyIndex};
use ahash::AHashMap;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use tracing::debug;

/// Encodes molecule fragment data against a fixed vocabulary
#[derive(Clone, Copy, Debug)]
pub struct Fingerprinter<'a> {
    index: &'a VocabularyIndex,
}

impl<'a> Fingerprinter<'a> {
    /// Create a fingerprinter over `index`
    pub fn new(index: &'a VocabularyIndex) -> Self {
        Self { index }
    }

    /// The vocabulary this fingerprinter encodes against
    pub fn index(&self) -> &'a VocabularyIndex {
        self.index
    }

    /// Dimension of every fingerprint produced
    pub fn size(&self) -> usize {
        self.index.size()
    }

    /// Presence fingerprint of the observed keys
    ///
    /// Repeated keys set the same bit once. Keys outside the vocabulary are
    /// skipped.
    ///
    /// # Errors
    /// Returns `InvalidInput` if any key is blank; no fingerprint is produced.
    pub fn bit_fingerprint<I, S>(&self, observed: I) -> Result<BitFingerprint>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let observed: Vec<S> = observed.into_iter().collect();
        validate_keys(&observed)?;

        let set_positions: BTreeSet<usize> = observed
            .iter()
            .filter_map(|key| self.index.position_of(key.as_ref()))
            .collect();

        debug!(
            observed = observed.len(),
            set = set_positions.len(),
            "encoded bit fingerprint"
        );
        Ok(BitFingerprint::new(self.index.size(), set_positions))
    }

    /// Presence fingerprint of keys that may be missing
    ///
    /// # Errors
    /// Returns `InvalidInput` with [`KeyFault::Null`] for a `None` element.
    pub fn bit_fingerprint_from_optional<'k, I>(&self, observed: I) -> Result<BitFingerprint>
    where
        I: IntoIterator<Item = Option<&'k str>>,
    {
        let observed = require_keys(observed)?;
        self.bit_fingerprint(observed)
    }

    /// Presence fingerprint from key -> frequency pairs
    ///
    /// A key sets its bit when its frequency is positive. Every key is
    /// checked first, including keys whose frequency is zero or negative.
    ///
    /// # Errors
    /// Returns `InvalidInput` if any key is blank; no fingerprint is produced.
    pub fn bit_fingerprint_from_frequencies<I, S, C>(&self, frequencies: I) -> Result<BitFingerprint>
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Borrow<i64>,
    {
        let frequencies: Vec<(S, C)> = frequencies.into_iter().collect();
        validate_keys(frequencies.iter().map(|(key, _)| key.as_ref()))?;
        self.bit_fingerprint(
            frequencies
                .iter()
                .filter(|(_, count)| *Borrow::<i64>::borrow(count) > 0)
                .map(|(key, _)| key.as_ref()),
        )
    }

    /// Count fingerprint from key -> frequency pairs
    ///
    /// Frequencies are stored as given, including zero or negative values.
    /// If the same key appears twice the later frequency wins.
    ///
    /// # Errors
    /// Returns `InvalidInput` if any key is blank; no fingerprint is produced.
    pub fn count_fingerprint_from_frequencies<I, S, C>(&self, frequencies: I) -> Result<CountFingerprint>
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Borrow<i64>,
    {
        let mut count_of = AHashMap::new();
        let mut num_entries = 0usize;

        for (index, (key, count)) in frequencies.into_iter().enumerate() {
            let key = key.as_ref();
            if is_blank(key) {
                return Err(KeyFault::Blank { index }.into());
            }
            num_entries += 1;
            if let Some(position) = self.index.position_of(key) {
                count_of.insert(position, *count.borrow());
            }
        }

        debug!(
            entries = num_entries,
            populated = count_of.len(),
            "encoded count fingerprint"
        );
        Ok(CountFingerprint::new(self.index.size(), count_of))
    }

    /// Count fingerprint from a list of keys with repeats
    ///
    /// # Errors
    /// Returns `InvalidInput` if any key is blank; no fingerprint is produced.
    pub fn count_fingerprint<I, S>(&self, observed: I) -> Result<CountFingerprint>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let observed: Vec<S> = observed.into_iter().collect();
        validate_keys(&observed)?;
        self.count_fingerprint_from_frequencies(frequencies_of(&observed))
    }

    /// Count fingerprint from a list of keys that may be missing
    pub fn count_fingerprint_from_optional<'k, I>(&self, observed: I) -> Result<CountFingerprint>
    where
        I: IntoIterator<Item = Option<&'k str>>,
    {
        let observed = require_keys(observed)?;
        self.count_fingerprint(observed)
    }

    /// Count fingerprint from frequency pairs whose key or value may be missing
    pub fn count_fingerprint_from_optional_frequencies<'k, I>(
        &self,
        frequencies: I,
    ) -> Result<CountFingerprint>
    where
        I: IntoIterator<Item = (Option<&'k str>, Option<i64>)>,
    {
        let frequencies = frequencies
            .into_iter()
            .enumerate()
            .map(|(index, pair)| match pair {
                (Some(key), Some(count)) => Ok((key, count)),
                _ => Err(FingerprintError::from(KeyFault::Null { index })),
            })
            .collect::<Result<Vec<(&str, i64)>>>()?;
        self.count_fingerprint_from_frequencies(frequencies)
    }

    /// Fingerprinting a structured molecule needs an external fragmenter
    /// and is not provided.
    pub fn bit_fingerprint_of_structure<M: ?Sized>(&self, _molecule: &M) -> Result<BitFingerprint> {
        Err(FingerprintError::Unsupported(
            "bit fingerprint of a structured molecule",
        ))
    }

    /// See [`bit_fingerprint_of_structure`](Self::bit_fingerprint_of_structure).
    pub fn count_fingerprint_of_structure<M: ?Sized>(&self, _molecule: &M) -> Result<CountFingerprint> {
        Err(FingerprintError::Unsupported(
            "count fingerprint of a structured molecule",
        ))
    }
}

/// Reduce a repeated-key list to key -> occurrence count
///
/// The order of the returned pairs is unspecified.
pub fn frequencies_of<S: AsRef<str>>(observed: &[S]) -> Vec<(&str, i64)> {
    let mut frequencies: AHashMap<&str, i64> = AHashMap::with_capacity(observed.len());
    for key in observed {
        *frequencies.entry(key.as_ref()).or_insert(0) += 1;
    }
    frequencies.into_iter().collect()
}

fn require_keys<'k, I>(keys: I) -> Result<Vec<&'k str>>
where
    I: IntoIterator<Item = Option<&'k str>>,
{
    keys.into_iter()
        .enumerate()
        .map(|(index, key)| key.ok_or_else(|| FingerprintError::from(KeyFault::Null { index })))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use std::collections::HashMap;

    fn vocabulary() -> VocabularyIndex {
        VocabularyIndex::new(["C", "CC", "CO", "N", "O"]).unwrap()
    }

    #[test]
    fn test_bit_fingerprint_basic() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index)
            .bit_fingerprint(["O", "C", "O", "S"])
            .unwrap();
        assert_eq!(fp.size(), 5);
        assert_eq!(fp.cardinality(), 2);
        assert_eq!(fp.to_dense_bit_array(), vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_bit_fingerprint_order_independent() {
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);
        let a = fingerprinter.bit_fingerprint(["N", "CO", "C"]).unwrap();
        let b = fingerprinter.bit_fingerprint(["C", "N", "CO"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bit_fingerprint_blank_key() {
        let index = vocabulary();
        let result = Fingerprinter::new(&index).bit_fingerprint(["C", "", "O"]);
        assert_eq!(
            result,
            Err(FingerprintError::InvalidInput(KeyFault::Blank { index: 1 }))
        );
    }

    #[test]
    fn test_bit_fingerprint_missing_key() {
        let index = vocabulary();
        let result = Fingerprinter::new(&index).bit_fingerprint_from_optional([Some("C"), None]);
        assert_eq!(
            result,
            Err(FingerprintError::InvalidInput(KeyFault::Null { index: 1 }))
        );
    }

    #[test]
    fn test_empty_input() {
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);
        let bits = fingerprinter.bit_fingerprint(Vec::<&str>::new()).unwrap();
        assert_eq!(bits.cardinality(), 0);
        assert_eq!(bits.size(), 5);

        let counts = fingerprinter.count_fingerprint(Vec::<&str>::new()).unwrap();
        assert_eq!(counts.num_populated_bins(), 0);
    }

    #[test]
    fn test_count_from_list_matches_frequencies() {
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);
        let list = ["CO", "C", "CO", "S", "CO", "N", "S"];

        let from_list = fingerprinter.count_fingerprint(list).unwrap();
        let from_map = fingerprinter
            .count_fingerprint_from_frequencies(&HashMap::from([
                ("CO", 3i64),
                ("C", 1),
                ("S", 2),
                ("N", 1),
            ]))
            .unwrap();

        assert_eq!(from_list, from_map);
        assert_eq!(from_list.to_dense_count_array(), vec![1, 0, 3, 1, 0]);
    }

    #[test]
    fn test_frequencies_pass_through() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index)
            .count_fingerprint_from_frequencies([("C", 0i64), ("O", -2), ("N", 7)])
            .unwrap();
        assert_eq!(fp.num_populated_bins(), 3);
        assert_eq!(fp.get_count(0), Ok(0));
        assert_eq!(fp.get_count(4), Ok(-2));
        assert_eq!(fp.get_count(3), Ok(7));
    }

    #[test]
    fn test_frequencies_last_write_wins() {
        let index = vocabulary();
        let fp = Fingerprinter::new(&index)
            .count_fingerprint_from_frequencies(vec![("C".to_string(), 2i64), ("C".to_string(), 5)])
            .unwrap();
        assert_eq!(fp.get_count(0), Ok(5));
    }

    #[test]
    fn test_bit_from_frequencies_checks_every_key() {
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);

        let fp = fingerprinter
            .bit_fingerprint_from_frequencies([("C", 1i64), ("N", 0), ("O", -2)])
            .unwrap();
        assert_eq!(fp.set_positions().collect::<Vec<_>>(), vec![0]);

        // A blank key is rejected even when its frequency would skip it
        assert_eq!(
            fingerprinter.bit_fingerprint_from_frequencies([("C", 1i64), (" ", 0)]),
            Err(FingerprintError::InvalidInput(KeyFault::Blank { index: 1 }))
        );
    }

    #[test]
    fn test_frequencies_blank_key() {
        let index = vocabulary();
        let result = Fingerprinter::new(&index).count_fingerprint_from_frequencies([("C", 1i64), (" ", 1)]);
        assert_eq!(
            result,
            Err(FingerprintError::InvalidInput(KeyFault::Blank { index: 1 }))
        );
    }

    #[test]
    fn test_optional_frequencies() {
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);
        let result = fingerprinter.count_fingerprint_from_optional_frequencies([
            (Some("C"), Some(1)),
            (Some("O"), None),
        ]);
        assert_eq!(
            result,
            Err(FingerprintError::InvalidInput(KeyFault::Null { index: 1 }))
        );

        let fp = fingerprinter
            .count_fingerprint_from_optional_frequencies([(Some("O"), Some(4))])
            .unwrap();
        assert_eq!(fp.get_count(4), Ok(4));

        assert!(fingerprinter.count_fingerprint_from_optional([None]).is_err());
    }

    #[test]
    fn test_calls_are_independent() {
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);
        let first = fingerprinter.bit_fingerprint(["C"]).unwrap();
        let second = fingerprinter.bit_fingerprint(["O"]).unwrap();
        assert_eq!(first.set_positions().collect::<Vec<_>>(), vec![0]);
        assert_eq!(second.set_positions().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_structure_entry_points_unsupported() {
        struct Molecule;
        let index = vocabulary();
        let fingerprinter = Fingerprinter::new(&index);
        assert!(matches!(
            fingerprinter.bit_fingerprint_of_structure(&Molecule),
            Err(FingerprintError::Unsupported(_))
        ));
        assert!(matches!(
            fingerprinter.count_fingerprint_of_structure(&Molecule),
            Err(FingerprintError::Unsupported(_))
        ));
    }

    #[test]
    fn test_frequencies_of() {
        let mut freqs = frequencies_of(&["a", "b", "a", "a"]);
        freqs.sort_unstable();
        assert_eq!(freqs, vec![("a", 3), ("b", 1)]);
    }
}
