//! Vocabulary index
//!
//! Owns the ordered list of fragment keys that defines the fingerprint
//! dimensions, together with an O(1) key -> position lookup. Every key owns
//! exactly one position, so there are no bucket collisions.
//!
//! The index never reorders its input. Callers that want a sorted vocabulary
//! sort before construction (see [`derive_vocabulary`]).

use crate::config::{DuplicateKeyPolicy, EncodingConfiguration};
use crate::constants::is_blank;
use crate::error::{FingerprintError, KeyFault, Result};
use ahash::AHashMap;
use tracing::{debug, warn};

/// Immutable key <-> position index over a fragment vocabulary
#[derive(Debug, Clone)]
pub struct VocabularyIndex {
    /// Keys in caller order; `keys.len()` is the fingerprint dimension
    keys: Vec<String>,
    /// key -> position; with duplicates the last occurrence wins
    position_of: AHashMap<String, usize>,
}

impl VocabularyIndex {
    /// Build an index with the default (last-write-wins) duplicate policy
    ///
    /// # Errors
    /// Returns `InvalidVocabulary` if any key is blank.
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_policy(keys, DuplicateKeyPolicy::LastWriteWins)
    }

    /// Build an index using the duplicate policy of `config`
    pub fn with_config<I, S>(keys: I, config: &EncodingConfiguration) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_policy(keys, config.duplicate_keys)
    }

    /// Build an index with an explicit duplicate policy
    ///
    /// # Errors
    /// Returns `InvalidVocabulary` if any key is blank, or if a key repeats
    /// under [`DuplicateKeyPolicy::Reject`].
    pub fn with_policy<I, S>(keys: I, policy: DuplicateKeyPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let mut position_of = AHashMap::with_capacity(keys.len());

        for (position, key) in keys.iter().enumerate() {
            if is_blank(key) {
                return Err(FingerprintError::InvalidVocabulary {
                    reason: format!("blank key at position {}", position),
                });
            }
            if let Some(earlier) = position_of.insert(key.clone(), position) {
                match policy {
                    DuplicateKeyPolicy::Reject => {
                        return Err(FingerprintError::InvalidVocabulary {
                            reason: format!(
                                "duplicate key {:?} at positions {} and {}",
                                key, earlier, position
                            ),
                        });
                    }
                    DuplicateKeyPolicy::LastWriteWins => {
                        warn!(
                            key = %key,
                            earlier,
                            position,
                            "duplicate vocabulary key, earlier position becomes unreachable"
                        );
                    }
                }
            }
        }

        debug!(size = keys.len(), distinct = position_of.len(), "built vocabulary index");
        Ok(Self { keys, position_of })
    }

    /// Build an index from vocabulary entries that may be missing
    ///
    /// Loaders that model absent cells hand their rows here; a `None`
    /// element fails like a blank one.
    pub fn from_optional<'a, I>(keys: I, policy: DuplicateKeyPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let keys = keys
            .into_iter()
            .enumerate()
            .map(|(position, key)| {
                key.ok_or_else(|| FingerprintError::InvalidVocabulary {
                    reason: format!("missing key at position {}", position),
                })
            })
            .collect::<Result<Vec<&str>>>()?;
        Self::with_policy(keys, policy)
    }

    /// Derive a vocabulary from a dataset and index it
    ///
    /// Keys are those occurring more than `config.min_occurrences` times,
    /// in sorted order.
    pub fn derived<M, L, S>(molecules: M, config: &EncodingConfiguration) -> Result<Self>
    where
        M: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = derive_vocabulary(molecules, config.min_occurrences)?;
        Self::with_config(keys, config)
    }

    /// Number of positions (the fingerprint dimension)
    #[inline]
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// Whether the vocabulary has no keys
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of `key`, or `None` if the key is not in the vocabulary
    #[inline]
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.position_of.get(key).copied()
    }

    /// Whether `key` is in the vocabulary
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.position_of.contains_key(key)
    }

    /// Key stored at `position`
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `position >= size()`.
    pub fn key_at(&self, position: usize) -> Result<&str> {
        self.keys
            .get(position)
            .map(String::as_str)
            .ok_or_else(|| FingerprintError::out_of_range(position as i128, self.size()))
    }

    /// All keys in position order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of keys reachable by lookup
    ///
    /// Smaller than [`size`](Self::size) only when a duplicated key was
    /// accepted under last-write-wins.
    pub fn num_distinct_keys(&self) -> usize {
        self.position_of.len()
    }
}

/// Check every key of a molecule's input for blankness
pub(crate) fn validate_keys<I, S>(keys: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (index, key) in keys.into_iter().enumerate() {
        if is_blank(key.as_ref()) {
            return Err(KeyFault::Blank { index }.into());
        }
    }
    Ok(())
}

/// Derive a sorted vocabulary from a dataset of fragment lists
///
/// Counts every occurrence of every fragment across all molecules and keeps
/// the keys whose total count is strictly greater than `min_occurrences`.
/// The result is sorted in byte order.
///
/// # Errors
/// Returns `InvalidInput` if any fragment is blank.
pub fn derive_vocabulary<M, L, S>(molecules: M, min_occurrences: usize) -> Result<Vec<String>>
where
    M: IntoIterator<Item = L>,
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    derive_vocabulary_from_frequencies(
        molecules
            .into_iter()
            .map(|fragments| fragments.into_iter().map(|fragment| (fragment, 1i64))),
        min_occurrences,
    )
}

/// Derive a sorted vocabulary from per-molecule key -> frequency pairs
///
/// Each pair adds its frequency to the key's total; non-positive
/// frequencies add nothing but their keys are still validated. Totals
/// saturate instead of overflowing.
///
/// # Errors
/// Returns `InvalidInput` if any key is blank.
pub fn derive_vocabulary_from_frequencies<M, L, S>(
    molecules: M,
    min_occurrences: usize,
) -> Result<Vec<String>>
where
    M: IntoIterator<Item = L>,
    L: IntoIterator<Item = (S, i64)>,
    S: AsRef<str>,
{
    let mut occurrences: AHashMap<String, u64> = AHashMap::new();
    let mut num_molecules = 0usize;

    for fragments in molecules {
        num_molecules += 1;
        for (index, (fragment, count)) in fragments.into_iter().enumerate() {
            let fragment = fragment.as_ref();
            if is_blank(fragment) {
                return Err(KeyFault::Blank { index }.into());
            }
            let count = count.max(0) as u64;
            match occurrences.get_mut(fragment) {
                Some(total) => *total = total.saturating_add(count),
                None => {
                    occurrences.insert(fragment.to_owned(), count);
                }
            }
        }
    }

    let threshold = min_occurrences as u64;
    let mut keys: Vec<String> = occurrences
        .into_iter()
        .filter(|&(_, total)| total > threshold)
        .map(|(key, _)| key)
        .collect();
    keys.sort_unstable();

    debug!(
        num_molecules,
        num_keys = keys.len(),
        min_occurrences,
        "derived vocabulary"
    );
    Ok(keys)
}
