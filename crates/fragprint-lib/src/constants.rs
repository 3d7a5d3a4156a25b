//! Constants and defaults for fragprint
//!
//! Defaults used by the configuration, the loader and vocabulary derivation.

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Default exclusive occurrence threshold for vocabulary derivation.
///
/// A fragment must occur more than this many times across a dataset to
/// enter a derived vocabulary.
pub const DEFAULT_MIN_OCCURRENCES: usize = 2;

/// Default field delimiter for molecule and fingerprint files
pub const DEFAULT_DELIMITER: char = '\t';

/// Separator between a key and its frequency in frequency-form entries
pub const FREQUENCY_SEPARATOR: char = ':';

/// Prefix marking a comment line in vocabulary files
pub const COMMENT_PREFIX: char = '#';

/// A key is blank when it is empty or whitespace-only
#[inline]
pub fn is_blank(key: &str) -> bool {
    key.trim().is_empty()
}
