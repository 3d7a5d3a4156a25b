//! Encoding configuration
//!
//! Parameters shared by vocabulary construction, vocabulary derivation,
//! the file loader and the batch encoder.

use crate::constants::{DEFAULT_DELIMITER, DEFAULT_MIN_OCCURRENCES, FREQUENCY_SEPARATOR};

/// How a vocabulary containing the same key twice is handled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    /// The later occurrence takes over the key's position. The vocabulary
    /// size still counts both entries, so the earlier position can no longer
    /// be reached by key lookup.
    #[default]
    LastWriteWins,
    /// Construction fails with `InvalidVocabulary`
    Reject,
}

/// Configuration parameters for building and applying fingerprints
#[derive(Debug, Clone)]
pub struct EncodingConfiguration {
    /// Handling of duplicated vocabulary keys
    pub duplicate_keys: DuplicateKeyPolicy,

    /// Exclusive occurrence threshold for derived vocabularies
    pub min_occurrences: usize,

    /// Number of threads for batch encoding (0 = all available cores)
    pub num_threads: usize,

    /// Field delimiter for molecule and output files
    pub delimiter: char,

    /// Verbose output during batch runs
    pub verbose: bool,
}

impl Default for EncodingConfiguration {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::LastWriteWins,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
            num_threads: 0,
            delimiter: DEFAULT_DELIMITER,
            verbose: false,
        }
    }
}

impl EncodingConfiguration {
    /// Create a configuration with the given duplicate-key policy
    pub fn new(duplicate_keys: DuplicateKeyPolicy) -> Result<Self, String> {
        let config = Self {
            duplicate_keys,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.delimiter == FREQUENCY_SEPARATOR {
            return Err(format!(
                "delimiter must differ from the frequency separator '{}'",
                FREQUENCY_SEPARATOR
            ));
        }
        if self.delimiter.is_whitespace() && self.delimiter != '\t' {
            return Err(format!(
                "whitespace delimiter {:?} is not supported, use tab",
                self.delimiter
            ));
        }
        Ok(())
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Encoding Configuration:");
        tracing::info!("  duplicate_keys = {:?}", self.duplicate_keys);
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::debug!("  min_occurrences = {}", self.min_occurrences);
        tracing::debug!("  delimiter = {:?}", self.delimiter);
        tracing::debug!("  verbose = {}", self.verbose);
    }
}
