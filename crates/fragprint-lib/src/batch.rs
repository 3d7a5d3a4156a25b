//! Parallel fingerprinting of many molecules
//!
//! The vocabulary index is shared read-only across a rayon thread pool.
//! Each record gets its own [`Fingerprinter`] call and its own result, and
//! output order follows input order. Every record is encoded before errors
//! are inspected, so a failing batch always reports the first bad record.

use crate::config::EncodingConfiguration;
use crate::encoder::Fingerprinter;
use crate::error::FingerprintError;
use crate::fingerprint::{BitFingerprint, CountFingerprint};
use crate::parse::{MoleculeFragments, MoleculeRecord};
use crate::vocabulary::VocabularyIndex;
use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

/// A batch failure, naming the molecule that caused it
#[derive(Error, Debug)]
pub enum BatchError {
    /// Encoding one record failed
    #[error("molecule {name}: {source}")]
    Record {
        /// Name of the failing molecule
        name: String,
        /// Underlying encoding error
        #[source]
        source: FingerprintError,
    },
    /// The thread pool could not be created
    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Encodes batches of molecule records against one vocabulary
pub struct BatchEncoder<'a> {
    fingerprinter: Fingerprinter<'a>,
    config: EncodingConfiguration,
}

impl<'a> BatchEncoder<'a> {
    /// Create a batch encoder
    pub fn new(index: &'a VocabularyIndex, config: EncodingConfiguration) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            fingerprinter: Fingerprinter::new(index),
            config,
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &EncodingConfiguration {
        &self.config
    }

    /// Bit fingerprints of all records, in input order
    ///
    /// A frequency record sets the bits of keys with a positive frequency.
    pub fn encode_bits(&self, records: &[MoleculeRecord]) -> Result<Vec<BitFingerprint>, BatchError> {
        self.run("bit", records, |fingerprinter, record| match &record.fragments {
            MoleculeFragments::List(keys) => fingerprinter.bit_fingerprint(keys),
            MoleculeFragments::Frequencies(pairs) => fingerprinter
                .bit_fingerprint_from_frequencies(pairs.iter().map(|(key, count)| (key, count))),
        })
    }

    /// Count fingerprints of all records, in input order
    pub fn encode_counts(&self, records: &[MoleculeRecord]) -> Result<Vec<CountFingerprint>, BatchError> {
        self.run("count", records, |fingerprinter, record| match &record.fragments {
            MoleculeFragments::List(keys) => fingerprinter.count_fingerprint(keys),
            MoleculeFragments::Frequencies(pairs) => fingerprinter
                .count_fingerprint_from_frequencies(pairs.iter().map(|(key, count)| (key, count))),
        })
    }

    fn run<T, F>(&self, kind: &str, records: &[MoleculeRecord], encode: F) -> Result<Vec<T>, BatchError>
    where
        T: Send,
        F: Fn(&Fingerprinter<'a>, &MoleculeRecord) -> crate::error::Result<T> + Sync,
    {
        // num_threads == 0 means "all cores" (rayon default).
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()?;

        if self.config.verbose {
            info!(
                "Encoding {} {} fingerprints of size {}...",
                records.len(),
                kind,
                self.fingerprinter.size()
            );
        }

        let fingerprinter = &self.fingerprinter;
        let outcomes: Vec<crate::error::Result<T>> = pool.install(|| {
            records
                .par_iter()
                .map(|record| encode(fingerprinter, record))
                .collect()
        });

        // Report the earliest failing record in input order, whichever
        // thread finished first.
        let results = records
            .iter()
            .zip(outcomes)
            .map(|(record, outcome)| {
                outcome.map_err(|source| BatchError::Record {
                    name: record.name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<T>, BatchError>>()?;

        if self.config.verbose {
            info!("  Encoded {} molecules", results.len());
        }
        Ok(results)
    }
}
