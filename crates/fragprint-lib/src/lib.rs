// fragprint: vocabulary-keyed molecular fragment fingerprints
//
// Encodes per-molecule sets of canonical fragment keys into fixed-size bit
// and count fingerprints against a pre-declared vocabulary.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod config;
pub mod vocabulary;
pub mod fingerprint;
pub mod encoder;
pub mod view;
pub mod parse;
pub mod batch;

// Re-export common types at crate root
pub use batch::{BatchEncoder, BatchError};
pub use config::{DuplicateKeyPolicy, EncodingConfiguration};
pub use encoder::Fingerprinter;
pub use error::{FingerprintError, KeyFault};
pub use fingerprint::{BitFingerprint, CountFingerprint, Fingerprint};
pub use parse::{MoleculeFragments, MoleculeRecord};
pub use view::FingerprintView;
pub use vocabulary::{derive_vocabulary, derive_vocabulary_from_frequencies, VocabularyIndex};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}
