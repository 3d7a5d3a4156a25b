//! Vocabulary and molecule file parsing
//!
//! Vocabulary files hold one key per line. Empty lines and lines starting
//! with `#` are skipped; every other line is taken verbatim as a key.
//!
//! Molecule files hold one molecule per line:
//!
//! ```text
//! name<delim>entry<delim>entry...
//! ```
//!
//! An entry is either a bare key (list form, repeats allowed) or
//! `key:count` (frequency form). The count is split off at the last `:`,
//! so keys that contain `:` themselves still parse. A line uses one form.

use crate::constants::{COMMENT_PREFIX, FREQUENCY_SEPARATOR};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Fragment data of one molecule as supplied by a file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoleculeFragments {
    /// Keys with repeats
    List(Vec<String>),
    /// Key -> frequency pairs
    Frequencies(Vec<(String, i64)>),
}

impl MoleculeFragments {
    /// Number of entries on the line
    pub fn len(&self) -> usize {
        match self {
            MoleculeFragments::List(keys) => keys.len(),
            MoleculeFragments::Frequencies(pairs) => pairs.len(),
        }
    }

    /// Whether the molecule has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries as `(key, frequency)` pairs, one per entry on the line
    ///
    /// A list entry has frequency 1, so a repeated key yields repeated
    /// pairs. Frequency entries are passed through unchanged and never
    /// expanded.
    pub fn occurrences(&self) -> Vec<(&str, i64)> {
        match self {
            MoleculeFragments::List(keys) => keys.iter().map(|key| (key.as_str(), 1)).collect(),
            MoleculeFragments::Frequencies(pairs) => {
                pairs.iter().map(|(key, count)| (key.as_str(), *count)).collect()
            }
        }
    }
}

/// One molecule line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoleculeRecord {
    /// Molecule name (first field)
    pub name: String,
    /// Fragment entries
    pub fragments: MoleculeFragments,
}

/// Read a vocabulary file, one key per line
///
/// # Errors
/// Returns error if the file cannot be opened or read.
pub fn read_vocabulary<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open vocabulary file: {}", path.display()))?;

    let mut keys = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line
            .with_context(|| format!("Failed to read vocabulary file: {}", path.display()))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        keys.push(line.to_string());
    }
    Ok(keys)
}

/// Read a molecule file
///
/// # Errors
/// Returns error if the file cannot be read or a line is malformed.
pub fn read_molecules<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Vec<MoleculeRecord>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open molecule file: {}", path.display()))?;

    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line
            .with_context(|| format!("Failed to read molecule file: {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_molecule_line(&line, delimiter)
            .with_context(|| format!("{}:{}: malformed molecule line", path.display(), line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Parse a single molecule line
///
/// # Errors
/// Returns error if the name is missing or the line mixes list and
/// frequency entries.
pub fn parse_molecule_line(line: &str, delimiter: char) -> Result<MoleculeRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.split(delimiter);
    let name = match fields.next() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => bail!("missing molecule name"),
    };

    let mut keys = Vec::new();
    let mut pairs = Vec::new();
    for field in fields {
        if field.is_empty() {
            continue;
        }
        match split_frequency(field) {
            Some((key, count)) => pairs.push((key.to_string(), count)),
            None => keys.push(field.to_string()),
        }
    }

    let fragments = match (keys.is_empty(), pairs.is_empty()) {
        (_, true) => MoleculeFragments::List(keys),
        (true, false) => MoleculeFragments::Frequencies(pairs),
        (false, false) => bail!("molecule {} mixes list and frequency entries", name),
    };
    Ok(MoleculeRecord { name, fragments })
}

/// Split `key:count` at the last separator whose suffix is an integer
fn split_frequency(field: &str) -> Option<(&str, i64)> {
    let (key, count) = field.rsplit_once(FREQUENCY_SEPARATOR)?;
    if key.is_empty() {
        return None;
    }
    count.parse().ok().map(|count| (key, count))
}

/// Write dense fingerprint rows with a header of vocabulary keys
///
/// # Errors
/// Returns error if the file cannot be created or written.
pub fn write_dense_rows<P, T>(
    path: P,
    keys: &[String],
    rows: &[(String, Vec<T>)],
    delimiter: char,
) -> Result<()>
where
    P: AsRef<Path>,
    T: std::fmt::Display,
{
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_dense_to(&mut writer, keys, rows, delimiter)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Write dense fingerprint rows to any writer
pub fn write_dense_to<W, T>(
    writer: &mut W,
    keys: &[String],
    rows: &[(String, Vec<T>)],
    delimiter: char,
) -> std::io::Result<()>
where
    W: Write,
    T: std::fmt::Display,
{
    write!(writer, "name")?;
    for key in keys {
        write!(writer, "{}{}", delimiter, key)?;
    }
    writeln!(writer)?;

    for (name, values) in rows {
        write!(writer, "{}", name)?;
        for value in values {
            write!(writer, "{}{}", delimiter, value)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
