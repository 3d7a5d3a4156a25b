use clap::{Parser, Subcommand, ValueEnum};
use fragprint_lib::parse::{read_molecules, read_vocabulary, write_dense_rows, MoleculeRecord};
use fragprint_lib::{
    derive_vocabulary_from_frequencies, BatchEncoder, DuplicateKeyPolicy, EncodingConfiguration,
    VocabularyIndex,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "fragprint")]
#[command(version = "0.1.0")]
#[command(about = "Fragment-key bit and count fingerprints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Presence/absence fingerprints
    Bits,
    /// Occurrence-count fingerprints
    Counts,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a sorted vocabulary of frequent fragments from a molecule file
    DeriveVocab {
        /// Molecule file (name, then fragment entries)
        #[arg(short, long)]
        input: String,

        /// Output vocabulary file (default: <input stem>.vocab)
        #[arg(short, long)]
        output: Option<String>,

        /// Keep fragments occurring more than this many times
        #[arg(long, default_value = "2")]
        min_occurrences: usize,

        /// Field delimiter of the molecule file
        #[arg(short, long, default_value = "\t")]
        delimiter: char,
    },

    /// Encode every molecule of a file into dense fingerprints
    Encode {
        /// Vocabulary file, one key per line
        #[arg(short, long)]
        vocabulary: String,

        /// Molecule file (name, then fragment entries)
        #[arg(short, long)]
        input: String,

        /// Output file (default: <input stem>.<mode>.tsv)
        #[arg(short, long)]
        output: Option<String>,

        /// Fingerprint kind
        #[arg(long, value_enum, default_value = "bits")]
        mode: Mode,

        /// Fail on duplicated vocabulary keys instead of letting the last one win
        #[arg(long, default_value = "false")]
        reject_duplicates: bool,

        /// Field delimiter for input and output
        #[arg(short, long, default_value = "\t")]
        delimiter: char,

        /// Number of threads (0 = all available cores)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Verbose output
        #[arg(long)]
        verbose: bool,
    },

    /// Time bit and count encoding over a molecule file
    Bench {
        /// Vocabulary file, one key per line
        #[arg(short, long)]
        vocabulary: String,

        /// Molecule file (name, then fragment entries)
        #[arg(short, long)]
        input: String,

        /// Number of timed passes
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Field delimiter of the molecule file
        #[arg(short, long, default_value = "\t")]
        delimiter: char,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DeriveVocab { input, output, min_occurrences, delimiter } => {
            derive_vocab_command(input, output, min_occurrences, delimiter)?;
        }
        Commands::Encode {
            vocabulary,
            input,
            output,
            mode,
            reject_duplicates,
            delimiter,
            threads,
            verbose,
        } => {
            let config = EncodingConfiguration {
                duplicate_keys: if reject_duplicates {
                    DuplicateKeyPolicy::Reject
                } else {
                    DuplicateKeyPolicy::LastWriteWins
                },
                num_threads: threads,
                delimiter,
                verbose,
                ..EncodingConfiguration::default()
            };
            encode_command(vocabulary, input, output, mode, config)?;
        }
        Commands::Bench { vocabulary, input, runs, delimiter } => {
            bench_command(vocabulary, input, runs, delimiter)?;
        }
    }

    Ok(())
}

/// Replace the extension of `input` to name an output file
fn default_output(input: &str, suffix: &str) -> String {
    let stem = Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fragprint".to_string());
    format!("{}.{}", stem, suffix)
}

/// Derive a vocabulary from a molecule file
fn derive_vocab_command(
    input: String,
    output: Option<String>,
    min_occurrences: usize,
    delimiter: char,
) -> anyhow::Result<()> {
    info!("Deriving vocabulary...");
    info!("  Input: {}", input);
    info!("  Min occurrences: > {}", min_occurrences);

    let records = read_molecules(&input, delimiter)?;
    info!("  Loaded {} molecules", records.len());

    let keys = derive_vocabulary_from_frequencies(
        records.iter().map(|r| r.fragments.occurrences()),
        min_occurrences,
    )?;
    info!("  Kept {} keys", keys.len());

    let output_path = output.unwrap_or_else(|| default_output(&input, "vocab"));
    let file = File::create(&output_path)?;
    let mut writer = BufWriter::new(file);
    for key in &keys {
        writeln!(writer, "{}", key)?;
    }
    writer.flush()?;

    info!("Vocabulary written to {}", output_path);
    Ok(())
}

fn load_index(vocabulary: &str, config: &EncodingConfiguration) -> anyhow::Result<VocabularyIndex> {
    info!("Loading vocabulary from {}...", vocabulary);
    let keys = read_vocabulary(vocabulary)?;
    let index = VocabularyIndex::with_config(keys, config)?;
    info!("  Vocabulary size: {}", index.size());
    if index.num_distinct_keys() != index.size() {
        info!(
            "  {} positions unreachable because of duplicated keys",
            index.size() - index.num_distinct_keys()
        );
    }
    Ok(index)
}

/// Encode a molecule file and write dense fingerprints
fn encode_command(
    vocabulary: String,
    input: String,
    output: Option<String>,
    mode: Mode,
    config: EncodingConfiguration,
) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
    config.print();

    let index = load_index(&vocabulary, &config)?;
    let records = read_molecules(&input, config.delimiter)?;
    info!("  Loaded {} molecules", records.len());

    let delimiter = config.delimiter;
    let encoder = BatchEncoder::new(&index, config).map_err(|e| anyhow::anyhow!("{}", e))?;

    let output_path = output.unwrap_or_else(|| {
        let suffix = match mode {
            Mode::Bits => "bits.tsv",
            Mode::Counts => "counts.tsv",
        };
        default_output(&input, suffix)
    });

    match mode {
        Mode::Bits => {
            let fingerprints = encoder.encode_bits(&records)?;
            let rows = named_rows(&records, fingerprints.iter().map(|fp| fp.to_dense_bit_array()));
            for (record, fp) in records.iter().zip(&fingerprints).take(10) {
                debug!("  {} -> {} bits set", record.name, fp.cardinality());
            }
            write_dense_rows(&output_path, index.keys(), &rows, delimiter)?;
        }
        Mode::Counts => {
            let fingerprints = encoder.encode_counts(&records)?;
            let rows = named_rows(&records, fingerprints.iter().map(|fp| fp.to_dense_count_array()));
            for (record, fp) in records.iter().zip(&fingerprints).take(10) {
                debug!("  {} -> {} populated bins", record.name, fp.num_populated_bins());
            }
            write_dense_rows(&output_path, index.keys(), &rows, delimiter)?;
        }
    }

    info!("Fingerprints written to {}", output_path);
    Ok(())
}

fn named_rows<T>(
    records: &[MoleculeRecord],
    dense: impl Iterator<Item = Vec<T>>,
) -> Vec<(String, Vec<T>)> {
    records.iter().map(|r| r.name.clone()).zip(dense).collect()
}

/// Run encoding benchmarks
fn bench_command(vocabulary: String, input: String, runs: usize, delimiter: char) -> anyhow::Result<()> {
    use fragprint_lib::Fingerprinter;
    use fragprint_lib::MoleculeFragments;
    use std::hint::black_box;
    use std::time::Instant;

    let config = EncodingConfiguration { delimiter, ..EncodingConfiguration::default() };
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
    let index = load_index(&vocabulary, &config)?;
    let records = read_molecules(&input, delimiter)?;
    if records.is_empty() || runs == 0 {
        println!("nothing to benchmark");
        return Ok(());
    }
    info!("Benchmarking {} molecules x {} runs...", records.len(), runs);

    let fingerprinter = Fingerprinter::new(&index);
    let total = (runs * records.len()) as f64;

    // Bit fingerprints
    {
        let start = Instant::now();
        for _ in 0..runs {
            for record in &records {
                match &record.fragments {
                    MoleculeFragments::List(keys) => {
                        black_box(fingerprinter.bit_fingerprint(keys)?);
                    }
                    MoleculeFragments::Frequencies(pairs) => {
                        black_box(
                            fingerprinter
                                .bit_fingerprint_from_frequencies(pairs.iter().map(|(k, c)| (k, c)))?,
                        );
                    }
                }
            }
        }
        let ns = start.elapsed().as_nanos() as f64 / total;
        println!("bit fingerprint (avg_nanosec_per_molecule) = {:.3}", ns);
    }

    let (lists, frequency_records): (Vec<_>, Vec<_>) =
        records.iter().map(|r| &r.fragments).partition(|f| matches!(f, MoleculeFragments::List(_)));

    // Count fingerprints from repeated lists where present
    if !lists.is_empty() {
        let start = Instant::now();
        for _ in 0..runs {
            for fragments in &lists {
                if let MoleculeFragments::List(keys) = fragments {
                    black_box(fingerprinter.count_fingerprint(keys)?);
                }
            }
        }
        let ns = start.elapsed().as_nanos() as f64 / (runs * lists.len()) as f64;
        println!("count fingerprint, list (avg_nanosec_per_molecule) = {:.3}", ns);
    }

    // Count fingerprints from frequency records where present
    if !frequency_records.is_empty() {
        let start = Instant::now();
        for _ in 0..runs {
            for fragments in &frequency_records {
                if let MoleculeFragments::Frequencies(pairs) = fragments {
                    black_box(
                        fingerprinter
                            .count_fingerprint_from_frequencies(pairs.iter().map(|(k, c)| (k, c)))?,
                    );
                }
            }
        }
        let ns = start.elapsed().as_nanos() as f64 / (runs * frequency_records.len()) as f64;
        println!("count fingerprint, frequencies (avg_nanosec_per_molecule) = {:.3}", ns);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{NamedTempFile, TempDir};

    fn molecule_file(lines: &[&str]) -> anyhow::Result<NamedTempFile> {
        let mut temp_file = NamedTempFile::new()?;
        for line in lines {
            writeln!(temp_file, "{}", line)?;
        }
        temp_file.flush()?;
        Ok(temp_file)
    }

    fn path_string(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_default_output() {
        assert_eq!(default_output("data/mols.tsv", "vocab"), "mols.vocab");
        assert_eq!(default_output("mols", "bits.tsv"), "mols.bits.tsv");
    }

    #[test]
    fn test_cli_parses_encode() {
        let cli = Cli::try_parse_from([
            "fragprint", "encode", "-v", "v.txt", "-i", "m.tsv", "--mode", "counts",
            "--reject-duplicates", "-t", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Encode { mode, reject_duplicates, threads, delimiter, .. } => {
                assert_eq!(mode, Mode::Counts);
                assert!(reject_duplicates);
                assert_eq!(threads, 4);
                assert_eq!(delimiter, '\t');
            }
            _ => panic!("expected encode"),
        }
    }

    #[test]
    fn test_derive_vocab_command_with_huge_frequency() -> anyhow::Result<()> {
        let molecules = molecule_file(&[
            "m1\tC\tC\tO",
            "m2\tC:9223372036854775807\tN:0",
            "m3\tO\tS",
        ])?;
        let dir = TempDir::new()?;
        let output = dir.path().join("derived.vocab");

        derive_vocab_command(
            path_string(molecules.path()),
            Some(path_string(&output)),
            1,
            '\t',
        )?;

        assert_eq!(fs::read_to_string(&output)?, "C\nO\n");
        Ok(())
    }

    #[test]
    fn test_encode_command_writes_dense_rows() -> anyhow::Result<()> {
        let vocabulary = molecule_file(&["C", "N", "O"])?;
        let molecules = molecule_file(&["a\tC\tC\tO", "b\tS", "c\tO:3\tN:0\tS:2"])?;
        let dir = TempDir::new()?;

        let bits_path = dir.path().join("out.bits.tsv");
        encode_command(
            path_string(vocabulary.path()),
            path_string(molecules.path()),
            Some(path_string(&bits_path)),
            Mode::Bits,
            EncodingConfiguration { num_threads: 2, ..EncodingConfiguration::default() },
        )?;
        assert_eq!(
            fs::read_to_string(&bits_path)?,
            "name\tC\tN\tO\na\t1\t0\t1\nb\t0\t0\t0\nc\t0\t0\t1\n"
        );

        let counts_path = dir.path().join("out.counts.tsv");
        encode_command(
            path_string(vocabulary.path()),
            path_string(molecules.path()),
            Some(path_string(&counts_path)),
            Mode::Counts,
            EncodingConfiguration::default(),
        )?;
        assert_eq!(
            fs::read_to_string(&counts_path)?,
            "name\tC\tN\tO\na\t2\t0\t1\nb\t0\t0\t0\nc\t0\t0\t3\n"
        );
        Ok(())
    }

    #[test]
    fn test_encode_command_rejects_blank_frequency_key() -> anyhow::Result<()> {
        let vocabulary = molecule_file(&["C", "O"])?;
        let molecules = molecule_file(&["a\tC:1\t :0"])?;
        let dir = TempDir::new()?;

        for mode in [Mode::Bits, Mode::Counts] {
            let err = encode_command(
                path_string(vocabulary.path()),
                path_string(molecules.path()),
                Some(path_string(&dir.path().join("out.tsv"))),
                mode,
                EncodingConfiguration::default(),
            )
            .unwrap_err();
            assert!(format!("{:#}", err).contains("molecule a"), "{:#}", err);
        }
        Ok(())
    }

    #[test]
    fn test_bench_command_frequency_records() -> anyhow::Result<()> {
        let vocabulary = molecule_file(&["C", "N", "O"])?;
        let molecules = molecule_file(&[
            "a\tC\tO",
            "b\tC:9223372036854775807\tO:2",
            "c\tN:-1",
        ])?;

        bench_command(path_string(vocabulary.path()), path_string(molecules.path()), 2, '\t')?;
        Ok(())
    }
}
