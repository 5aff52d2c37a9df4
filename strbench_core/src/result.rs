use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::codec::AlgorithmType;
use crate::error::{Error, Result};

// ── Size accounting ──────────────────────────────────────────────────────────

/// Compressed size split into dictionary and data components.
///
/// `size_dictionary = size_dictionary_strings + size_dictionary_lengths`
/// and `size_data = size_data_codes + size_data_lengths` always hold; build
/// values through the constructors to keep it that way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeParts {
    pub size_dictionary_strings: usize,
    pub size_dictionary_lengths: usize,
    pub size_dictionary: usize,
    pub size_data_codes: usize,
    pub size_data_lengths: usize,
    pub size_data: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedSizeInfo {
    pub compressed_size: usize,
    pub parts: SizeParts,
}

impl CompressedSizeInfo {
    pub fn new(
        size_dictionary_strings: usize,
        size_dictionary_lengths: usize,
        size_data_codes: usize,
        size_data_lengths: usize,
    ) -> Self {
        let size_dictionary = size_dictionary_strings + size_dictionary_lengths;
        let size_data = size_data_codes + size_data_lengths;
        Self {
            compressed_size: size_dictionary + size_data,
            parts: SizeParts {
                size_dictionary_strings,
                size_dictionary_lengths,
                size_dictionary,
                size_data_codes,
                size_data_lengths,
                size_data,
            },
        }
    }

    /// Dictionary codecs: one fixed-width code per row, no per-row lengths.
    pub fn dictionary(strings: usize, lengths: usize, codes: usize) -> Self {
        Self::new(strings, lengths, codes, 0)
    }

    /// Codecs without a dictionary, e.g. block codecs.
    pub fn data_only(codes: usize, lengths: usize) -> Self {
        Self::new(0, 0, codes, lengths)
    }

    /// `uncompressed / compressed`, or 0 when nothing was stored.
    pub fn ratio(&self, uncompressed: usize) -> f64 {
        if self.compressed_size == 0 {
            return 0.0;
        }
        uncompressed as f64 / self.compressed_size as f64
    }
}

// ── One measurement ──────────────────────────────────────────────────────────

/// Outcome of one benchmark run (or the mean of several).
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmResult {
    pub algorithm: AlgorithmType,
    pub size: CompressedSizeInfo,
    pub has_error: bool,
    pub error_message: String,

    pub compression_time_ms: f64,
    pub decompression_time_ms_full: f64,
    pub decompression_time_ms_random: f64,
    pub decompression_time_ms_vector: f64,

    pub decompression_hash_full: u64,
    pub decompression_hash_random: u64,
    pub decompression_hash_vector: u64,
}

impl AlgorithmResult {
    /// Empty result for `algorithm`: zero sizes, zero latencies, no error.
    pub fn new(algorithm: AlgorithmType) -> Self {
        Self {
            algorithm,
            size: CompressedSizeInfo::default(),
            has_error: false,
            error_message: String::new(),
            compression_time_ms: 0.0,
            decompression_time_ms_full: 0.0,
            decompression_time_ms_random: 0.0,
            decompression_time_ms_vector: 0.0,
            decompression_hash_full: 0,
            decompression_hash_random: 0,
            decompression_hash_vector: 0,
        }
    }

    /// Flag the result and append `message` as one line of the error column.
    pub fn record_error(&mut self, message: impl AsRef<str>) {
        self.has_error = true;
        if !self.error_message.is_empty() {
            self.error_message.push('\n');
        }
        self.error_message.push_str(message.as_ref());
    }

    /// Size info and all three hashes agree with `other`.
    pub fn same_output(&self, other: &AlgorithmResult) -> bool {
        self.size == other.size
            && self.decompression_hash_full == other.decompression_hash_full
            && self.decompression_hash_random == other.decompression_hash_random
            && self.decompression_hash_vector == other.decompression_hash_vector
    }
}

/// Arithmetic mean of the four latencies.
///
/// Size info and hashes come from the first result verbatim; they are
/// deterministic for identical input. Errors from any result are carried
/// over.
pub fn mean_times(results: &[AlgorithmResult]) -> Result<AlgorithmResult> {
    let (first, rest) = results.split_first().ok_or(Error::EmptyAggregate)?;
    let n = results.len() as f64;

    let mut mean = first.clone();
    for r in rest {
        mean.compression_time_ms += r.compression_time_ms;
        mean.decompression_time_ms_full += r.decompression_time_ms_full;
        mean.decompression_time_ms_random += r.decompression_time_ms_random;
        mean.decompression_time_ms_vector += r.decompression_time_ms_vector;
        if r.has_error && !mean.error_message.contains(&r.error_message) {
            mean.record_error(&r.error_message);
        }
    }
    mean.compression_time_ms /= n;
    mean.decompression_time_ms_full /= n;
    mean.decompression_time_ms_random /= n;
    mean.decompression_time_ms_vector /= n;
    Ok(mean)
}

/// Mean of `runs` after discarding the first (warm-up) run.
pub fn mean_of_repeats(runs: &[AlgorithmResult]) -> Result<AlgorithmResult> {
    let measured = runs.get(1..).ok_or(Error::EmptyAggregate)?;
    mean_times(measured)
}

// ── Per column chunk ─────────────────────────────────────────────────────────

/// All algorithm results for one (table, column, row group).
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub table: String,
    pub column: String,
    pub row_group: u64,
    /// Payload bytes of the non-null rows.
    pub uncompressed_size: usize,
    /// Bytes of a plain `u32` length array for the non-null rows.
    pub uncompressed_lengths_size: usize,
    /// Rows in the chunk, nulls included.
    pub n_rows: usize,
    pub n_rows_not_empty: usize,
    pub results: Vec<AlgorithmResult>,
}

impl ExperimentResult {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        row_group: u64,
        uncompressed_size: usize,
        uncompressed_lengths_size: usize,
        n_rows: usize,
        n_rows_not_empty: usize,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            row_group,
            uncompressed_size,
            uncompressed_lengths_size,
            n_rows,
            n_rows_not_empty,
            results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: AlgorithmResult) {
        self.results.push(result);
    }

    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| r.has_error)
    }

    /// Human-readable summary, one line per algorithm.
    pub fn pretty_print<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(
            out,
            "{}.{} (row group {}): {} rows, {} non-empty, {} bytes",
            self.table,
            self.column,
            self.row_group,
            self.n_rows,
            self.n_rows_not_empty,
            self.uncompressed_size
        )?;
        for r in &self.results {
            writeln!(
                out,
                "  - {:>10}: {:>10} bytes ({:>6.2}x), compress {:>9.3} ms, full {:>9.3} ms, \
                 random {:>9.3} ms, vector {:>9.3} ms{}",
                r.algorithm.name(),
                r.size.compressed_size,
                r.size.ratio(self.uncompressed_size),
                r.compression_time_ms,
                r.decompression_time_ms_full,
                r.decompression_time_ms_random,
                r.decompression_time_ms_vector,
                if r.has_error { "  [ERROR]" } else { "" }
            )?;
        }
        Ok(())
    }
}
