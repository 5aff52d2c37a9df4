use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::result::{AlgorithmResult, ExperimentResult};

/// One line of the results CSV: an (experiment, algorithm) pair.
#[derive(Debug, Serialize)]
struct ResultRow<'r> {
    table: &'r str,
    column: &'r str,
    row_group: u64,
    uncompressed_size: usize,
    uncompressed_lengths_size: usize,
    n_rows: usize,
    n_rows_not_empty: usize,
    algorithm: &'static str,
    compressed_size: usize,
    size_dictionary_strings: usize,
    size_dictionary_lengths: usize,
    size_dictionary: usize,
    size_data_codes: usize,
    size_data_lengths: usize,
    size_data: usize,
    compression_time_ms: f64,
    decompression_time_ms_full: f64,
    decompression_time_ms_random: f64,
    decompression_time_ms_vector: f64,
    decompression_hash_full: u64,
    decompression_hash_random: u64,
    decompression_hash_vector: u64,
    has_error: bool,
    error_message: &'r str,
}

impl<'r> ResultRow<'r> {
    fn new(exp: &'r ExperimentResult, r: &'r AlgorithmResult) -> Self {
        let parts = &r.size.parts;
        Self {
            table: &exp.table,
            column: &exp.column,
            row_group: exp.row_group,
            uncompressed_size: exp.uncompressed_size,
            uncompressed_lengths_size: exp.uncompressed_lengths_size,
            n_rows: exp.n_rows,
            n_rows_not_empty: exp.n_rows_not_empty,
            algorithm: r.algorithm.name(),
            compressed_size: r.size.compressed_size,
            size_dictionary_strings: parts.size_dictionary_strings,
            size_dictionary_lengths: parts.size_dictionary_lengths,
            size_dictionary: parts.size_dictionary,
            size_data_codes: parts.size_data_codes,
            size_data_lengths: parts.size_data_lengths,
            size_data: parts.size_data,
            compression_time_ms: r.compression_time_ms,
            decompression_time_ms_full: r.decompression_time_ms_full,
            decompression_time_ms_random: r.decompression_time_ms_random,
            decompression_time_ms_vector: r.decompression_time_ms_vector,
            decompression_hash_full: r.decompression_hash_full,
            decompression_hash_random: r.decompression_hash_random,
            decompression_hash_vector: r.decompression_hash_vector,
            has_error: r.has_error,
            error_message: &r.error_message,
        }
    }
}

/// Write one CSV row per (experiment, algorithm), header first.
///
/// Experiments without any algorithm result are skipped. Returns the number
/// of data rows written.
pub fn write_results_csv<W: Write>(experiments: &[ExperimentResult], out: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut rows = 0;
    for exp in experiments {
        if exp.results.is_empty() {
            warn!(
                table = %exp.table,
                column = %exp.column,
                row_group = exp.row_group,
                "skipping experiment without results"
            );
            continue;
        }
        for r in &exp.results {
            writer.serialize(ResultRow::new(exp, r))?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

/// [`write_results_csv`] into a new file at `path`.
pub fn save_results_csv(experiments: &[ExperimentResult], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    info!(path = %path.display(), "saving results");
    write_results_csv(experiments, File::create(path)?)
}
