//! Benchmark configuration.
//!
//! ## BenchmarkConfig
//!
//! - **n_repeats**: measured runs per codec; one extra warm-up run is
//!   executed first and discarded (default: 3)
//! - **algorithms**: codecs to run, in order (default: all bundled codecs)
//! - **error_mode**: `throw` aborts on the first verification failure, `log`
//!   records it on the result and keeps going (default: throw)
//! - **vector_size**: rows per vector for the aligned-block access pattern
//!   (default: 2048)
//! - **random_rows** / **random_vectors**: sample sizes for the two random
//!   access patterns (default: 30720 rows, 15 vectors)
//! - **rows_per_block**: rows compressed together by block codecs
//!   (default: 2048)
//! - **zstd_level**: level for the zstd block codec (default: 3)
//! - **row_group_size**, **min_rows**, **min_non_empty_rows**: how the CSV
//!   source chunks columns and which chunks are too small to measure
//! - **seed**: fixes the random samples; unseeded when absent
//! - **tables**: CSV files to benchmark; each may set `name`, `columns` and
//!   `empty_is_null` (default: true)
//!
//! ## Usage
//!
//! ```ignore
//! use strbench_core::config::{BenchmarkConfig, ErrorMode};
//!
//! let config = BenchmarkConfig {
//!     n_repeats: 5,
//!     error_mode: ErrorMode::Log,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::codec::AlgorithmType;
use crate::error::{Error, Result};

/// Rows per vector in the aligned-block access pattern.
pub const VECTOR_SIZE: usize = 2048;

/// Rows per row group when chunking a column.
pub const ROW_GROUP_SIZE: usize = 122_880;

/// Chunks with fewer rows than this are skipped.
pub const MIN_ROWS: usize = ROW_GROUP_SIZE / 2;

/// Chunks with fewer non-null rows than this are skipped.
pub const MIN_NON_EMPTY_ROWS: usize = ROW_GROUP_SIZE / 4;

pub const N_RANDOM_ROW_ACCESSES: usize = MIN_NON_EMPTY_ROWS;
pub const N_RANDOM_VECTOR_ACCESSES: usize = MIN_NON_EMPTY_ROWS / VECTOR_SIZE;

/// Rows compressed together by block codecs.
pub const DEFAULT_ROWS_PER_BLOCK: usize = VECTOR_SIZE;

pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// What a verification failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Record the failure on the result and continue.
    Log,
    /// Abort the run with [`Error::Verification`].
    #[default]
    Throw,
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::Log => f.write_str("log"),
            ErrorMode::Throw => f.write_str("throw"),
        }
    }
}

impl FromStr for ErrorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "continue" => Ok(ErrorMode::Log),
            "throw" | "abort" => Ok(ErrorMode::Throw),
            other => Err(Error::InvalidConfig(format!(
                "unknown error mode '{other}', expected 'log' or 'throw'"
            ))),
        }
    }
}

/// One CSV file to benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub path: PathBuf,

    /// Label used in results; defaults to the file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Columns to measure; all columns when empty.
    #[serde(default)]
    pub columns: Vec<String>,

    /// Read empty fields as NULL. When false they are stored as empty
    /// strings and only fields missing from a short record are NULL.
    #[serde(default = "default_empty_is_null")]
    pub empty_is_null: bool,
}

impl TableConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            columns: Vec::new(),
            empty_is_null: default_empty_is_null(),
        }
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

fn default_empty_is_null() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_n_repeats")]
    pub n_repeats: usize,

    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<AlgorithmType>,

    #[serde(default)]
    pub error_mode: ErrorMode,

    #[serde(default = "default_vector_size")]
    pub vector_size: usize,

    #[serde(default = "default_random_rows")]
    pub random_rows: usize,

    #[serde(default = "default_random_vectors")]
    pub random_vectors: usize,

    #[serde(default = "default_rows_per_block")]
    pub rows_per_block: usize,

    #[serde(default = "default_zstd_level")]
    pub zstd_level: i32,

    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    #[serde(default = "default_min_rows")]
    pub min_rows: usize,

    #[serde(default = "default_min_non_empty_rows")]
    pub min_non_empty_rows: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

fn default_n_repeats() -> usize {
    3
}

fn default_algorithms() -> Vec<AlgorithmType> {
    AlgorithmType::ALL.to_vec()
}

fn default_vector_size() -> usize {
    VECTOR_SIZE
}

fn default_random_rows() -> usize {
    N_RANDOM_ROW_ACCESSES
}

fn default_random_vectors() -> usize {
    N_RANDOM_VECTOR_ACCESSES
}

fn default_rows_per_block() -> usize {
    DEFAULT_ROWS_PER_BLOCK
}

fn default_zstd_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

fn default_row_group_size() -> usize {
    ROW_GROUP_SIZE
}

fn default_min_rows() -> usize {
    MIN_ROWS
}

fn default_min_non_empty_rows() -> usize {
    MIN_NON_EMPTY_ROWS
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            n_repeats: default_n_repeats(),
            algorithms: default_algorithms(),
            error_mode: ErrorMode::default(),
            vector_size: default_vector_size(),
            random_rows: default_random_rows(),
            random_vectors: default_random_vectors(),
            rows_per_block: default_rows_per_block(),
            zstd_level: default_zstd_level(),
            row_group_size: default_row_group_size(),
            min_rows: default_min_rows(),
            min_non_empty_rows: default_min_non_empty_rows(),
            seed: None,
            tables: Vec::new(),
        }
    }
}

impl BenchmarkConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_repeats == 0 {
            return Err(Error::InvalidConfig("n_repeats must be at least 1".into()));
        }
        if self.algorithms.is_empty() {
            return Err(Error::InvalidConfig("no algorithms selected".into()));
        }
        if self.vector_size == 0 {
            return Err(Error::InvalidConfig("vector_size must be positive".into()));
        }
        if self.rows_per_block == 0 {
            return Err(Error::InvalidConfig("rows_per_block must be positive".into()));
        }
        if self.row_group_size == 0 {
            return Err(Error::InvalidConfig("row_group_size must be positive".into()));
        }
        Ok(())
    }

    /// Source of the random access samples: seeded when `seed` is set,
    /// otherwise seeded from the OS.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
