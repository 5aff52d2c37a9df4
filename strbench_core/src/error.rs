//! Error types for the benchmark harness.
//!
//! Errors fall into two groups:
//!
//! - **Fatal**: contract violations and corruption risks. A codec called out
//!   of sequence (`Usage`), a decompress call that writes more or fewer bytes
//!   than the row or block it was asked for (`Overrun`), a failing codec
//!   backend (`Backend`), or averaging an empty set of runs
//!   (`EmptyAggregate`). These always propagate, whatever the error mode.
//! - **Verification**: decompressed bytes that disagree with the original.
//!   Only these go through [`ErrorMode`](crate::config::ErrorMode): recorded
//!   on the result under `log`, returned as `Err` under `throw`.

use thiserror::Error;

use crate::codec::{AlgorithmType, CodecState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{operation} called in state {state:?}")]
    Usage {
        operation: &'static str,
        state: CodecState,
    },

    #[error("{algorithm} verification failed: {message}")]
    Verification {
        algorithm: AlgorithmType,
        message: String,
    },

    #[error("decompression overrun: {0}")]
    Overrun(String),

    #[error("row index {index} out of range (total {len})")]
    RowOutOfRange { index: usize, len: usize },

    #[error("codec backend failure: {0:#}")]
    Backend(#[from] anyhow::Error),

    #[error("cannot average an empty set of results")]
    EmptyAggregate,

    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Everything except a verification failure aborts the run in every mode.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Verification { .. })
    }
}
