pub mod arena;
pub mod benchmark;
pub mod bitpacking;
pub mod codec;
pub mod config;
pub mod error;
pub mod experiment;
pub mod input;
pub mod report;
pub mod result;
pub mod source;

pub use arena::ByteArena;
pub use benchmark::{benchmark, benchmark_repeated};
pub use codec::{AlgorithmType, BlockCodec, CodecState, CompressionAlgorithm};
pub use config::{BenchmarkConfig, ErrorMode, TableConfig};
pub use error::{Error, Result};
pub use experiment::{run_column, run_experiment, CodecRegistry};
pub use input::ExperimentInput;
pub use report::{save_results_csv, write_results_csv};
pub use result::{AlgorithmResult, CompressedSizeInfo, ExperimentResult, SizeParts};
pub use source::{ColumnChunk, CsvTableSource};
