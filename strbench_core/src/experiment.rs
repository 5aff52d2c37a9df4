use rand::Rng;
use tracing::info;

use crate::benchmark::benchmark_repeated;
use crate::codec::{AlgorithmType, CompressionAlgorithm};
use crate::config::BenchmarkConfig;
use crate::error::Result;
use crate::input::ExperimentInput;
use crate::result::ExperimentResult;
use crate::source::{ColumnChunk, CsvTableSource};

/// Builds a fresh codec instance for an algorithm identity.
///
/// Implemented by the codecs crate; keeps the driver independent of any
/// concrete codec.
pub trait CodecRegistry {
    fn create<'a>(&self, kind: AlgorithmType) -> Result<Box<dyn CompressionAlgorithm<'a> + 'a>>;
}

/// Benchmark every configured algorithm on one column chunk.
///
/// The random samples are drawn once here and shared by all algorithms.
pub fn run_column<C, R>(
    chunk: &ColumnChunk,
    config: &BenchmarkConfig,
    registry: &C,
    rng: &mut R,
) -> Result<ExperimentResult>
where
    C: CodecRegistry + ?Sized,
    R: Rng + ?Sized,
{
    let arena = &chunk.arena;
    let input = ExperimentInput::sample(
        arena,
        config.random_rows,
        config.random_vectors,
        config.vector_size,
        rng,
    );

    let mut experiment = ExperimentResult::new(
        chunk.table.clone(),
        chunk.column.clone(),
        chunk.row_group,
        arena.total_bytes(),
        arena.total_size_lengths(),
        chunk.n_rows,
        chunk.n_rows_not_empty(),
    );

    for &kind in &config.algorithms {
        let result = benchmark_repeated(
            || registry.create(kind),
            &input,
            config.n_repeats,
            config.error_mode,
        )?;
        info!(
            table = %chunk.table,
            column = %chunk.column,
            row_group = chunk.row_group,
            algorithm = %kind,
            compressed_size = result.size.compressed_size,
            ratio = result.size.ratio(arena.total_bytes()),
            error = result.has_error,
            "measured"
        );
        experiment.add_result(result);
    }

    Ok(experiment)
}

/// Benchmark every table in `config.tables`, column chunk by column chunk.
pub fn run_experiment<C>(config: &BenchmarkConfig, registry: &C) -> Result<Vec<ExperimentResult>>
where
    C: CodecRegistry + ?Sized,
{
    config.validate()?;
    let mut rng = config.rng();
    let mut results = Vec::new();

    let n_tables = config.tables.len();
    for (table_idx, table) in config.tables.iter().enumerate() {
        let source = CsvTableSource::new(table.clone(), config);
        let name = table.display_name();
        info!("started table {} of {}: {}", table_idx + 1, n_tables, name);

        for chunk in source.read_chunks()? {
            results.push(run_column(&chunk, config, registry, &mut rng)?);
        }

        info!("finished table {} of {}: {}", table_idx + 1, n_tables, name);
    }
    Ok(results)
}
