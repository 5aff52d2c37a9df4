//! Benchmark driver.
//!
//! [`benchmark`] drives one fresh codec instance through its whole lifecycle
//! and measures each phase:
//!
//! ```text
//! initialize ─▶ compress_all ─▶ decompress_all ─▶ random rows ─▶ random vectors ─▶ free
//!                  (timed)         (timed,           (timed,         (timed,
//!                                   verified)         verified)       verified)
//! ```
//!
//! [`benchmark_repeated`] runs it `n_repeats + 1` times, drops the warm-up
//! run and averages the latencies.
//!
//! Fatal errors (usage, overrun, backend) always propagate. Verification
//! failures go through [`ErrorMode`]. `free` runs on every path out of a run.

use std::ops::Range;
use std::time::Instant;

use tracing::{debug, error};
use xxhash_rust::xxh3::xxh3_64;

use crate::arena::ByteArena;
use crate::codec::{AlgorithmType, CompressionAlgorithm};
use crate::config::ErrorMode;
use crate::error::{Error, Result};
use crate::input::ExperimentInput;
use crate::result::{mean_of_repeats, AlgorithmResult};

/// Run one full measurement of `algo` on `input`.
///
/// `algo` must be freshly constructed; it is freed before returning.
pub fn benchmark<'a, A>(
    algo: &mut A,
    input: &ExperimentInput<'a>,
    mode: ErrorMode,
) -> Result<AlgorithmResult>
where
    A: CompressionAlgorithm<'a> + ?Sized,
{
    let mut result = AlgorithmResult::new(algo.algorithm_type());
    let outcome = run_phases(algo, input, mode, &mut result);
    algo.free();
    outcome.map(|()| result)
}

/// Run [`benchmark`] `n_repeats + 1` times on instances from `make`, discard
/// the warm-up run and average the latencies.
///
/// Every run must report the same sizes and hashes; a run that does not is
/// a verification failure.
pub fn benchmark_repeated<'a, F>(
    mut make: F,
    input: &ExperimentInput<'a>,
    n_repeats: usize,
    mode: ErrorMode,
) -> Result<AlgorithmResult>
where
    F: FnMut() -> Result<Box<dyn CompressionAlgorithm<'a> + 'a>>,
{
    if n_repeats == 0 {
        return Err(Error::EmptyAggregate);
    }

    let mut runs = Vec::with_capacity(n_repeats + 1);
    for run_idx in 0..=n_repeats {
        let mut algo = make()?;
        let run = benchmark(algo.as_mut(), input, mode)?;
        debug!(
            algorithm = %run.algorithm,
            run = run_idx,
            warmup = run_idx == 0,
            compression_ms = run.compression_time_ms,
            full_ms = run.decompression_time_ms_full,
            random_ms = run.decompression_time_ms_random,
            vector_ms = run.decompression_time_ms_vector,
            "benchmark run finished"
        );
        runs.push(run);
    }

    let mut mean = mean_of_repeats(&runs)?;

    let reference = &runs[1];
    let diverging = runs
        .iter()
        .enumerate()
        .find(|(idx, run)| *idx != 1 && !run.same_output(reference))
        .map(|(idx, _)| idx);
    if let Some(idx) = diverging {
        let algorithm = mean.algorithm;
        verification_failure(
            algorithm,
            mode,
            &mut mean,
            format!("run {idx} produced different sizes or hashes than run 1"),
        )?;
    }

    Ok(mean)
}

fn run_phases<'a, A>(
    algo: &mut A,
    input: &ExperimentInput<'a>,
    mode: ErrorMode,
    result: &mut AlgorithmResult,
) -> Result<()>
where
    A: CompressionAlgorithm<'a> + ?Sized,
{
    let arena = input.arena;
    let algorithm = algo.algorithm_type();

    // ── Compression ─────────────────────────────────────────────────────────
    algo.initialize(input)?;

    let t0 = Instant::now();
    algo.compress_all(arena)?;
    result.compression_time_ms = elapsed_ms(t0);
    result.size = algo.compressed_size()?;
    debug!(
        %algorithm,
        compressed_size = result.size.compressed_size,
        "compressed {} rows",
        arena.len()
    );

    // ── Full decompression ──────────────────────────────────────────────────
    let total = arena.total_bytes();
    let mut buffer = allocate(&*algo, total)?;

    let t0 = Instant::now();
    algo.decompress_all(&mut buffer)?;
    result.decompression_time_ms_full = elapsed_ms(t0);

    let decompressed = &buffer[..total];
    result.decompression_hash_full = xxh3_64(decompressed);
    if let Some(pos) = first_difference(decompressed, arena.data()) {
        let message = format!(
            "full decompression does not match original data: first difference at byte {} \
             (original: {}, decompressed: {})",
            pos,
            arena.data()[pos],
            decompressed[pos]
        );
        verification_failure(algorithm, mode, result, message)?;
    }
    drop(buffer);

    // ── Random rows ─────────────────────────────────────────────────────────
    let rows = &input.random_row_indices;
    let expected: usize = rows.iter().map(|&row| arena.length(row)).sum();
    let mut buffer = allocate(&*algo, expected)?;

    let t0 = Instant::now();
    let written = decompress_rows(algo, arena, rows.iter().copied(), &mut buffer)?;
    result.decompression_time_ms_random = elapsed_ms(t0);

    if written != expected {
        return Err(Error::Overrun(format!(
            "random row decompression wrote {written} bytes, but expected {expected} bytes"
        )));
    }

    let mut pos = 0;
    for &row in rows {
        let original = arena.get(row);
        if &buffer[pos..pos + original.len()] != original {
            let message = format!(
                "random row decompression does not match original data: first difference at row {row}"
            );
            verification_failure(algorithm, mode, result, message)?;
            break;
        }
        pos += original.len();
    }
    result.decompression_hash_random = xxh3_64(&buffer[..written]);
    drop(buffer);

    // ── Random vectors ──────────────────────────────────────────────────────
    let vectors: Vec<(usize, Range<usize>)> = input
        .random_vector_indices
        .iter()
        .filter_map(|&vector| input.vector_rows(vector).map(|rows| (vector, rows)))
        .collect();
    let skipped = input.random_vector_indices.len() - vectors.len();
    if skipped > 0 {
        debug!(%algorithm, skipped, "vectors past the last row were skipped");
    }

    let expected: usize = vectors
        .iter()
        .map(|(_, rows)| arena.span(rows.start, rows.end).len())
        .sum();
    let mut buffer = allocate(&*algo, expected)?;

    let t0 = Instant::now();
    let mut written = 0;
    for (_, rows) in &vectors {
        written += decompress_rows(algo, arena, rows.clone(), &mut buffer[written..])?;
    }
    result.decompression_time_ms_vector = elapsed_ms(t0);

    if written != expected {
        return Err(Error::Overrun(format!(
            "random vector decompression wrote {written} bytes, but expected {expected} bytes"
        )));
    }
    result.decompression_hash_vector = xxh3_64(&buffer[..written]);

    let mut pos = 0;
    for (vector, rows) in &vectors {
        let original = arena.span(rows.start, rows.end);
        let decompressed = &buffer[pos..pos + original.len()];
        if let Some(offset) = first_difference(decompressed, original) {
            let row = row_containing(arena, rows.clone(), offset);
            let message = format!(
                "random vector decompression does not match original data: \
                 first difference in vector {vector} at row {row}"
            );
            verification_failure(algorithm, mode, result, message)?;
            break;
        }
        pos += original.len();
    }

    Ok(())
}

/// Decompress `rows` one at a time, back to back, into `buffer`.
///
/// Every row must report exactly its length in `arena`. Anything else means
/// the codec wrote past the row (or left a gap the next row lands in), which
/// is an overrun, not a content mismatch.
fn decompress_rows<'a, A, I>(
    algo: &mut A,
    arena: &ByteArena,
    rows: I,
    buffer: &mut [u8],
) -> Result<usize>
where
    A: CompressionAlgorithm<'a> + ?Sized,
    I: IntoIterator<Item = usize>,
{
    let mut written = 0;
    for row in rows {
        let out = &mut buffer[written..];
        let capacity = out.len();
        let n = algo.decompress_one(row, out)?;
        let expected = arena.length(row);
        if n != expected || n > capacity {
            return Err(Error::Overrun(format!(
                "row {row}: decompress_one reported {n} bytes, row holds {expected} bytes \
                 ({capacity} bytes of space left)"
            )));
        }
        written += n;
    }
    Ok(written)
}

fn allocate<'a, A>(algo: &A, decompressed_size: usize) -> Result<Vec<u8>>
where
    A: CompressionAlgorithm<'a> + ?Sized,
{
    let size = algo.decompression_buffer_size(decompressed_size);
    if size < decompressed_size {
        return Err(Error::Overrun(format!(
            "decompression buffer of {size} bytes cannot hold {decompressed_size} bytes"
        )));
    }
    Ok(vec![0u8; size])
}

/// Apply `mode` to a verification failure.
fn verification_failure(
    algorithm: AlgorithmType,
    mode: ErrorMode,
    result: &mut AlgorithmResult,
    message: String,
) -> Result<()> {
    match mode {
        ErrorMode::Throw => Err(Error::Verification { algorithm, message }),
        ErrorMode::Log => {
            error!(%algorithm, "{message}");
            result.record_error(message);
            Ok(())
        }
    }
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

// Index of the row in `rows` that holds byte `offset` of their concatenation.
fn row_containing(arena: &ByteArena, rows: Range<usize>, offset: usize) -> usize {
    let mut end = 0;
    for row in rows.clone() {
        end += arena.length(row);
        if offset < end {
            return row;
        }
    }
    rows.end.saturating_sub(1)
}

#[inline]
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_nanos() as f64 / 1e6
}
