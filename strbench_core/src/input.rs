use rand::Rng;

use crate::arena::ByteArena;

/// One column chunk plus the access samples every codec is measured with.
///
/// Both samples are drawn once per chunk and shared by all codecs under
/// test, so their random-access latencies are directly comparable.
#[derive(Debug, Clone)]
pub struct ExperimentInput<'a> {
    pub arena: &'a ByteArena,
    /// Row indices in `0..arena.len()`, sorted ascending.
    pub random_row_indices: Vec<usize>,
    /// Vector indices in `0..arena.len() / vector_size`, sorted ascending.
    pub random_vector_indices: Vec<usize>,
    /// Rows per vector for the aligned-block access pattern.
    pub vector_size: usize,
}

impl<'a> ExperimentInput<'a> {
    /// Draw both samples from `rng`.
    pub fn sample<R: Rng + ?Sized>(
        arena: &'a ByteArena,
        n_random_rows: usize,
        n_random_vectors: usize,
        vector_size: usize,
        rng: &mut R,
    ) -> Self {
        let n_vectors = if vector_size == 0 {
            0
        } else {
            arena.len() / vector_size
        };
        Self {
            arena,
            random_row_indices: random_indices(rng, n_random_rows, arena.len()),
            random_vector_indices: random_indices(rng, n_random_vectors, n_vectors),
            vector_size,
        }
    }

    /// Use explicit samples, e.g. to replay a run or in tests.
    pub fn with_indices(
        arena: &'a ByteArena,
        random_row_indices: Vec<usize>,
        random_vector_indices: Vec<usize>,
        vector_size: usize,
    ) -> Self {
        Self {
            arena,
            random_row_indices,
            random_vector_indices,
            vector_size,
        }
    }

    /// Row range `[start, end)` of vector `vector_idx`, or `None` when the
    /// vector runs past the last row.
    pub fn vector_rows(&self, vector_idx: usize) -> Option<std::ops::Range<usize>> {
        let start = vector_idx.checked_mul(self.vector_size)?;
        let end = start.checked_add(self.vector_size)?;
        (end <= self.arena.len()).then_some(start..end)
    }
}

/// `n` indices drawn uniformly with replacement from `0..max`, sorted so
/// codecs with a forward scan cursor see ascending access.
///
/// Empty when `max == 0`.
pub fn random_indices<R: Rng + ?Sized>(rng: &mut R, n: usize, max: usize) -> Vec<usize> {
    if max == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..n).map(|_| rng.random_range(0..max)).collect();
    indices.sort_unstable();
    indices
}
