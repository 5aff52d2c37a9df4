/// Append-only arena of variable-length rows.
///
/// All row bytes live back to back in one owned buffer; `starts[i]` is the
/// byte offset where row `i` begins. Row `i` ends where row `i + 1` begins,
/// or at `total_bytes()` for the last row.
///
/// ```text
/// data   : [a a b b b c]
/// starts : [0, 2, 5]          offsets(): [0, 2, 5, 6]
/// ```
///
/// # Freezing
/// Codecs borrow row slices for as long as they hold `&ByteArena`, so the
/// borrow checker rules out appends while a measurement run is in progress.
/// Fill the arena completely, then hand out shared references.
#[derive(Debug, Default, Clone)]
pub struct ByteArena {
    data: Vec<u8>,
    starts: Vec<usize>,
}

/// Smallest buffer allocated on first growth.
const MIN_GROWTH_BYTES: usize = 64;

impl ByteArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with capacity hints for bytes and row count.
    pub fn with_capacity(initial_bytes: usize, expected_rows: usize) -> Self {
        Self {
            data: Vec::with_capacity(initial_bytes),
            starts: Vec::with_capacity(expected_rows),
        }
    }

    /// Build an arena from any sequence of rows, mostly for tests and demos.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let mut arena = Self::new();
        for row in rows {
            arena.push(row.as_ref());
        }
        arena
    }

    /// Append a row and return its index.
    pub fn push(&mut self, row: &[u8]) -> usize {
        self.ensure_capacity(self.data.len() + row.len());
        self.starts.push(self.data.len());
        self.data.extend_from_slice(row);
        self.starts.len() - 1
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Total payload bytes across all rows.
    #[inline]
    pub fn total_bytes(&self) -> usize {
        self.data.len()
    }

    /// Bytes a plain `u32` length array for these rows would take.
    pub fn total_size_lengths(&self) -> usize {
        self.starts.len() * std::mem::size_of::<u32>()
    }

    /// Allocated payload capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.data.capacity()
    }

    /// The concatenated row payload.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `len() + 1` monotone offsets; the last one is the `total_bytes()` sentinel.
    pub fn offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.starts.len() + 1);
        offsets.extend_from_slice(&self.starts);
        offsets.push(self.data.len());
        offsets
    }

    /// One borrowed slice per row, in row order.
    pub fn row_slices(&self) -> Vec<&[u8]> {
        self.iter().collect()
    }

    /// Row `idx`. Panics when `idx >= len()`.
    #[inline]
    pub fn get(&self, idx: usize) -> &[u8] {
        &self.data[self.starts[idx]..self.end_of(idx)]
    }

    /// Byte length of row `idx`. Panics when `idx >= len()`.
    #[inline]
    pub fn length(&self, idx: usize) -> usize {
        self.end_of(idx) - self.starts[idx]
    }

    pub fn lengths(&self) -> Vec<usize> {
        (0..self.len()).map(|idx| self.length(idx)).collect()
    }

    /// Byte range covering rows `start..end`, which are contiguous in `data`.
    pub fn span(&self, start: usize, end: usize) -> &[u8] {
        if start >= end {
            return &[];
        }
        &self.data[self.starts[start]..self.end_of(end - 1)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len()).map(move |idx| self.get(idx))
    }

    pub fn reserve_bytes(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    pub fn reserve_rows(&mut self, additional: usize) {
        self.starts.reserve(additional);
    }

    /// Drop all rows, keeping both allocations.
    pub fn clear(&mut self) {
        self.data.clear();
        self.starts.clear();
    }

    #[inline]
    fn end_of(&self, idx: usize) -> usize {
        self.starts
            .get(idx + 1)
            .copied()
            .unwrap_or(self.data.len())
    }

    // Grow by at least 1.5x so a long run of small appends stays amortized O(1).
    fn ensure_capacity(&mut self, min_capacity: usize) {
        let capacity = self.data.capacity();
        if min_capacity <= capacity {
            return;
        }
        let grown = if capacity == 0 {
            MIN_GROWTH_BYTES
        } else {
            capacity + capacity / 2
        };
        let target = grown.max(min_capacity);
        self.data.reserve_exact(target - self.data.len());
    }
}
