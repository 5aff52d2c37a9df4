//! Random access on top of whole-block codecs.
//!
//! Rows are grouped into blocks of `rows_per_block` consecutive rows. Each
//! block's concatenated payload is compressed independently with a
//! [`BlockCodec`] and the compressed blocks are stored back to back:
//!
//! ```text
//! rows      : r0 r1 r2 r3 | r4 r5 r6 r7 | r8 r9
//! blocks    : [  block 0  ] [  block 1  ] [ b2 ]
//! compressed: |c0....|c1........|c2..|
//! ```
//!
//! Reading one row decompresses only its block into a single-block cache.
//! Consecutive reads inside the cached block reuse it and walk a scan cursor
//! forward over the row lengths instead of re-summing from the block start.

use tracing::debug;

use strbench_core::bitpacking::packed_bytes;
use strbench_core::{
    AlgorithmType, BlockCodec, ByteArena, CodecState, CompressedSizeInfo, CompressionAlgorithm,
    Error, ExperimentInput, Result,
};

/// Extra output bytes promised beyond the decompressed size.
const OUTPUT_PADDING: usize = 32;

#[derive(Debug, Clone)]
struct Block {
    row_lengths: Vec<u32>,
    uncompressed_size: usize,
    compressed_start: usize,
    compressed_len: usize,
}

impl Block {
    fn max_row_length(&self) -> u64 {
        self.row_lengths.iter().copied().max().unwrap_or(0) as u64
    }
}

/// Position inside the cached block: the next row to read and its byte offset.
#[derive(Debug, Clone, Copy, Default)]
struct ScanCursor {
    row_in_block: usize,
    byte_offset: usize,
}

pub struct BlockRandomAccess<C: BlockCodec> {
    codec: C,
    algorithm: AlgorithmType,
    rows_per_block: usize,
    state: CodecState,
    n_rows: usize,
    blocks: Vec<Block>,
    compressed: Vec<u8>,
    cache: Vec<u8>,
    cached_block: Option<usize>,
    cursor: ScanCursor,
}

impl<C: BlockCodec> BlockRandomAccess<C> {
    /// Wrap `codec`, reporting results as `algorithm`. A `rows_per_block` of
    /// zero is treated as one.
    pub fn new(algorithm: AlgorithmType, codec: C, rows_per_block: usize) -> Self {
        Self {
            codec,
            algorithm,
            rows_per_block: rows_per_block.max(1),
            state: CodecState::Uninitialized,
            n_rows: 0,
            blocks: Vec::new(),
            compressed: Vec::new(),
            cache: Vec::new(),
            cached_block: None,
            cursor: ScanCursor::default(),
        }
    }

    pub fn rows_per_block(&self) -> usize {
        self.rows_per_block
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Index of the block currently held decompressed, if any.
    pub fn cached_block(&self) -> Option<usize> {
        self.cached_block
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn block_bounds(&self, block_idx: usize, n_rows: usize) -> (usize, usize) {
        let start = block_idx * self.rows_per_block;
        (start, (start + self.rows_per_block).min(n_rows))
    }

    /// Decompress `block_idx` into the cache unless it is already there.
    fn load_block(&mut self, block_idx: usize) -> Result<()> {
        if self.cached_block == Some(block_idx) {
            return Ok(());
        }
        let block = &self.blocks[block_idx];
        if block.uncompressed_size > 0 {
            let src = &self.compressed
                [block.compressed_start..block.compressed_start + block.compressed_len];
            let written = self.codec.decompress_block(src, &mut self.cache)?;
            if written != block.uncompressed_size {
                self.cached_block = None;
                return Err(Error::Overrun(format!(
                    "{} block {} decompressed to {} bytes, expected {}",
                    self.codec.name(),
                    block_idx,
                    written,
                    block.uncompressed_size
                )));
            }
        }
        self.cached_block = Some(block_idx);
        self.cursor = ScanCursor::default();
        Ok(())
    }
}

impl<'a, C: BlockCodec> CompressionAlgorithm<'a> for BlockRandomAccess<C> {
    fn algorithm_type(&self) -> AlgorithmType {
        self.algorithm
    }

    fn state(&self) -> CodecState {
        self.state
    }

    fn initialize(&mut self, input: &ExperimentInput<'a>) -> Result<()> {
        self.state.require(CodecState::Uninitialized, "initialize")?;
        let arena = input.arena;
        let n_blocks = arena.len().div_ceil(self.rows_per_block);
        let mut bound = 0;
        for block_idx in 0..n_blocks {
            let (start, end) = self.block_bounds(block_idx, arena.len());
            bound += self.codec.compress_bound(arena.span(start, end).len());
        }
        self.compressed.reserve(bound);
        self.blocks.reserve(n_blocks);
        self.state = CodecState::Initialized;
        Ok(())
    }

    fn compress_all(&mut self, arena: &'a ByteArena) -> Result<()> {
        self.state.require(CodecState::Initialized, "compress_all")?;
        let n_blocks = arena.len().div_ceil(self.rows_per_block);
        let mut pos = 0;
        let mut largest = 0;

        for block_idx in 0..n_blocks {
            let (start, end) = self.block_bounds(block_idx, arena.len());
            let raw = arena.span(start, end);
            let bound = self.codec.compress_bound(raw.len());
            if self.compressed.len() < pos + bound {
                self.compressed.resize(pos + bound, 0);
            }
            let written = self
                .codec
                .compress_block(raw, &mut self.compressed[pos..pos + bound])?;
            self.blocks.push(Block {
                row_lengths: (start..end).map(|row| arena.length(row) as u32).collect(),
                uncompressed_size: raw.len(),
                compressed_start: pos,
                compressed_len: written,
            });
            pos += written;
            largest = largest.max(raw.len());
        }

        self.compressed.truncate(pos);
        self.cache = vec![0; largest + OUTPUT_PADDING];
        self.n_rows = arena.len();
        self.state = CodecState::Compressed;

        debug!(
            codec = self.codec.name(),
            blocks = n_blocks,
            raw = arena.total_bytes(),
            compressed = pos,
            "compressed blocks"
        );
        Ok(())
    }

    fn decompression_buffer_size(&self, decompressed_size: usize) -> usize {
        decompressed_size + OUTPUT_PADDING
    }

    fn decompress_all(&self, out: &mut [u8]) -> Result<()> {
        self.state.require(CodecState::Compressed, "decompress_all")?;
        let mut pos = 0;
        for (block_idx, block) in self.blocks.iter().enumerate() {
            if block.uncompressed_size == 0 {
                continue;
            }
            if out.len() < pos + block.uncompressed_size {
                return Err(Error::Overrun(format!(
                    "full decompression needs {} bytes, buffer holds {}",
                    pos + block.uncompressed_size,
                    out.len()
                )));
            }
            let src = &self.compressed
                [block.compressed_start..block.compressed_start + block.compressed_len];
            let written = self.codec.decompress_block(src, &mut out[pos..])?;
            if written != block.uncompressed_size {
                return Err(Error::Overrun(format!(
                    "{} block {} decompressed to {} bytes, expected {}",
                    self.codec.name(),
                    block_idx,
                    written,
                    block.uncompressed_size
                )));
            }
            pos += written;
        }
        Ok(())
    }

    fn decompress_one(&mut self, index: usize, out: &mut [u8]) -> Result<usize> {
        self.state.require(CodecState::Compressed, "decompress_one")?;
        if index >= self.n_rows {
            return Err(Error::RowOutOfRange {
                index,
                len: self.n_rows,
            });
        }

        let block_idx = index / self.rows_per_block;
        let row_in_block = index % self.rows_per_block;
        self.load_block(block_idx)?;

        let block = &self.blocks[block_idx];
        if row_in_block < self.cursor.row_in_block {
            self.cursor = ScanCursor::default();
        }
        while self.cursor.row_in_block < row_in_block {
            self.cursor.byte_offset += block.row_lengths[self.cursor.row_in_block] as usize;
            self.cursor.row_in_block += 1;
        }

        let offset = self.cursor.byte_offset;
        let len = block.row_lengths[row_in_block] as usize;
        let capacity = out.len();
        let dst = out.get_mut(..len).ok_or_else(|| {
            Error::Overrun(format!(
                "row {} needs {} bytes, buffer holds {}",
                index, len, capacity
            ))
        })?;
        dst.copy_from_slice(&self.cache[offset..offset + len]);
        Ok(len)
    }

    fn compressed_size(&self) -> Result<CompressedSizeInfo> {
        self.state.require(CodecState::Compressed, "compressed_size")?;
        let data: usize = self.blocks.iter().map(|b| b.compressed_len).sum();
        let lengths: usize = self
            .blocks
            .iter()
            .map(|b| packed_bytes(b.max_row_length(), self.rows_per_block))
            .sum();
        Ok(CompressedSizeInfo::data_only(data, lengths))
    }

    fn free(&mut self) {
        self.blocks = Vec::new();
        self.compressed = Vec::new();
        self.cache = Vec::new();
        self.cached_block = None;
        self.cursor = ScanCursor::default();
        self.n_rows = 0;
        self.state = CodecState::Freed;
    }
}
