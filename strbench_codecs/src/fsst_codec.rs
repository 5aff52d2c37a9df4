use fsst::Compressor;
use strbench_core::bitpacking::packed_bytes_of;
use strbench_core::{
    AlgorithmType, ByteArena, CodecState, CompressedSizeInfo, CompressionAlgorithm, Error,
    ExperimentInput, Result,
};

/// Extra output bytes promised beyond the decompressed size.
const OUTPUT_PADDING: usize = 32;

/// Serialized symbol table header (version, symbol count, flags).
const SYMBOL_TABLE_HEADER: usize = 8;

/// FSST (Fast Static Symbol Table) codec, rows compressed one by one.
///
/// A symbol table of up to 255 byte strings (1 to 8 bytes) is trained on the
/// whole column, then every row is encoded on its own against it, so any row
/// decodes without touching its neighbours and no block cache is needed.
///
/// Reported size: the symbol table as the dictionary (symbol bytes, one
/// length byte per symbol, header) and the encoded rows as data, with their
/// lengths bit-packed.
#[derive(Default)]
pub struct FsstCodec {
    state: CodecState,
    /// `None` until trained, and for columns with no bytes at all.
    compressor: Option<Compressor>,
    /// Encoded rows back to back.
    compressed: Vec<u8>,
    /// `offsets[i]..offsets[i + 1]` is row `i` in `compressed`.
    offsets: Vec<usize>,
}

impl FsstCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trained symbols; 0 before compression.
    pub fn symbol_count(&self) -> usize {
        self.compressor
            .as_ref()
            .map_or(0, |c| c.symbol_lengths().len())
    }

    fn encoded(&self, index: usize) -> &[u8] {
        &self.compressed[self.offsets[index]..self.offsets[index + 1]]
    }

    fn decode_into(&self, index: usize, out: &mut [u8]) -> Result<usize> {
        let encoded = self.encoded(index);
        if encoded.is_empty() {
            return Ok(0);
        }
        let Some(compressor) = &self.compressor else {
            return Err(Error::Backend(anyhow::anyhow!(
                "fsst row {index} has {} encoded bytes but no symbol table",
                encoded.len()
            )));
        };
        let decoded = compressor.decompressor().decompress(encoded);
        let capacity = out.len();
        let dst = out.get_mut(..decoded.len()).ok_or_else(|| {
            Error::Overrun(format!(
                "row {} needs {} bytes, buffer holds {}",
                index,
                decoded.len(),
                capacity
            ))
        })?;
        dst.copy_from_slice(&decoded);
        Ok(decoded.len())
    }
}

impl<'a> CompressionAlgorithm<'a> for FsstCodec {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Fsst
    }

    fn state(&self) -> CodecState {
        self.state
    }

    fn initialize(&mut self, input: &ExperimentInput<'a>) -> Result<()> {
        self.state.require(CodecState::Uninitialized, "initialize")?;
        let arena = input.arena;
        // Encoded rows rarely exceed the input; doubling covers the worst case
        // of every byte escaped.
        self.compressed.reserve(arena.total_bytes() * 2);
        self.offsets.reserve(arena.len() + 1);
        self.state = CodecState::Initialized;
        Ok(())
    }

    fn compress_all(&mut self, arena: &'a ByteArena) -> Result<()> {
        self.state.require(CodecState::Initialized, "compress_all")?;
        self.offsets.push(0);
        if arena.total_bytes() > 0 {
            let sample: Vec<&[u8]> = arena.row_slices();
            let compressor = Compressor::train(&sample);
            for row in arena.iter() {
                if !row.is_empty() {
                    self.compressed.extend_from_slice(&compressor.compress(row));
                }
                self.offsets.push(self.compressed.len());
            }
            self.compressor = Some(compressor);
        } else {
            self.offsets.resize(arena.len() + 1, 0);
        }
        self.state = CodecState::Compressed;
        Ok(())
    }

    fn decompression_buffer_size(&self, decompressed_size: usize) -> usize {
        decompressed_size + OUTPUT_PADDING
    }

    fn decompress_all(&self, out: &mut [u8]) -> Result<()> {
        self.state.require(CodecState::Compressed, "decompress_all")?;
        let mut pos = 0;
        for index in 0..self.offsets.len() - 1 {
            pos += self.decode_into(index, &mut out[pos..])?;
        }
        Ok(())
    }

    fn decompress_one(&mut self, index: usize, out: &mut [u8]) -> Result<usize> {
        self.state.require(CodecState::Compressed, "decompress_one")?;
        let rows = self.offsets.len() - 1;
        if index >= rows {
            return Err(Error::RowOutOfRange { index, len: rows });
        }
        self.decode_into(index, out)
    }

    fn compressed_size(&self) -> Result<CompressedSizeInfo> {
        self.state.require(CodecState::Compressed, "compressed_size")?;
        let (symbol_bytes, symbol_lengths) = match &self.compressor {
            Some(c) => {
                let lengths = c.symbol_lengths();
                let bytes: usize = lengths.iter().map(|&len| len as usize).sum();
                (bytes, SYMBOL_TABLE_HEADER + lengths.len())
            }
            None => (0, 0),
        };
        let row_lengths: Vec<usize> = self.offsets.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(CompressedSizeInfo::new(
            symbol_bytes,
            symbol_lengths,
            self.compressed.len(),
            packed_bytes_of(&row_lengths),
        ))
    }

    fn free(&mut self) {
        self.compressor = None;
        self.compressed = Vec::new();
        self.offsets = Vec::new();
        self.state = CodecState::Freed;
    }
}
