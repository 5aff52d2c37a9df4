use ahash::AHashMap;
use strbench_core::bitpacking::{packed_bytes, packed_bytes_of};
use strbench_core::{
    AlgorithmType, ByteArena, CodecState, CompressedSizeInfo, CompressionAlgorithm, Error,
    ExperimentInput, Result,
};

/// Extra output bytes promised beyond the decompressed size.
const OUTPUT_PADDING: usize = 32;

/// Deduplicating dictionary codec.
///
/// Every distinct row value gets an integer code in first-occurrence order,
/// starting at 0; each row is stored as its code. Dictionary entries borrow
/// straight from the frozen arena, so compression copies no row bytes.
///
/// Reported size: the distinct values' bytes, their lengths and one code per
/// row, both bit-packed (see [`strbench_core::bitpacking`]).
#[derive(Default)]
pub struct DictionaryCodec<'a> {
    state: CodecState,
    /// Byte content → code.
    index: AHashMap<&'a [u8], u32>,
    /// Distinct values in code order.
    entries: Vec<&'a [u8]>,
    /// One code per row.
    codes: Vec<u32>,
}

impl<'a> DictionaryCodec<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct values in code order.
    pub fn dictionary(&self) -> &[&'a [u8]] {
        &self.entries
    }

    /// One code per row, in row order.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }
}

impl<'a> CompressionAlgorithm<'a> for DictionaryCodec<'a> {
    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Dictionary
    }

    fn state(&self) -> CodecState {
        self.state
    }

    fn initialize(&mut self, input: &ExperimentInput<'a>) -> Result<()> {
        self.state.require(CodecState::Uninitialized, "initialize")?;
        let rows = input.arena.len();
        // Assume about 10% distinct values.
        self.index.reserve(rows / 10 + 1);
        self.entries.reserve(rows / 10 + 1);
        self.codes.reserve(rows);
        self.state = CodecState::Initialized;
        Ok(())
    }

    fn compress_all(&mut self, arena: &'a ByteArena) -> Result<()> {
        self.state.require(CodecState::Initialized, "compress_all")?;
        for row in arena.iter() {
            let next = self.entries.len() as u32;
            let code = *self.index.entry(row).or_insert_with(|| {
                self.entries.push(row);
                next
            });
            self.codes.push(code);
        }
        self.state = CodecState::Compressed;
        Ok(())
    }

    fn decompression_buffer_size(&self, decompressed_size: usize) -> usize {
        decompressed_size + OUTPUT_PADDING
    }

    fn decompress_all(&self, out: &mut [u8]) -> Result<()> {
        self.state.require(CodecState::Compressed, "decompress_all")?;
        let capacity = out.len();
        let mut pos = 0;
        for &code in &self.codes {
            let value = self.entries[code as usize];
            let end = pos + value.len();
            let dst = out.get_mut(pos..end).ok_or_else(|| {
                Error::Overrun(format!(
                    "full decompression needs {} bytes, buffer holds {}",
                    end, capacity
                ))
            })?;
            dst.copy_from_slice(value);
            pos = end;
        }
        Ok(())
    }

    fn decompress_one(&mut self, index: usize, out: &mut [u8]) -> Result<usize> {
        self.state.require(CodecState::Compressed, "decompress_one")?;
        let code = *self.codes.get(index).ok_or(Error::RowOutOfRange {
            index,
            len: self.codes.len(),
        })?;
        let value = self.entries[code as usize];
        let capacity = out.len();
        let dst = out.get_mut(..value.len()).ok_or_else(|| {
            Error::Overrun(format!(
                "row {} needs {} bytes, buffer holds {}",
                index,
                value.len(),
                capacity
            ))
        })?;
        dst.copy_from_slice(value);
        Ok(value.len())
    }

    fn compressed_size(&self) -> Result<CompressedSizeInfo> {
        self.state.require(CodecState::Compressed, "compressed_size")?;
        let lengths: Vec<usize> = self.entries.iter().map(|value| value.len()).collect();
        let strings = lengths.iter().sum();
        let string_lengths = packed_bytes_of(&lengths);
        let codes = packed_bytes(self.entries.len() as u64, self.codes.len());
        Ok(CompressedSizeInfo::dictionary(strings, string_lengths, codes))
    }

    fn free(&mut self) {
        self.index = AHashMap::new();
        self.entries = Vec::new();
        self.codes = Vec::new();
        self.state = CodecState::Freed;
    }
}
