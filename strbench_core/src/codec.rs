use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arena::ByteArena;
use crate::error::{Error, Result};
use crate::input::ExperimentInput;
use crate::result::CompressedSizeInfo;

// ── Algorithm identity ──────────────────────────────────────────────────────

/// Identity of a benchmarked algorithm, used to label results and to pick an
/// implementation from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmType {
    /// Rows stored verbatim in blocks. Baseline for the other codecs.
    Raw,
    Dictionary,
    Lz4,
    Zstd,
    Deflate,
    /// Per-row FSST against a column-wide symbol table.
    Fsst,
}

impl AlgorithmType {
    pub const ALL: [AlgorithmType; 6] = [
        AlgorithmType::Raw,
        AlgorithmType::Dictionary,
        AlgorithmType::Lz4,
        AlgorithmType::Zstd,
        AlgorithmType::Deflate,
        AlgorithmType::Fsst,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AlgorithmType::Raw => "Raw",
            AlgorithmType::Dictionary => "Dictionary",
            AlgorithmType::Lz4 => "LZ4",
            AlgorithmType::Zstd => "Zstd",
            AlgorithmType::Deflate => "Deflate",
            AlgorithmType::Fsst => "FSST",
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "passthrough" | "pass" | "none" => Ok(AlgorithmType::Raw),
            "dictionary" | "dict" => Ok(AlgorithmType::Dictionary),
            "lz4" | "l" => Ok(AlgorithmType::Lz4),
            "zstd" | "z" => Ok(AlgorithmType::Zstd),
            "deflate" | "gzip" => Ok(AlgorithmType::Deflate),
            "fsst" | "f" => Ok(AlgorithmType::Fsst),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

/// Lifecycle of one codec instance.
///
/// ```text
/// Uninitialized ──initialize──▶ Initialized ──compress_all──▶ Compressed
///        │                          │                             │
///        └──────────────────────────┴──────────── free ───────────┴──▶ Freed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecState {
    #[default]
    Uninitialized,
    Initialized,
    Compressed,
    Freed,
}

impl CodecState {
    /// Fail with a usage error unless the codec is in `expected`.
    #[inline]
    pub fn require(self, expected: CodecState, operation: &'static str) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(Error::Usage {
                operation,
                state: self,
            })
        }
    }
}

/// Uniform contract every benchmarked codec implements.
///
/// The lifetime `'a` is the lifetime of the frozen [`ByteArena`] being
/// measured: codecs may keep borrowed slices into it (the dictionary codec
/// does) instead of copying rows.
///
/// Out-of-sequence calls return [`Error::Usage`]; see [`CodecState`].
pub trait CompressionAlgorithm<'a> {
    fn algorithm_type(&self) -> AlgorithmType;

    fn state(&self) -> CodecState;

    /// Allocate working buffers sized from `input`.
    fn initialize(&mut self, input: &ExperimentInput<'a>) -> Result<()>;

    /// Build the compressed representation of every row. Valid once.
    fn compress_all(&mut self, arena: &'a ByteArena) -> Result<()>;

    /// Output capacity that is always enough to decompress
    /// `decompressed_size` bytes. May exceed it for codecs that write past
    /// their logical end.
    fn decompression_buffer_size(&self, decompressed_size: usize) -> usize;

    /// Write every row, in row order, to the front of `out`.
    fn decompress_all(&self, out: &mut [u8]) -> Result<()>;

    /// Write row `index` to the front of `out` and return its byte length.
    ///
    /// Must give identical bytes for any call order and repeated indices.
    fn decompress_one(&mut self, index: usize, out: &mut [u8]) -> Result<usize>;

    fn compressed_size(&self) -> Result<CompressedSizeInfo>;

    /// Release codec-owned buffers. Idempotent.
    fn free(&mut self);
}

// ── Whole-block backends ─────────────────────────────────────────────────────

/// A codec that can only (de)compress a whole block at once.
///
/// Implementations must compress every block independently; no state may
/// carry from one block to the next. That is what lets the random-access
/// adapter decompress any single block on demand.
pub trait BlockCodec {
    fn name(&self) -> &'static str;

    /// Worst-case compressed size for `raw_len` input bytes.
    fn compress_bound(&self, raw_len: usize) -> usize;

    /// Compress `raw` into the front of `out`, returning the bytes written.
    ///
    /// `out` holds at least `compress_bound(raw.len())` bytes.
    fn compress_block(&self, raw: &[u8], out: &mut [u8]) -> anyhow::Result<usize>;

    /// Decompress one block into the front of `out`, returning the bytes written.
    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> anyhow::Result<usize>;
}
