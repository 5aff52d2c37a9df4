mod block;
mod deflate_codec;
mod dictionary;
mod fsst_codec;
mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use block::BlockRandomAccess;
pub use deflate_codec::DeflateCodec;
pub use dictionary::DictionaryCodec;
pub use fsst_codec::FsstCodec;
pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zstd_codec::ZstdCodec;

use strbench_core::config::{DEFAULT_ROWS_PER_BLOCK, DEFAULT_ZSTD_LEVEL};
use strbench_core::{AlgorithmType, BenchmarkConfig, CodecRegistry, CompressionAlgorithm, Result};

/// Build a fresh, uninitialized codec for `kind`.
///
/// Block codecs use `rows_per_block` rows per block; zstd compresses at
/// `zstd_level`. Dictionary and FSST work per row and ignore both.
pub fn algorithm_by_type<'a>(
    kind: AlgorithmType,
    rows_per_block: usize,
    zstd_level: i32,
) -> Box<dyn CompressionAlgorithm<'a> + 'a> {
    match kind {
        AlgorithmType::Raw => Box::new(BlockRandomAccess::new(kind, PassThroughCodec, rows_per_block)),
        AlgorithmType::Dictionary => Box::new(DictionaryCodec::new()),
        AlgorithmType::Lz4 => Box::new(BlockRandomAccess::new(kind, Lz4Codec, rows_per_block)),
        AlgorithmType::Zstd => Box::new(BlockRandomAccess::new(
            kind,
            ZstdCodec::new(zstd_level),
            rows_per_block,
        )),
        AlgorithmType::Deflate => Box::new(BlockRandomAccess::new(
            kind,
            DeflateCodec::default(),
            rows_per_block,
        )),
        AlgorithmType::Fsst => Box::new(FsstCodec::new()),
    }
}

/// Registry over every codec in this crate.
#[derive(Debug, Clone, Copy)]
pub struct BundledCodecs {
    pub rows_per_block: usize,
    pub zstd_level: i32,
}

impl BundledCodecs {
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            rows_per_block: config.rows_per_block,
            zstd_level: config.zstd_level,
        }
    }
}

impl Default for BundledCodecs {
    fn default() -> Self {
        Self {
            rows_per_block: DEFAULT_ROWS_PER_BLOCK,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl CodecRegistry for BundledCodecs {
    fn create<'a>(&self, kind: AlgorithmType) -> Result<Box<dyn CompressionAlgorithm<'a> + 'a>> {
        Ok(algorithm_by_type(kind, self.rows_per_block, self.zstd_level))
    }
}
