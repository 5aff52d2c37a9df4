use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};
use strbench_core::BlockCodec;

/// LZ4 block codec.
///
/// Fastest decompression of the bundled backends, typically 3–5 GB/s on
/// modern hardware. Blocks are raw LZ4 blocks without a size prefix; the
/// adapter keeps every block's uncompressed size itself.
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_bound(&self, raw_len: usize) -> usize {
        get_maximum_output_size(raw_len)
    }

    fn compress_block(&self, raw: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        compress_into(raw, out).map_err(|e| anyhow::anyhow!("lz4 compress error: {}", e))
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        decompress_into(compressed, out).map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))
    }
}
