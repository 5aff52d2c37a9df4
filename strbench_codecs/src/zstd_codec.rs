use strbench_core::config::DEFAULT_ZSTD_LEVEL;
use strbench_core::BlockCodec;

/// Zstandard block codec.
///
/// Each block is one independent zstd frame compressed at the configured
/// level (default: [`DEFAULT_ZSTD_LEVEL`]).
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl BlockCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress_bound(&self, raw_len: usize) -> usize {
        zstd::zstd_safe::compress_bound(raw_len)
    }

    fn compress_block(&self, raw: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        let written = zstd::bulk::compress_to_buffer(raw, out, self.level)?;
        Ok(written)
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        let written = zstd::bulk::decompress_to_buffer(compressed, out)?;
        Ok(written)
    }
}
