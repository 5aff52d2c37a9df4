use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use strbench_core::BlockCodec;

/// Raw DEFLATE block codec (no zlib/gzip framing).
///
/// Slower than LZ4 and usually larger than zstd. It is here as the classic
/// reference point most columnar formats are compared against.
#[derive(Default)]
pub struct DeflateCodec {
    pub level: Compression,
}

impl DeflateCodec {
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl BlockCodec for DeflateCodec {
    fn name(&self) -> &'static str {
        "deflate"
    }

    // zlib's compressBound plus headroom for the final stored block.
    fn compress_bound(&self, raw_len: usize) -> usize {
        raw_len + (raw_len >> 12) + (raw_len >> 14) + (raw_len >> 25) + 64
    }

    fn compress_block(&self, raw: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        let mut encoder = Compress::new(self.level, false);
        match encoder.compress(raw, out, FlushCompress::Finish)? {
            Status::StreamEnd => Ok(encoder.total_out() as usize),
            status => anyhow::bail!(
                "deflate stream did not finish ({:?}); output buffer of {} bytes too small",
                status,
                out.len()
            ),
        }
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        let mut decoder = Decompress::new(false);
        match decoder.decompress(compressed, out, FlushDecompress::Finish)? {
            Status::StreamEnd => Ok(decoder.total_out() as usize),
            status => anyhow::bail!(
                "deflate stream did not finish ({:?}) after {} bytes",
                status,
                decoder.total_out()
            ),
        }
    }
}
