use strbench_core::BlockCodec;

/// No-op codec: stores blocks verbatim.
///
/// Wrapped in the block adapter this is the `Raw` baseline: it measures the
/// cost of the block and cache machinery alone.
pub struct PassThroughCodec;

impl BlockCodec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress_bound(&self, raw_len: usize) -> usize {
        raw_len
    }

    fn compress_block(&self, raw: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        let capacity = out.len();
        let dst = out
            .get_mut(..raw.len())
            .ok_or_else(|| anyhow::anyhow!("output too small: {} < {}", capacity, raw.len()))?;
        dst.copy_from_slice(raw);
        Ok(raw.len())
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        self.compress_block(compressed, out)
    }
}
