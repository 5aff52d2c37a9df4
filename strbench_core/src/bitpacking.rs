//! Analytic bit-packing size model.
//!
//! Codecs keep their metadata (lengths, codes) in whatever in-memory layout is
//! fastest, but report its size as if it were bit-packed at the minimum
//! width. Nothing here produces or reads a packed buffer; it only computes
//! what one would cost, so every codec reports metadata size the same way.

/// Bits needed to store any value in `0..=range`. Never less than one.
#[inline]
pub fn bits_per_value(range: u64) -> u8 {
    if range == 0 {
        return 1;
    }
    // ceil(log2(range + 1)) is the bit length of `range`.
    (u64::BITS - range.leading_zeros()) as u8
}

/// Bytes needed to pack `count` values of `bits_per_value(range)` bits each.
#[inline]
pub fn packed_bytes(range: u64, count: usize) -> usize {
    let bits = bits_per_value(range) as usize;
    (bits * count).div_ceil(8)
}

/// Packed size of `values`, frame-of-reference encoded against their minimum.
///
/// Returns 0 for an empty slice.
pub fn packed_bytes_of(values: &[usize]) -> usize {
    let Some(&min) = values.iter().min() else {
        return 0;
    };
    let max = values.iter().copied().max().unwrap_or(min);
    packed_bytes((max - min) as u64, values.len())
}
