/// Codec-level tests: dictionary coding and its size report, the block
/// adapter's single-block cache and scan cursor, FSST's symbol-table
/// accounting, and byte-exact round trips through every bundled backend.
use std::cell::Cell;
use std::rc::Rc;

use strbench_codecs::{
    algorithm_by_type, BlockRandomAccess, DictionaryCodec, FsstCodec, Lz4Codec, PassThroughCodec,
    ZstdCodec,
};
use strbench_core::config::DEFAULT_ZSTD_LEVEL;
use strbench_core::bitpacking::packed_bytes;
use strbench_core::{
    AlgorithmType, BlockCodec, ByteArena, CodecState, CompressionAlgorithm, Error,
    ExperimentInput,
};

// ── helpers ───────────────────────────────────────────────────────────────

/// Deterministic URL-like rows with heavy repetition and some empty rows.
fn url_rows(n: usize, seed: u64) -> Vec<String> {
    let hosts = ["example.com", "cdn.example.net", "api.internal"];
    let mut state = seed;
    (0..n)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            if i % 23 == 7 {
                return String::new();
            }
            let host = hosts[(state >> 62) as usize % hosts.len()];
            format!("https://{}/item/{}", host, (state >> 40) % 300)
        })
        .collect()
}

fn compressed<'a>(algo: &mut dyn CompressionAlgorithm<'a>, arena: &'a ByteArena) {
    let input = ExperimentInput::with_indices(arena, vec![], vec![], 2048);
    algo.initialize(&input).unwrap();
    algo.compress_all(arena).unwrap();
}

fn read_row(algo: &mut dyn CompressionAlgorithm<'_>, index: usize) -> Vec<u8> {
    let mut out = vec![0u8; 4096];
    let n = algo.decompress_one(index, &mut out).unwrap();
    out.truncate(n);
    out
}

/// Pass-through backend that counts block decompressions.
#[derive(Clone, Default)]
struct CountingCodec {
    decompressions: Rc<Cell<usize>>,
}

impl BlockCodec for CountingCodec {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn compress_bound(&self, raw_len: usize) -> usize {
        PassThroughCodec.compress_bound(raw_len)
    }

    fn compress_block(&self, raw: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        PassThroughCodec.compress_block(raw, out)
    }

    fn decompress_block(&self, compressed: &[u8], out: &mut [u8]) -> anyhow::Result<usize> {
        self.decompressions.set(self.decompressions.get() + 1);
        PassThroughCodec.decompress_block(compressed, out)
    }
}

// ── dictionary ────────────────────────────────────────────────────────────

#[test]
fn test_dictionary_codes_in_first_seen_order() {
    let arena = ByteArena::from_rows(["aa", "bb", "aa"]);
    let mut codec = DictionaryCodec::new();
    compressed(&mut codec, &arena);

    assert_eq!(codec.dictionary(), &[&b"aa"[..], b"bb"]);
    assert_eq!(codec.codes(), &[0, 1, 0]);

    let size = codec.compressed_size().unwrap();
    assert_eq!(size.parts.size_dictionary_strings, 4);
    // Both entries have length 2: one bit each, rounded up to a byte.
    assert_eq!(size.parts.size_dictionary_lengths, 1);
    // Three 2-bit codes.
    assert_eq!(size.parts.size_data_codes, 1);
    assert_eq!(size.parts.size_data_lengths, 0);
    assert_eq!(size.compressed_size, 6);

    assert_eq!(read_row(&mut codec, 2), b"aa");
    assert_eq!(read_row(&mut codec, 1), b"bb");
}

#[test]
fn test_dictionary_is_deterministic() {
    let rows = url_rows(2_000, 3);
    let arena = ByteArena::from_rows(&rows);

    let mut a = DictionaryCodec::new();
    let mut b = DictionaryCodec::new();
    compressed(&mut a, &arena);
    compressed(&mut b, &arena);

    assert_eq!(a.codes(), b.codes());
    assert_eq!(a.compressed_size().unwrap(), b.compressed_size().unwrap());
    assert!(a.dictionary().len() < rows.len());
}

#[test]
fn test_dictionary_lengths_use_min_max_range() {
    // Entry lengths 5, 2, 9 span a range of 7: 3 bits per entry.
    let arena = ByteArena::from_rows(["aaaaa", "bb", "aaaaa", "ccccccccc"]);
    let mut codec = DictionaryCodec::new();
    compressed(&mut codec, &arena);

    let size = codec.compressed_size().unwrap();
    assert_eq!(size.parts.size_dictionary_strings, 16);
    assert_eq!(size.parts.size_dictionary_lengths, packed_bytes(7, 3));
    assert_eq!(size.parts.size_data_codes, packed_bytes(3, 4));
}

#[test]
fn test_dictionary_row_out_of_range() {
    let arena = ByteArena::from_rows(["x"]);
    let mut codec = DictionaryCodec::new();
    compressed(&mut codec, &arena);

    let mut out = [0u8; 8];
    assert!(matches!(
        codec.decompress_one(1, &mut out),
        Err(Error::RowOutOfRange { index: 1, len: 1 })
    ));
}

#[test]
fn test_dictionary_lifecycle() {
    let arena = ByteArena::from_rows(["x", "y"]);
    let mut codec = DictionaryCodec::new();
    assert!(matches!(codec.compress_all(&arena), Err(Error::Usage { .. })));

    compressed(&mut codec, &arena);
    assert_eq!(codec.state(), CodecState::Compressed);

    codec.free();
    codec.free();
    assert_eq!(codec.state(), CodecState::Freed);
    let mut out = [0u8; 8];
    assert!(matches!(
        codec.decompress_one(0, &mut out),
        Err(Error::Usage {
            operation: "decompress_one",
            state: CodecState::Freed
        })
    ));
}

// ── block adapter ─────────────────────────────────────────────────────────

#[test]
fn test_block_cache_decompresses_only_the_needed_block() {
    let arena = ByteArena::from_rows(["r0", "r1", "r2", "r3"]);
    let codec = CountingCodec::default();
    let count = codec.decompressions.clone();
    let mut algo = BlockRandomAccess::new(AlgorithmType::Raw, codec, 2);
    compressed(&mut algo, &arena);
    assert_eq!(algo.block_count(), 2);
    assert_eq!(algo.cached_block(), None);

    assert_eq!(read_row(&mut algo, 2), b"r2");
    assert_eq!(algo.cached_block(), Some(1));
    assert_eq!(count.get(), 1, "block 0 must not be decompressed");

    // Same block: served from the cache, cursor moves forward.
    assert_eq!(read_row(&mut algo, 3), b"r3");
    assert_eq!(count.get(), 1);

    // Back in the same block: cursor rewinds, still no decompression.
    assert_eq!(read_row(&mut algo, 2), b"r2");
    assert_eq!(count.get(), 1);

    assert_eq!(read_row(&mut algo, 0), b"r0");
    assert_eq!(algo.cached_block(), Some(0));
    assert_eq!(count.get(), 2);
}

#[test]
fn test_block_short_last_block_and_empty_rows() {
    let arena = ByteArena::from_rows(["a", "", "bcd", "", ""]);
    let mut algo = BlockRandomAccess::new(AlgorithmType::Lz4, Lz4Codec, 2);
    compressed(&mut algo, &arena);

    assert_eq!(algo.block_count(), 3);
    assert_eq!(read_row(&mut algo, 4), b"");
    assert_eq!(read_row(&mut algo, 1), b"");
    assert_eq!(read_row(&mut algo, 2), b"bcd");

    let mut out = vec![0u8; algo.decompression_buffer_size(arena.total_bytes())];
    algo.decompress_all(&mut out).unwrap();
    assert_eq!(&out[..arena.total_bytes()], arena.data());
}

#[test]
fn test_block_size_report() {
    let arena = ByteArena::from_rows(["a", "bb", "ccc", "dddd"]);
    let mut algo = BlockRandomAccess::new(AlgorithmType::Raw, PassThroughCodec, 2);
    compressed(&mut algo, &arena);

    let size = algo.compressed_size().unwrap();
    assert_eq!(size.parts.size_data_codes, 10);
    // Longest rows per block are 2 and 4: two 2-bit and two 3-bit lengths.
    assert_eq!(size.parts.size_data_lengths, 2);
    assert_eq!(size.parts.size_dictionary, 0);
    assert_eq!(size.compressed_size, 12);
}

#[test]
fn test_block_small_output_is_an_overrun() {
    let arena = ByteArena::from_rows(["hello", "world"]);
    let mut algo = BlockRandomAccess::new(AlgorithmType::Zstd, ZstdCodec::new(1), 8);
    compressed(&mut algo, &arena);

    let mut out = [0u8; 3];
    assert!(matches!(
        algo.decompress_one(0, &mut out),
        Err(Error::Overrun(_))
    ));
    let mut out = [0u8; 4];
    assert!(matches!(algo.decompress_all(&mut out), Err(Error::Overrun(_))));
}

#[test]
fn test_block_lifecycle() {
    let arena = ByteArena::from_rows(["x"]);
    let mut algo = BlockRandomAccess::new(AlgorithmType::Raw, PassThroughCodec, 4);
    assert!(matches!(
        algo.compressed_size(),
        Err(Error::Usage {
            operation: "compressed_size",
            state: CodecState::Uninitialized
        })
    ));

    compressed(&mut algo, &arena);
    let input = ExperimentInput::with_indices(&arena, vec![], vec![], 4);
    assert!(matches!(algo.initialize(&input), Err(Error::Usage { .. })));

    CompressionAlgorithm::free(&mut algo);
    assert_eq!(algo.cached_block(), None);
    assert!(matches!(
        algo.decompress_all(&mut [0u8; 8]),
        Err(Error::Usage { .. })
    ));
}

#[test]
fn test_zero_rows_per_block_means_one() {
    let algo = BlockRandomAccess::new(AlgorithmType::Raw, PassThroughCodec, 0);
    assert_eq!(algo.rows_per_block(), 1);
}

#[test]
fn test_dictionary_small_output_is_an_overrun() {
    let arena = ByteArena::from_rows(["hello", "hi"]);
    let mut codec = DictionaryCodec::new();
    compressed(&mut codec, &arena);

    let mut out = [0u8; 4];
    match codec.decompress_one(0, &mut out) {
        Err(Error::Overrun(message)) => assert!(message.contains("buffer holds 4"), "{message}"),
        other => panic!("expected overrun, got {other:?}"),
    }
    assert_eq!(codec.decompress_one(1, &mut out).unwrap(), 2);
    assert!(matches!(codec.decompress_all(&mut out), Err(Error::Overrun(_))));
}

#[test]
fn test_passthrough_small_output_fails() {
    let mut out = [0u8; 2];
    let err = PassThroughCodec.compress_block(b"abc", &mut out).unwrap_err();
    assert!(err.to_string().contains("2 < 3"), "{err}");
}

#[test]
fn test_zstd_default_level_follows_config() {
    assert_eq!(ZstdCodec::default().level, DEFAULT_ZSTD_LEVEL);
}

// ── fsst ──────────────────────────────────────────────────────────────────

#[test]
fn test_fsst_reports_symbol_table_as_dictionary() {
    let rows = url_rows(2_000, 3);
    let arena = ByteArena::from_rows(&rows);
    let mut codec = FsstCodec::new();
    assert_eq!(codec.symbol_count(), 0);
    compressed(&mut codec, &arena);

    let symbols = codec.symbol_count();
    assert!(symbols > 0 && symbols <= 255, "{symbols} symbols");

    let size = codec.compressed_size().unwrap();
    let parts = size.parts;
    // Symbol bytes are 1 to 8 bytes each; lengths are one byte each plus
    // the table header.
    assert!(parts.size_dictionary_strings >= symbols);
    assert!(parts.size_dictionary_strings <= symbols * 8);
    assert_eq!(parts.size_dictionary_lengths, 8 + symbols);
    assert!(parts.size_data_codes > 0);
    assert!(parts.size_data_codes < arena.total_bytes());
    assert_eq!(size.compressed_size, parts.size_dictionary + parts.size_data);
}

#[test]
fn test_fsst_empty_rows_and_empty_column() {
    let arena = ByteArena::from_rows(["", "abcabcabc", "", "abc"]);
    let mut codec = FsstCodec::new();
    compressed(&mut codec, &arena);
    assert_eq!(read_row(&mut codec, 0), b"");
    assert_eq!(read_row(&mut codec, 3), b"abc");
    assert_eq!(read_row(&mut codec, 1), b"abcabcabc");
    assert!(matches!(
        codec.decompress_one(4, &mut [0u8; 16]),
        Err(Error::RowOutOfRange { index: 4, len: 4 })
    ));

    let empty = ByteArena::from_rows(["", "", ""]);
    let mut codec = FsstCodec::new();
    compressed(&mut codec, &empty);
    assert_eq!(codec.symbol_count(), 0);
    assert_eq!(read_row(&mut codec, 2), b"");
    let mut out = [0u8; 32];
    codec.decompress_all(&mut out).unwrap();
    let size = codec.compressed_size().unwrap();
    assert_eq!(size.parts.size_dictionary, 0);
    assert_eq!(size.parts.size_data_codes, 0);
}

#[test]
fn test_fsst_lifecycle() {
    let arena = ByteArena::from_rows(["one", "two"]);
    let input = ExperimentInput::with_indices(&arena, vec![], vec![], 2);
    let mut codec = FsstCodec::new();

    assert!(matches!(codec.compressed_size(), Err(Error::Usage { .. })));
    codec.initialize(&input).unwrap();
    assert!(matches!(
        codec.decompress_one(0, &mut [0u8; 8]),
        Err(Error::Usage { .. })
    ));
    codec.compress_all(&arena).unwrap();
    codec.free();
    assert_eq!(codec.state(), CodecState::Freed);
    assert!(matches!(codec.compressed_size(), Err(Error::Usage { .. })));
}

// ── all backends ──────────────────────────────────────────────────────────

#[test]
fn test_every_algorithm_round_trips() {
    let rows = url_rows(3_000, 11);
    let arena = ByteArena::from_rows(&rows);

    for kind in AlgorithmType::ALL {
        let mut algo = algorithm_by_type(kind, 128, 3);
        assert_eq!(algo.algorithm_type(), kind);
        compressed(algo.as_mut(), &arena);

        let mut out = vec![0u8; algo.decompression_buffer_size(arena.total_bytes())];
        algo.decompress_all(&mut out).unwrap();
        assert_eq!(&out[..arena.total_bytes()], arena.data(), "{kind}: full");

        // Descending, repeated and block-crossing indices.
        for index in [2_999, 1_500, 1_500, 129, 128, 127, 0, 7] {
            assert_eq!(
                read_row(algo.as_mut(), index),
                rows[index].as_bytes(),
                "{kind}: row {index}"
            );
        }

        let size = algo.compressed_size().unwrap();
        let parts = size.parts;
        assert_eq!(
            size.compressed_size,
            parts.size_dictionary + parts.size_data,
            "{kind}"
        );
        assert!(size.compressed_size < arena.total_bytes() || kind == AlgorithmType::Raw);

        algo.free();
        assert_eq!(algo.state(), CodecState::Freed);
    }
}

#[test]
fn test_backends_compress_independent_blocks() {
    let raw = url_rows(200, 5).concat().into_bytes();
    let backends: Vec<Box<dyn BlockCodec>> = vec![
        Box::new(PassThroughCodec),
        Box::new(Lz4Codec),
        Box::new(ZstdCodec::default()),
        Box::new(strbench_codecs::DeflateCodec::default()),
    ];

    for codec in backends {
        let mut packed = vec![0u8; codec.compress_bound(raw.len())];
        let n = codec.compress_block(&raw, &mut packed).unwrap();
        let mut out = vec![0u8; raw.len() + 32];
        let m = codec.decompress_block(&packed[..n], &mut out).unwrap();
        assert_eq!(m, raw.len(), "{}", codec.name());
        assert_eq!(&out[..m], &raw[..], "{}", codec.name());
    }
}

#[test]
fn test_non_monotonic_access_matches_ascending() {
    let rows: Vec<String> = (0..12).map(|i| format!("value-{}", i * i)).collect();
    let arena = ByteArena::from_rows(&rows);

    for kind in AlgorithmType::ALL {
        let mut shuffled = algorithm_by_type(kind, 4, 3);
        let mut ascending = algorithm_by_type(kind, 4, 3);
        compressed(shuffled.as_mut(), &arena);
        compressed(ascending.as_mut(), &arena);

        let a: Vec<Vec<u8>> = [5, 2, 5, 9]
            .into_iter()
            .map(|i| read_row(shuffled.as_mut(), i))
            .collect();
        let b: Vec<Vec<u8>> = [2, 5, 9]
            .into_iter()
            .map(|i| read_row(ascending.as_mut(), i))
            .collect();

        assert_eq!(a[0], b[1], "{kind}");
        assert_eq!(a[1], b[0], "{kind}");
        assert_eq!(a[2], b[1], "{kind}");
        assert_eq!(a[3], b[2], "{kind}");
        assert_eq!(a[3], rows[9].as_bytes(), "{kind}");
    }
}
