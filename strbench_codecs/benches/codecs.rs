use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strbench_codecs::algorithm_by_type;
use strbench_core::{AlgorithmType, ByteArena, ExperimentInput};

const ROWS: usize = 16_384;

fn url_column(rows: usize) -> ByteArena {
    let mut rng = StdRng::seed_from_u64(7);
    let hosts = ["example.com", "cdn.example.net", "api.internal", "static.example.org"];
    ByteArena::from_rows((0..rows).map(|_| {
        let host = hosts[rng.random_range(0..hosts.len())];
        format!("https://{}/item/{}?ref={}", host, rng.random_range(0..5_000), rng.random_range(0..20))
    }))
}

fn bench_compress(c: &mut Criterion) {
    let arena = url_column(ROWS);
    let input = ExperimentInput::with_indices(&arena, vec![], vec![], 2048);

    let mut group = c.benchmark_group("compress_all");
    group.throughput(Throughput::Bytes(arena.total_bytes() as u64));
    for kind in AlgorithmType::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            b.iter(|| {
                let mut algo = algorithm_by_type(kind, 2048, 3);
                algo.initialize(&input).unwrap();
                algo.compress_all(black_box(&arena)).unwrap();
                algo.free();
            })
        });
    }
    group.finish();
}

fn bench_random_rows(c: &mut Criterion) {
    let arena = url_column(ROWS);
    let input = ExperimentInput::with_indices(&arena, vec![], vec![], 2048);
    let mut rng = StdRng::seed_from_u64(11);
    let mut rows: Vec<usize> = (0..1_000).map(|_| rng.random_range(0..ROWS)).collect();
    rows.sort_unstable();

    let mut group = c.benchmark_group("decompress_one");
    group.throughput(Throughput::Elements(rows.len() as u64));
    for kind in AlgorithmType::ALL {
        let mut algo = algorithm_by_type(kind, 2048, 3);
        algo.initialize(&input).unwrap();
        algo.compress_all(&arena).unwrap();
        let mut out = vec![0u8; 4096];

        group.bench_function(BenchmarkId::from_parameter(kind), |b| {
            b.iter(|| {
                let mut total = 0;
                for &row in &rows {
                    total += algo.decompress_one(row, &mut out).unwrap();
                }
                black_box(total)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_random_rows);
criterion_main!(benches);
