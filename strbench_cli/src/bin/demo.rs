//! strbench demo
//!
//! Generates one row group of a synthetic web access log, split into five
//! string columns with very different shapes (few distinct values, long
//! repetitive strings, near-unique paths), and runs every bundled codec on
//! each column through the same driver the `strbench` CLI uses.

use std::time::Instant;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use strbench_codecs::BundledCodecs;
use strbench_core::config::ROW_GROUP_SIZE;
use strbench_core::{run_column, BenchmarkConfig, ByteArena, ColumnChunk, ErrorMode, ExperimentResult};

// ── constants ──────────────────────────────────────────────────────────────

const SEED: u64 = 42;

// 10 options → heavy repetition
const IPS: &[&str] = &[
    "203.0.113.42", "198.51.100.77", "192.0.2.15", "10.10.10.88",
    "172.16.254.1", "203.0.113.99", "198.51.100.3", "192.0.2.200",
    "10.20.30.40",  "172.31.0.5",
];
const METHODS: &[&str] = &["GET", "GET", "GET", "POST", "PUT", "DELETE", "GET", "GET"];
const PATHS: &[&str] = &[
    "/api/v1/catalog/items",
    "/api/v1/catalog/items?category=electronics&page={page}&limit=20",
    "/api/v1/orders/{id}/status",
    "/api/v1/users/{id}/profile",
    "/api/v1/cart/items",
    "/api/v1/search?q=laptop&page={page}",
    "/api/v1/recommendations?user={id}",
    "/static/assets/bundle.js",
    "/api/v1/inventory/sku/{id}",
    "/health",
];
const STATUSES: &[&str] = &["200", "200", "200", "201", "304", "400", "404", "500"];
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 18_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "PostmanRuntime/7.43.0",
    "python-httpx/0.28.1",
    "Go-http-client/2.0",
];

// ── data generator ──────────────────────────────────────────────────────────

fn pick<'s, R: Rng>(rng: &mut R, options: &[&'s str]) -> &'s str {
    options[rng.random_range(0..options.len())]
}

/// One row group of access-log columns. About 2% of user agents are NULL.
fn generate_columns(rows: usize, rng: &mut StdRng) -> Vec<(&'static str, ByteArena)> {
    let mut ip = ByteArena::with_capacity(rows * 14, rows);
    let mut method = ByteArena::with_capacity(rows * 4, rows);
    let mut path = ByteArena::with_capacity(rows * 40, rows);
    let mut status = ByteArena::with_capacity(rows * 3, rows);
    let mut agent = ByteArena::with_capacity(rows * 100, rows);

    for _ in 0..rows {
        ip.push(pick(rng, IPS).as_bytes());
        method.push(pick(rng, METHODS).as_bytes());
        let p = pick(rng, PATHS)
            .replace("{page}", &rng.random_range(1..=200u32).to_string())
            .replace("{id}", &rng.random_range(0..9_999_999u32).to_string());
        path.push(p.as_bytes());
        status.push(pick(rng, STATUSES).as_bytes());
        if rng.random_range(0..50) != 0 {
            agent.push(pick(rng, USER_AGENTS).as_bytes());
        }
    }

    vec![
        ("client_ip", ip),
        ("method", method),
        ("path", path),
        ("status", status),
        ("user_agent", agent),
    ]
}

// ── formatting ──────────────────────────────────────────────────────────────

fn section(title: &str) {
    println!("━━━ {title} {}", "━".repeat(70usize.saturating_sub(title.len() + 5)));
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 { out.push(','); }
        out.push(c);
    }
    out.chars().rev().collect()
}

fn human_bytes(n: u64) -> String {
    const U: &[&str] = &["B", "KB", "MB", "GB"];
    let mut v = n as f64;
    let mut u = 0;
    while v >= 1024.0 && u < U.len() - 1 { v /= 1024.0; u += 1; }
    if u == 0 { format!("{n} B") } else { format!("{v:.2} {}", U[u]) }
}

fn print_experiment(exp: &ExperimentResult) {
    println!(
        "  {} rows, {} non-empty, {} raw",
        format_number(exp.n_rows as u64),
        format_number(exp.n_rows_not_empty as u64),
        human_bytes(exp.uncompressed_size as u64)
    );
    println!(
        "  {:<11} {:>11}  {:>7}  {:>10}  {:>10}  {:>10}  {:>10}",
        "Codec", "Compressed", "Ratio", "Compress", "Full", "Random", "Vector"
    );
    println!("  {}", "─".repeat(80));
    for r in &exp.results {
        println!(
            "  {:<11} {:>11}  {:>6.2}x  {:>7.2} ms  {:>7.2} ms  {:>7.2} ms  {:>7.2} ms{}",
            r.algorithm.name(),
            human_bytes(r.size.compressed_size as u64),
            r.size.ratio(exp.uncompressed_size),
            r.compression_time_ms,
            r.decompression_time_ms_full,
            r.decompression_time_ms_random,
            r.decompression_time_ms_vector,
            if r.has_error { "  ⚠ MISMATCH" } else { "" }
        );
    }
    println!();
}

// ── demo runner ─────────────────────────────────────────────────────────────

fn run() -> Result<()> {
    // Verification failures are reported through the log; keep it quiet otherwise.
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "warn".to_string())
        .parse()
        .unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║       strbench  ·  string-column compression benchmark demo      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = BenchmarkConfig {
        n_repeats: 3,
        error_mode: ErrorMode::Log,
        seed: Some(SEED),
        ..Default::default()
    };
    config.validate()?;
    let registry = BundledCodecs::from_config(&config);
    let mut rng = config.rng();

    section("0 · DATA GENERATION");
    let t0 = Instant::now();
    let mut data_rng = StdRng::seed_from_u64(SEED);
    let columns = generate_columns(ROW_GROUP_SIZE, &mut data_rng);
    println!(
        "  {} rows × {} columns in {:.1} ms",
        format_number(ROW_GROUP_SIZE as u64),
        columns.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    println!(
        "  random access: {} rows, {} vectors of {} rows",
        format_number(config.random_rows as u64),
        config.random_vectors,
        config.vector_size
    );
    println!();

    let mut failed = 0;
    for (idx, (name, arena)) in columns.into_iter().enumerate() {
        section(&format!("{} · {}", idx + 1, name.to_uppercase()));
        let chunk = ColumnChunk {
            table: "access_log".to_string(),
            column: name.to_string(),
            row_group: 0,
            n_rows: ROW_GROUP_SIZE,
            arena,
        };
        let exp = run_column(&chunk, &config, &registry, &mut rng)?;
        if exp.has_errors() {
            failed += 1;
        }
        print_experiment(&exp);
    }

    section("SUMMARY");
    if failed == 0 {
        println!("  ✓ every codec reproduced every column byte for byte");
    } else {
        println!("  ⚠ {failed} column(s) had verification failures (see the errors above)");
    }
    println!();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
