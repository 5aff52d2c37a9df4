use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use strbench_codecs::BundledCodecs;
use strbench_core::{
    run_experiment, save_results_csv, AlgorithmType, BenchmarkConfig, CsvTableSource, ErrorMode,
    TableConfig,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "strbench",
    about = "String-column compression benchmark: ratio, full-scan and random-access latency per codec",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark codecs on the string columns of one or more CSV files
    Run {
        /// CSV files with a header row; every column is a string column
        inputs: Vec<PathBuf>,
        /// Results CSV, one row per (column chunk, codec)
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,
        /// JSON config; flags below override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated codecs, e.g. "raw,dictionary,lz4" (default: all)
        #[arg(short, long)]
        algorithms: Option<String>,
        /// Comma-separated column names to measure (default: all)
        #[arg(long)]
        columns: Option<String>,
        /// Measured runs per codec; one warm-up run is added and discarded
        #[arg(short = 'n', long)]
        repeats: Option<usize>,
        /// On verification failure: "throw" aborts, "log" records and continues
        #[arg(short, long)]
        mode: Option<ErrorMode>,
        /// Seed for the random access samples
        #[arg(long)]
        seed: Option<u64>,
        /// Rows compressed together by the block codecs
        #[arg(long)]
        rows_per_block: Option<usize>,
        /// Zstd compression level (1–22)
        #[arg(long)]
        zstd_level: Option<i32>,
        /// Rows per row group when chunking a column
        #[arg(long)]
        row_group_size: Option<usize>,
        /// Measure empty fields as empty strings instead of skipping them as NULL
        #[arg(long)]
        keep_empty: bool,
    },
    /// List the bundled codecs
    Codecs,
    /// Show how a CSV file would be chunked, without compressing anything
    Inspect {
        /// CSV file with a header row
        file: PathBuf,
        /// Rows per row group when chunking a column
        #[arg(long)]
        row_group_size: Option<usize>,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_algorithms(list: &str) -> anyhow::Result<Vec<AlgorithmType>> {
    split_list(list)
        .map(|name| {
            name.parse::<AlgorithmType>()
                .with_context(|| format!("valid codecs: {}", codec_names()))
        })
        .collect()
}

fn codec_names() -> String {
    AlgorithmType::ALL
        .iter()
        .map(|a| a.name().to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(kind: AlgorithmType) -> &'static str {
    match kind {
        AlgorithmType::Raw => "rows stored verbatim in blocks; baseline",
        AlgorithmType::Dictionary => "one code per row into a dictionary of distinct values",
        AlgorithmType::Lz4 => "LZ4 blocks behind a one-block decompression cache",
        AlgorithmType::Zstd => "zstd blocks behind a one-block decompression cache",
        AlgorithmType::Deflate => "raw DEFLATE blocks behind a one-block decompression cache",
        AlgorithmType::Fsst => "each row FSST-encoded against one column-wide symbol table",
    }
}

fn init_logging() -> anyhow::Result<()> {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// ── Subcommand implementations ─────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run_benchmark(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config_path: Option<PathBuf>,
    algorithms: Option<String>,
    columns: Option<String>,
    repeats: Option<usize>,
    mode: Option<ErrorMode>,
    seed: Option<u64>,
    rows_per_block: Option<usize>,
    zstd_level: Option<i32>,
    row_group_size: Option<usize>,
    keep_empty: bool,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => BenchmarkConfig::from_json_file(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => BenchmarkConfig::default(),
    };

    if let Some(list) = algorithms {
        config.algorithms = parse_algorithms(&list)?;
    }
    if let Some(n) = repeats {
        config.n_repeats = n;
    }
    if let Some(mode) = mode {
        config.error_mode = mode;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(rows) = rows_per_block {
        config.rows_per_block = rows;
    }
    if let Some(level) = zstd_level {
        config.zstd_level = level;
    }
    if let Some(size) = row_group_size {
        config.row_group_size = size;
        config.min_rows = size / 2;
        config.min_non_empty_rows = size / 4;
    }

    let wanted: Vec<String> = columns
        .as_deref()
        .map(|list| split_list(list).map(String::from).collect())
        .unwrap_or_default();
    for path in inputs {
        let mut table = TableConfig::new(path);
        table.columns = wanted.clone();
        table.empty_is_null = !keep_empty;
        config.tables.push(table);
    }
    if config.tables.is_empty() {
        anyhow::bail!("no input tables: pass CSV files or list them under \"tables\" in --config");
    }
    config.validate()?;

    let names: Vec<&str> = config.algorithms.iter().map(|a| a.name()).collect();
    info!(
        tables = config.tables.len(),
        algorithms = %names.join(","),
        repeats = config.n_repeats,
        mode = %config.error_mode,
        "starting benchmark"
    );

    let t0 = Instant::now();
    let registry = BundledCodecs::from_config(&config);
    let experiments = run_experiment(&config, &registry)?;
    let elapsed = t0.elapsed();

    let stdout = io::stdout();
    for experiment in &experiments {
        experiment.pretty_print(stdout.lock())?;
    }

    let rows = save_results_csv(&experiments, &output)
        .with_context(|| format!("writing results to {:?}", output))?;
    let failed = experiments.iter().filter(|e| e.has_errors()).count();

    eprintln!("  column chunks : {}", experiments.len());
    eprintln!("  result rows   : {}", rows);
    eprintln!("  with errors   : {}", failed);
    eprintln!("  results       : {:?}", output);
    eprintln!("  elapsed       : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_codecs() {
    println!("  {:<12} {:<12} Description", "Name", "Label");
    println!("  {}", "-".repeat(72));
    for kind in AlgorithmType::ALL {
        println!(
            "  {:<12} {:<12} {}",
            kind.name().to_ascii_lowercase(),
            kind.name(),
            describe(kind)
        );
    }
}

fn run_inspect(file: PathBuf, row_group_size: Option<usize>) -> anyhow::Result<()> {
    let mut config = BenchmarkConfig::default();
    if let Some(size) = row_group_size {
        config.row_group_size = size;
        config.min_rows = size / 2;
        config.min_non_empty_rows = size / 4;
    }
    config.validate()?;

    let table = TableConfig::new(&file);
    let source = CsvTableSource::new(table, &config);
    let chunks = source
        .read_chunks()
        .with_context(|| format!("reading {:?}", file))?;

    println!("=== CSV table: {:?} ===", file);
    println!();
    println!("  table name     : {}", source.table().display_name());
    println!("  row group size : {}", config.row_group_size);
    println!("  min rows       : {}", config.min_rows);
    println!("  min non-empty  : {}", config.min_non_empty_rows);
    println!("  chunks kept    : {}", chunks.len());
    println!();
    println!(
        "  {:<24}  {:>6}  {:>10}  {:>10}  {:>12}  {:>8}",
        "column", "group", "rows", "non-empty", "raw", "avg len"
    );
    println!("  {}", "-".repeat(80));
    for chunk in &chunks {
        let non_empty = chunk.n_rows_not_empty();
        let bytes = chunk.arena.total_bytes();
        let avg = if non_empty == 0 {
            0.0
        } else {
            bytes as f64 / non_empty as f64
        };
        println!(
            "  {:<24}  {:>6}  {:>10}  {:>10}  {:>12}  {:>8.1}",
            chunk.column,
            chunk.row_group,
            chunk.n_rows,
            non_empty,
            human_bytes(bytes as u64),
            avg
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            inputs,
            output,
            config,
            algorithms,
            columns,
            repeats,
            mode,
            seed,
            rows_per_block,
            zstd_level,
            row_group_size,
            keep_empty,
        } => run_benchmark(
            inputs,
            output,
            config,
            algorithms,
            columns,
            repeats,
            mode,
            seed,
            rows_per_block,
            zstd_level,
            row_group_size,
            keep_empty,
        ),
        Commands::Codecs => {
            run_codecs();
            Ok(())
        }
        Commands::Inspect {
            file,
            row_group_size,
        } => run_inspect(file, row_group_size),
    }
}
