use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use boxscore_features::io;
use boxscore_features::{ContextTables, FeaturePipeline, OutputOptions, PipelineConfig, Table};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let input = parse_path_arg("input")
        .or_else(|| std::env::var("BOXSCORE_INPUT").ok().map(PathBuf::from))
        .context("missing --input (csv file, parquet file or directory of parquet files)")?;
    let out = parse_path_arg("out").unwrap_or_else(|| default_out_path(&input));

    let mut config = match parse_path_arg("config") {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides();

    let tables = match parse_path_arg("tables") {
        Some(path) => ContextTables::load(&path)
            .with_context(|| format!("load lookup tables {}", path.display()))?,
        None => ContextTables::wnba(),
    };

    let table = load_input(&input)?;
    let pipeline = FeaturePipeline::new(config, tables).context("invalid pipeline config")?;
    let output = pipeline
        .run_table(&table)
        .with_context(|| format!("derive features for {}", input.display()))?;
    let rendered = output.to_table(&OutputOptions::from(pipeline.config()));
    io::write_csv(&out, &rendered).with_context(|| format!("write {}", out.display()))?;

    let report = output.report;
    println!("Feature pipeline complete");
    println!("Input: {} ({} rows)", input.display(), report.input_rows);
    println!("Output: {} ({} rows)", out.display(), report.output_rows);
    println!(
        "Players: {} kept, {} below {} games",
        report.players_retained,
        report.players_dropped,
        pipeline.config().min_games
    );
    println!(
        "Team games: {} ({} without exactly two teams)",
        report.team_games, report.degenerate_games
    );
    println!(
        "Lookup misses: def_rating={} pace={}",
        report.lookup_misses.def_rating, report.lookup_misses.pace
    );

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_input(path: &Path) -> Result<Table> {
    if path.is_dir() {
        return io::load_parquet_dir(path)
            .with_context(|| format!("load parquet directory {}", path.display()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("parquet") => {
            io::read_parquet(path).with_context(|| format!("read parquet {}", path.display()))
        }
        Some("csv") => io::read_csv(path).with_context(|| format!("read csv {}", path.display())),
        _ => Err(anyhow!(
            "unsupported input {} (expected .csv, .parquet or a directory)",
            path.display()
        )),
    }
}

fn default_out_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("game_logs");
    input.with_file_name(format!("{stem}_processed.csv"))
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
