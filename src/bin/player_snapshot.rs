use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};

use boxscore_features::snapshot::player_snapshot;
use boxscore_features::{GameLog, PipelineConfig, io};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    let input = parse_arg("input")
        .map(PathBuf::from)
        .context("missing --input <csv>")?;
    let player = parse_arg("player").context("missing --player <name>")?;
    let opponent = parse_arg("opp").context("missing --opp <team code>")?;
    let today = match parse_arg("today") {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --today {raw:?}, expected YYYY-MM-DD"))?,
        None => Local::now().date_naive(),
    };

    let mut config = match parse_arg("config") {
        Some(path) => PipelineConfig::load(PathBuf::from(&path).as_path())
            .with_context(|| format!("load config {path}"))?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides();

    let table = io::read_csv(&input).with_context(|| format!("read {}", input.display()))?;
    let log = GameLog::from_table(&table).context("parse game log")?;
    let snap = player_snapshot(
        &log.records,
        &player,
        &opponent,
        today,
        &config.windows,
        &config.opponent_windows,
    )
    .ok_or_else(|| anyhow!("no games found for player: {player}"))?;

    println!();
    println!("Stats for {} vs {}:", snap.player_name, snap.opponent);
    let mut recent = snap.recent_averages.clone();
    recent.sort_by(|a, b| b.0.cmp(&a.0));
    for (n, avg) in recent {
        match avg {
            Some(v) => println!("- Last {n} games avg: {v:.2} PTS"),
            None => println!("- Last {n} games avg: n/a"),
        }
    }
    for (n, avg) in &snap.opponent_averages {
        match avg {
            Some(v) => println!("- Last {n} games vs {}: {v:.2} PTS", snap.opponent),
            None => println!("- No recent games found vs {}", snap.opponent),
        }
    }
    println!(
        "- Days since last game: {} days ({} games on record)",
        snap.days_since_last_game, snap.games
    );
    println!();

    Ok(())
}

fn parse_arg(name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&prefix) {
            if !v.trim().is_empty() {
                return Some(v.trim().to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}
