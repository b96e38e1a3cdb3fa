//! Typed per-game player records parsed out of a raw table.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{PipelineError, Result};
use crate::table::Table;

pub const PLAYER_ID: &str = "PLAYER_ID";
pub const PLAYER_NAME: &str = "PLAYER_NAME";
pub const TEAM_CODE: &str = "TEAM_ABBREVIATION";
pub const GAME_ID: &str = "GAME_ID";
pub const GAME_DATE: &str = "GAME_DATE";
pub const MATCHUP: &str = "MATCHUP";
pub const SEASON_YEAR: &str = "SEASON_YEAR";
pub const POINTS: &str = "PTS";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    PLAYER_ID,
    TEAM_CODE,
    GAME_ID,
    GAME_DATE,
    MATCHUP,
    POINTS,
    SEASON_YEAR,
];

pub const DAYS_SINCE_LAST_GAME: &str = "days_since_last_game";
pub const TEAM_REST_DAYS: &str = "team_rest_days";
pub const REST_DIFF: &str = "rest_diff";
pub const HOME_AWAY: &str = "HOME_AWAY";
pub const OPP: &str = "OPP";
pub const OPP_DEF_RATING: &str = "OPP_DEF_RATING";
pub const OPP_PACE: &str = "OPP_PACE";

const FIXED_DERIVED: [&str; 7] = [
    DAYS_SINCE_LAST_GAME,
    TEAM_REST_DAYS,
    REST_DIFF,
    HOME_AWAY,
    OPP,
    OPP_DEF_RATING,
    OPP_PACE,
];

pub fn avg_prev_column(window: usize) -> String {
    format!("avg_prev_{window}")
}

pub fn avg_prev_opp_column(window: usize) -> String {
    format!("avg_prev_opp_{window}")
}

/// Columns the pipeline writes. They are ignored on read so that a processed
/// table can be fed back in.
pub fn is_derived_column(name: &str) -> bool {
    if FIXED_DERIVED.contains(&name) {
        return true;
    }
    let suffix = name
        .strip_prefix("avg_prev_opp_")
        .or_else(|| name.strip_prefix("avg_prev_"));
    suffix.is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub player_id: u64,
    pub player_name: Option<String>,
    pub team_code: String,
    pub game_id: String,
    pub game_date: NaiveDate,
    pub matchup: String,
    pub season_year: String,
    pub points: Option<f64>,
    /// Raw input cells, aligned with [`GameLog::columns`].
    pub cells: Vec<Option<String>>,
}

/// Parsed records plus the input column layout their raw cells follow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameLog {
    pub columns: Vec<String>,
    pub records: Vec<GameRecord>,
}

impl GameLog {
    /// Fails on the first missing column or malformed row; no partial output.
    pub fn from_table(table: &Table) -> Result<Self> {
        for name in REQUIRED_COLUMNS {
            table.require_column(name)?;
        }

        let keep: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !is_derived_column(name))
            .map(|(idx, _)| idx)
            .collect();
        let columns: Vec<String> = keep.iter().map(|idx| table.columns[*idx].clone()).collect();

        let col = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };
        let player_idx = col(PLAYER_ID)?;
        let team_idx = col(TEAM_CODE)?;
        let game_idx = col(GAME_ID)?;
        let date_idx = col(GAME_DATE)?;
        let matchup_idx = col(MATCHUP)?;
        let season_idx = col(SEASON_YEAR)?;
        let points_idx = col(POINTS)?;
        let name_idx = col(PLAYER_NAME).ok();

        let mut records = Vec::with_capacity(table.len());
        for (row_idx, raw) in table.rows.iter().enumerate() {
            let cells: Vec<Option<String>> = keep
                .iter()
                .map(|idx| raw.get(*idx).cloned().flatten())
                .collect();
            let text = |idx: usize| cells[idx].as_deref().unwrap_or("").trim();

            let player_raw = text(player_idx);
            let player_id = parse_player_id(player_raw).ok_or_else(|| {
                PipelineError::InvalidField {
                    row: row_idx,
                    column: PLAYER_ID.to_string(),
                    value: player_raw.to_string(),
                }
            })?;

            let date_raw = text(date_idx);
            let game_date =
                parse_game_date(date_raw).ok_or_else(|| PipelineError::UnparseableDate {
                    row: row_idx,
                    value: date_raw.to_string(),
                })?;

            let matchup = text(matchup_idx);
            if matchup.is_empty() {
                return Err(PipelineError::EmptyMatchup { row: row_idx });
            }

            let points_raw = text(points_idx);
            let points = if points_raw.is_empty() {
                None
            } else {
                let value = points_raw.parse::<f64>().ok().filter(|v| !v.is_nan());
                Some(value.ok_or_else(|| PipelineError::InvalidField {
                    row: row_idx,
                    column: POINTS.to_string(),
                    value: points_raw.to_string(),
                })?)
            };

            records.push(GameRecord {
                player_id,
                player_name: name_idx
                    .map(text)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                team_code: text(team_idx).to_string(),
                game_id: text(game_idx).to_string(),
                game_date,
                matchup: matchup.to_string(),
                season_year: text(season_idx).to_string(),
                points,
                cells,
            });
        }

        Ok(Self { columns, records })
    }
}

// Pandas round-trips integer ids as "1628932.0".
fn parse_player_id(raw: &str) -> Option<u64> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }
    let whole = raw.strip_suffix(".0")?;
    whole.parse::<u64>().ok()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accepts the stats service's `2024-05-14T00:00:00`, plain ISO dates, the
/// legacy `MAY 14, 2024` form and `05/14/2024`.
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}
