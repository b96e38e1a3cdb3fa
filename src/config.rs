//! Pipeline settings loaded from JSON, with environment overrides.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::game_log::REQUIRED_COLUMNS;

pub const DEFAULT_MIN_GAMES: usize = 15;
pub const DEFAULT_REST_DAYS: i64 = 5;
pub const DEFAULT_ROUND_DECIMALS: u32 = 5;
/// f64 carries roughly 15 significant decimal digits.
pub const MAX_ROUND_DECIMALS: u32 = 15;

// Shooting splits and counting stats the regression models never read.
// Required input columns stay so the output can be fed back in.
const DEFAULT_DROP_COLUMNS: &[&str] = &[
    "FGM",
    "FGA",
    "FG_PCT",
    "FG3M",
    "FG3A",
    "FG3_PCT",
    "FTM",
    "FTA",
    "FT_PCT",
    "OREB",
    "DREB",
    "REB",
    "AST",
    "TOV",
    "STL",
    "BLK",
    "BLKA",
    "PF",
    "PFD",
    "PLUS_MINUS",
];

/// What to do with a game that does not have exactly two teams when
/// pairing team rest days into `rest_diff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegenerateGamePolicy {
    /// Emit `rest_diff = null` for every row of the game and keep going.
    #[default]
    Null,
    /// Abort the run.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_games: usize,
    pub default_rest_days: i64,
    pub windows: Vec<usize>,
    pub opponent_windows: Vec<usize>,
    pub degenerate_games: DegenerateGamePolicy,
    pub drop_columns: Vec<String>,
    pub round_decimals: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_games: DEFAULT_MIN_GAMES,
            default_rest_days: DEFAULT_REST_DAYS,
            windows: vec![5, 15],
            opponent_windows: vec![3],
            degenerate_games: DegenerateGamePolicy::default(),
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
            round_decimals: Some(DEFAULT_ROUND_DECIMALS),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// `MIN_GAMES` and `DEFAULT_REST_DAYS` win over file values. Unparseable
    /// values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(n) = std::env::var("MIN_GAMES")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .filter(|n| *n >= 1)
        {
            self.min_games = n;
        }
        if let Some(days) = std::env::var("DEFAULT_REST_DAYS")
            .ok()
            .and_then(|val| val.trim().parse::<i64>().ok())
        {
            self.default_rest_days = days;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_games == 0 {
            return Err(PipelineError::InvalidConfig(
                "min_games must be at least 1".to_string(),
            ));
        }
        if self.windows.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "windows must not be empty".to_string(),
            ));
        }
        if self.opponent_windows.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "opponent_windows must not be empty".to_string(),
            ));
        }
        if let Some(w) = self
            .windows
            .iter()
            .chain(self.opponent_windows.iter())
            .find(|w| **w == 0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "window size must be at least 1, got {w}"
            )));
        }
        for (name, sizes) in [
            ("windows", &self.windows),
            ("opponent_windows", &self.opponent_windows),
        ] {
            let mut seen = HashSet::new();
            if let Some(w) = sizes.iter().find(|w| !seen.insert(**w)) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} lists window {w} more than once"
                )));
            }
        }
        if let Some(d) = self.round_decimals.filter(|d| *d > MAX_ROUND_DECIMALS) {
            return Err(PipelineError::InvalidConfig(format!(
                "round_decimals must be at most {MAX_ROUND_DECIMALS}, got {d}"
            )));
        }
        if let Some(col) = self
            .drop_columns
            .iter()
            .find(|c| REQUIRED_COLUMNS.contains(&c.as_str()))
        {
            return Err(PipelineError::InvalidConfig(format!(
                "drop_columns names required column {col}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"min_games": 3, "degenerate_games": "fail"}"#).unwrap();
        assert_eq!(cfg.min_games, 3);
        assert_eq!(cfg.default_rest_days, DEFAULT_REST_DAYS);
        assert_eq!(cfg.windows, vec![5, 15]);
        assert_eq!(cfg.opponent_windows, vec![3]);
        assert_eq!(cfg.degenerate_games, DegenerateGamePolicy::Fail);
        assert!(cfg.drop_columns.iter().any(|c| c == "PLUS_MINUS"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_drop_list_keeps_required_columns() {
        let cfg = PipelineConfig::default();
        for name in REQUIRED_COLUMNS {
            assert!(!cfg.drop_columns.iter().any(|c| c == name), "{name}");
        }

        let cfg = PipelineConfig {
            drop_columns: vec!["REB".to_string(), "GAME_ID".to_string()],
            ..Default::default()
        };
        match cfg.validate() {
            Err(PipelineError::InvalidConfig(msg)) => assert!(msg.contains("GAME_ID")),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_windows_are_rejected() {
        let cfg = PipelineConfig {
            windows: vec![5, 15, 5],
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::InvalidConfig(ref m)) if m.contains("windows lists window 5")
        ));

        let cfg = PipelineConfig {
            opponent_windows: vec![3, 3],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        // The same size in both lists renders distinct columns.
        let cfg = PipelineConfig {
            windows: vec![3, 5],
            opponent_windows: vec![3],
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn round_decimals_is_capped() {
        let cfg = PipelineConfig {
            round_decimals: Some(MAX_ROUND_DECIMALS),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());

        let cfg = PipelineConfig {
            round_decimals: Some(400),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::InvalidConfig(ref m)) if m.contains("round_decimals")
        ));
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        let cfg = PipelineConfig {
            min_games: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));

        let cfg = PipelineConfig {
            opponent_windows: vec![3, 0],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = PipelineConfig {
            windows: Vec::new(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
