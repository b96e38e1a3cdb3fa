//! Season-scoped opponent lookups (defensive rating, pace).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `season -> team code -> value`. A missing season or team is a miss, never
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpponentLookup {
    seasons: BTreeMap<String, HashMap<String, f64>>,
}

impl OpponentLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a, I>(season: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut out = Self::new();
        for (team, value) in pairs {
            out.insert(season, team, value);
        }
        out
    }

    pub fn insert(&mut self, season: &str, team: &str, value: f64) {
        self.seasons
            .entry(season.trim().to_string())
            .or_default()
            .insert(team.trim().to_string(), value);
    }

    pub fn get(&self, season: &str, team: &str) -> Option<f64> {
        self.seasons.get(season.trim())?.get(team.trim()).copied()
    }

    pub fn seasons(&self) -> impl Iterator<Item = &str> {
        self.seasons.keys().map(|s| s.as_str())
    }

    pub fn merge(&mut self, other: &OpponentLookup) {
        for (season, teams) in &other.seasons {
            let entry = self.seasons.entry(season.clone()).or_default();
            for (team, value) in teams {
                entry.insert(team.clone(), *value);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextTables {
    #[serde(default)]
    pub def_rating: OpponentLookup,
    #[serde(default)]
    pub pace: OpponentLookup,
}

impl ContextTables {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// WNBA defensive rating and pace (possessions per 40) for 2024 and 2025.
    pub fn wnba() -> Self {
        WNBA_TABLES.clone()
    }
}

static WNBA_TABLES: Lazy<ContextTables> = Lazy::new(|| {
    let mut def_rating = OpponentLookup::from_pairs(
        "2024",
        [
            ("ATL", 99.4),
            ("CHI", 108.3),
            ("CON", 112.2),
            ("DAL", 107.7),
            ("IND", 100.6),
            ("GSV", 98.8),
            ("LVA", 102.8),
            ("LAS", 107.5),
            ("MIN", 94.8),
            ("NYL", 97.7),
            ("PHO", 98.5),
            ("SEA", 98.9),
            ("WSH", 100.1),
        ],
    );
    def_rating.merge(&OpponentLookup::from_pairs(
        "2025",
        [
            ("ATL", 100.1),
            ("CHI", 103.5),
            ("CON", 94.1),
            ("DAL", 111.7),
            ("IND", 107.5),
            ("LVA", 99.6),
            ("LAS", 105.7),
            ("MIN", 94.8),
            ("NYL", 95.3),
            ("PHO", 105.4),
            ("SEA", 96.4),
            ("WSH", 101.7),
        ],
    ));

    let mut pace = OpponentLookup::from_pairs(
        "2024",
        [
            ("ATL", 78.96),
            ("CHI", 79.76),
            ("CON", 77.76),
            ("DAL", 81.71),
            ("IND", 81.28),
            ("LVA", 81.08),
            ("LAS", 80.66),
            ("MIN", 79.02),
            ("NYL", 80.12),
            ("PHO", 79.9),
            ("SEA", 81.09),
            ("WSH", 80.41),
        ],
    );
    pace.merge(&OpponentLookup::from_pairs(
        "2025",
        [
            ("ATL", 78.8),
            ("CHI", 79.82),
            ("CON", 78.87),
            ("DAL", 80.21),
            ("IND", 80.04),
            ("GSV", 78.63),
            ("LVA", 79.98),
            ("LAS", 80.8),
            ("MIN", 78.64),
            ("NYL", 81.65),
            ("PHO", 80.66),
            ("SEA", 79.12),
            ("WSH", 80.04),
        ],
    ));

    ContextTables { def_rating, pace }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wnba_tables_are_season_scoped() {
        let tables = ContextTables::wnba();
        assert_eq!(tables.def_rating.get("2024", "CON"), Some(112.2));
        assert_eq!(tables.def_rating.get("2025", "CON"), Some(94.1));
        assert_eq!(tables.def_rating.get("2025", "GSV"), None);
        assert_eq!(tables.pace.get("2024", "GSV"), None);
        assert_eq!(tables.pace.get("2025", "GSV"), Some(78.63));
        assert_eq!(tables.pace.get("2023", "ATL"), None);
    }

    #[test]
    fn json_shape_is_season_then_team() {
        let raw = r#"{"def_rating": {"2030": {"NYL": 90.5}}}"#;
        let tables: ContextTables = serde_json::from_str(raw).unwrap();
        assert_eq!(tables.def_rating.get("2030", "NYL"), Some(90.5));
        assert_eq!(tables.def_rating.get(" 2030 ", "NYL "), Some(90.5));
        assert!(tables.pace.seasons().next().is_none());
    }
}
