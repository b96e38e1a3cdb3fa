//! Rest days at player and team granularity, and the same-game rest
//! differential between the two teams.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::warn;

use crate::config::DegenerateGamePolicy;
use crate::error::{PipelineError, Result};
use crate::game_log::GameRecord;

/// Days since the player's previous row; `default_days` for a player's first
/// row. Expects records sorted by `(player_id, game_date)`.
pub fn player_rest_days(records: &[GameRecord], default_days: i64) -> Vec<i64> {
    let mut out = Vec::with_capacity(records.len());
    let mut prev: Option<(u64, NaiveDate)> = None;
    for r in records {
        let days = match prev {
            Some((player, date)) if player == r.player_id => (r.game_date - date).num_days(),
            _ => default_days,
        };
        out.push(days);
        prev = Some((r.player_id, r.game_date));
    }
    out
}

/// One appearance of a team in a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamGame {
    pub game_id: String,
    pub team_code: String,
    pub game_date: NaiveDate,
    pub rest_days: i64,
}

/// Collapses player rows to one row per `(game_id, team_code)`, dated by the
/// first row seen for the pair, then computes each team's gap to its previous
/// game. Output is ordered by team, then date.
pub fn team_games(records: &[GameRecord], default_days: i64) -> Vec<TeamGame> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut games: Vec<TeamGame> = Vec::new();
    for r in records {
        if seen.insert((r.game_id.as_str(), r.team_code.as_str())) {
            games.push(TeamGame {
                game_id: r.game_id.clone(),
                team_code: r.team_code.clone(),
                game_date: r.game_date,
                rest_days: default_days,
            });
        }
    }

    games.sort_by(|a, b| {
        a.team_code
            .cmp(&b.team_code)
            .then(a.game_date.cmp(&b.game_date))
            .then(a.game_id.cmp(&b.game_id))
    });

    for idx in 1..games.len() {
        if games[idx].team_code == games[idx - 1].team_code {
            games[idx].rest_days = (games[idx].game_date - games[idx - 1].game_date).num_days();
        }
    }
    games
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamRest {
    pub rest_days: i64,
    /// `None` when the game did not pair exactly two teams.
    pub rest_diff: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamRestTable {
    by_key: HashMap<(String, String), TeamRest>,
    pub degenerate_games: usize,
}

impl TeamRestTable {
    pub fn get(&self, game_id: &str, team_code: &str) -> Option<TeamRest> {
        self.by_key
            .get(&(game_id.to_string(), team_code.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Pairs the two teams of every game: `rest_diff = own - opponent`.
pub fn pair_team_rest(
    games: &[TeamGame],
    policy: DegenerateGamePolicy,
) -> Result<TeamRestTable> {
    let mut by_game: BTreeMap<&str, Vec<&TeamGame>> = BTreeMap::new();
    for g in games {
        by_game.entry(g.game_id.as_str()).or_default().push(g);
    }

    let mut table = TeamRestTable::default();
    for (game_id, sides) in by_game {
        let diffs: Vec<Option<i64>> = match sides.as_slice() {
            [a, b] => vec![
                Some(a.rest_days - b.rest_days),
                Some(b.rest_days - a.rest_days),
            ],
            _ => {
                let mut teams: Vec<String> = sides.iter().map(|g| g.team_code.clone()).collect();
                teams.sort();
                if policy == DegenerateGamePolicy::Fail {
                    return Err(PipelineError::DegenerateGameGrouping {
                        game_id: game_id.to_string(),
                        teams,
                    });
                }
                warn!(
                    game_id,
                    teams = %teams.join(","),
                    "game does not pair exactly two teams; rest_diff left empty"
                );
                table.degenerate_games += 1;
                vec![None; sides.len()]
            }
        };

        for (g, rest_diff) in sides.iter().zip(diffs) {
            table.by_key.insert(
                (g.game_id.clone(), g.team_code.clone()),
                TeamRest {
                    rest_days: g.rest_days,
                    rest_diff,
                },
            );
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(player_id: u64, team: &str, game_id: &str, month: u32, day: u32) -> GameRecord {
        GameRecord {
            player_id,
            player_name: None,
            team_code: team.to_string(),
            game_id: game_id.to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
            matchup: String::new(),
            season_year: "2024".to_string(),
            points: None,
            cells: Vec::new(),
        }
    }

    #[test]
    fn player_rest_defaults_on_first_game() {
        let records = vec![
            rec(1, "LAS", "g1", 5, 1),
            rec(1, "LAS", "g2", 5, 4),
            rec(1, "LAS", "g3", 5, 10),
            rec(2, "NYL", "g1", 5, 1),
            rec(2, "NYL", "g4", 5, 1),
        ];
        assert_eq!(player_rest_days(&records, 5), vec![5, 3, 6, 5, 0]);
    }

    #[test]
    fn team_rest_collapses_players_and_diffs_are_antisymmetric() {
        // LAS plays g1 (May 1) and g2 (May 4); NYL plays g1 and g3 (May 3).
        // g2 is LAS vs SEA, SEA's first game.
        let records = vec![
            rec(1, "LAS", "g1", 5, 1),
            rec(1, "LAS", "g2", 5, 4),
            rec(2, "LAS", "g1", 5, 1),
            rec(2, "LAS", "g2", 5, 4),
            rec(3, "NYL", "g1", 5, 1),
            rec(3, "NYL", "g3", 5, 3),
            rec(4, "SEA", "g2", 5, 4),
            rec(5, "CON", "g3", 5, 3),
        ];
        let games = team_games(&records, 5);
        assert_eq!(games.len(), 6);

        let table = pair_team_rest(&games, DegenerateGamePolicy::Fail).unwrap();
        assert_eq!(table.degenerate_games, 0);

        let las_g2 = table.get("g2", "LAS").unwrap();
        let sea_g2 = table.get("g2", "SEA").unwrap();
        assert_eq!(las_g2.rest_days, 3);
        assert_eq!(sea_g2.rest_days, 5);
        assert_eq!(las_g2.rest_diff, Some(-2));
        assert_eq!(sea_g2.rest_diff, Some(2));

        let nyl_g3 = table.get("g3", "NYL").unwrap();
        assert_eq!(nyl_g3.rest_days, 2);
        assert_eq!(nyl_g3.rest_diff, Some(-3));
    }

    #[test]
    fn single_team_game_is_flagged() {
        let records = vec![rec(1, "LAS", "g1", 5, 1), rec(1, "LAS", "g2", 5, 4)];
        let games = team_games(&records, 5);

        let table = pair_team_rest(&games, DegenerateGamePolicy::Null).unwrap();
        assert_eq!(table.degenerate_games, 2);
        let rest = table.get("g2", "LAS").unwrap();
        assert_eq!(rest.rest_days, 3);
        assert_eq!(rest.rest_diff, None);

        let err = pair_team_rest(&games, DegenerateGamePolicy::Fail).unwrap_err();
        match err {
            PipelineError::DegenerateGameGrouping { game_id, teams } => {
                assert_eq!(game_id, "g1");
                assert_eq!(teams, vec!["LAS".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn three_team_game_is_flagged() {
        let records = vec![
            rec(1, "LAS", "g1", 5, 1),
            rec(2, "NYL", "g1", 5, 1),
            rec(3, "SEA", "g1", 5, 1),
        ];
        let games = team_games(&records, 5);
        let table = pair_team_rest(&games, DegenerateGamePolicy::Null).unwrap();
        assert_eq!(table.degenerate_games, 1);
        assert!(table.get("g1", "SEA").unwrap().rest_diff.is_none());
    }
}
