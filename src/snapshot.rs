//! Pre-game summary for one player: recent scoring form, form against a
//! given opponent, and rest since the last game.
//!
//! Unlike the pipeline's `avg_prev_*` features these averages include the
//! most recent game, since the game being predicted has not been played yet.

use chrono::NaiveDate;

use crate::context::opponent_code;
use crate::game_log::GameRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub player_name: String,
    pub opponent: String,
    pub games: usize,
    pub last_game_date: NaiveDate,
    pub days_since_last_game: i64,
    /// `(N, mean points over the N most recent games)`.
    pub recent_averages: Vec<(usize, Option<f64>)>,
    /// `(N, mean points over the N most recent games against the opponent)`;
    /// `None` when the player never faced them.
    pub opponent_averages: Vec<(usize, Option<f64>)>,
}

/// `None` when no record carries `player_name` (ASCII case-insensitive).
pub fn player_snapshot(
    records: &[GameRecord],
    player_name: &str,
    opponent: &str,
    today: NaiveDate,
    windows: &[usize],
    opponent_windows: &[usize],
) -> Option<PlayerSnapshot> {
    let wanted = player_name.trim();
    let mut games: Vec<&GameRecord> = records
        .iter()
        .filter(|r| {
            r.player_name
                .as_deref()
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(wanted))
        })
        .collect();
    // Most recent first.
    games.sort_by(|a, b| b.game_date.cmp(&a.game_date));
    let last = games.first()?;

    let opponent = opponent.trim();
    let vs_opp: Vec<&GameRecord> = games
        .iter()
        .copied()
        .filter(|r| opponent_code(&r.matchup).is_some_and(|c| c.eq_ignore_ascii_case(opponent)))
        .collect();

    Some(PlayerSnapshot {
        player_name: last
            .player_name
            .clone()
            .unwrap_or_else(|| wanted.to_string()),
        opponent: opponent.to_string(),
        games: games.len(),
        last_game_date: last.game_date,
        days_since_last_game: (today - last.game_date).num_days(),
        recent_averages: windows
            .iter()
            .map(|n| (*n, mean_points(games.iter().take(*n).copied())))
            .collect(),
        opponent_averages: opponent_windows
            .iter()
            .map(|n| (*n, mean_points(vs_opp.iter().take(*n).copied())))
            .collect(),
    })
}

fn mean_points<'a>(games: impl Iterator<Item = &'a GameRecord>) -> Option<f64> {
    let (sum, n) = games
        .filter_map(|g| g.points)
        .fold((0.0, 0usize), |(s, n), p| (s + p, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(day: u32, matchup: &str, points: Option<f64>) -> GameRecord {
        GameRecord {
            player_id: 1628932,
            player_name: Some("A'ja Wilson".to_string()),
            team_code: "LVA".to_string(),
            game_id: format!("g{day}"),
            game_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            matchup: matchup.to_string(),
            season_year: "2025".to_string(),
            points,
            cells: Vec::new(),
        }
    }

    #[test]
    fn recent_form_and_opponent_form() {
        let records = vec![
            rec(1, "LVA vs. ATL", Some(30.0)),
            rec(3, "LVA @ SEA", Some(10.0)),
            rec(5, "LVA @ ATL", Some(20.0)),
            rec(8, "LVA vs. CHI", None),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let snap = player_snapshot(&records, "a'ja wilson", "ATL", today, &[2, 15], &[3]).unwrap();

        assert_eq!(snap.games, 4);
        assert_eq!(snap.last_game_date, NaiveDate::from_ymd_opt(2025, 6, 8).unwrap());
        assert_eq!(snap.days_since_last_game, 2);
        // Last two games: CHI (missing points) and ATL (20).
        assert_eq!(snap.recent_averages, vec![(2, Some(20.0)), (15, Some(20.0))]);
        assert_eq!(snap.opponent_averages, vec![(3, Some(25.0))]);
    }

    #[test]
    fn unknown_player_or_opponent() {
        let records = vec![rec(1, "LVA vs. ATL", Some(30.0))];
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(player_snapshot(&records, "Nobody", "ATL", today, &[5], &[3]).is_none());

        let snap = player_snapshot(&records, "A'ja Wilson", "NYL", today, &[5], &[3]).unwrap();
        assert_eq!(snap.opponent_averages, vec![(3, None)]);
    }
}
