//! Minimum-games filter applied before any feature is derived.

use std::collections::HashMap;

use crate::game_log::GameRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilitySummary {
    pub players_retained: usize,
    pub players_dropped: usize,
    pub rows_dropped: usize,
}

pub fn games_per_player(records: &[GameRecord]) -> HashMap<u64, usize> {
    let mut counts = HashMap::new();
    for r in records {
        *counts.entry(r.player_id).or_insert(0usize) += 1;
    }
    counts
}

/// Keeps every row of players with at least `min_games` rows (inclusive).
/// Row order is preserved.
pub fn retain_eligible(
    records: Vec<GameRecord>,
    min_games: usize,
) -> (Vec<GameRecord>, EligibilitySummary) {
    let counts = games_per_player(&records);
    let before = records.len();
    let kept: Vec<GameRecord> = records
        .into_iter()
        .filter(|r| counts.get(&r.player_id).copied().unwrap_or(0) >= min_games)
        .collect();

    let players_retained = counts.values().filter(|n| **n >= min_games).count();
    let summary = EligibilitySummary {
        players_retained,
        players_dropped: counts.len() - players_retained,
        rows_dropped: before - kept.len(),
    };
    (kept, summary)
}
