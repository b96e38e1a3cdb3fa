//! Trailing scoring averages over prior games only.
//!
//! Every function here expects records already sorted by
//! `(player_id, game_date)`; windows reset at each player boundary.

use std::collections::{HashMap, VecDeque};

use crate::game_log::GameRecord;

/// Mean of the last `window` pushed values. Missing values occupy a slot but
/// are left out of the mean.
#[derive(Debug, Clone)]
pub struct TrailingMean {
    window: usize,
    values: VecDeque<Option<f64>>,
}

impl TrailingMean {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn mean(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut n = 0usize;
        for v in self.values.iter().flatten() {
            sum += v;
            n += 1;
        }
        if n == 0 { None } else { Some(sum / n as f64) }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// `avg_prev_{window}`: mean points over the player's previous `window`
/// games, excluding the current one.
pub fn avg_prev(records: &[GameRecord], window: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(records.len());
    let mut buf = TrailingMean::new(window);
    let mut current: Option<u64> = None;

    for r in records {
        if current != Some(r.player_id) {
            buf.clear();
            current = Some(r.player_id);
        }
        out.push(buf.mean());
        buf.push(r.points);
    }
    out
}

/// `avg_prev_opp_{window}`: same as [`avg_prev`] but only over the player's
/// earlier games against `opp_codes[i]`.
pub fn avg_prev_vs_opponent(
    records: &[GameRecord],
    opp_codes: &[String],
    window: usize,
) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(records.len());
    let mut by_opp: HashMap<&str, TrailingMean> = HashMap::new();
    let mut current: Option<u64> = None;

    for (r, opp) in records.iter().zip(opp_codes) {
        if current != Some(r.player_id) {
            by_opp.clear();
            current = Some(r.player_id);
        }
        let buf = by_opp
            .entry(opp.as_str())
            .or_insert_with(|| TrailingMean::new(window));
        out.push(buf.mean());
        buf.push(r.points);
    }
    out
}
