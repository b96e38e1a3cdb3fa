//! Eligibility filter, temporal features and context enrichment, run in
//! that order over a fully materialized game log.

use tracing::{debug, info};

use crate::config::{MAX_ROUND_DECIMALS, PipelineConfig};
use crate::context::{ContextEnricher, GameContext, HomeAway, LookupMisses};
use crate::eligibility::retain_eligible;
use crate::error::Result;
use crate::game_log::{self, GameLog, GameRecord};
use crate::lookup::ContextTables;
use crate::rest::{TeamRest, pair_team_rest, player_rest_days, team_games};
use crate::rolling::{avg_prev, avg_prev_vs_opponent};
use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub days_since_last_game: i64,
    pub team_rest_days: i64,
    pub rest_diff: Option<i64>,
    /// `(window, mean)` per configured general window, in config order.
    pub avg_prev: Vec<(usize, Option<f64>)>,
    /// `(window, mean)` per configured opponent window, in config order.
    pub avg_prev_opp: Vec<(usize, Option<f64>)>,
    pub home_away: HomeAway,
    pub opp_code: String,
    pub opp_def_rating: Option<f64>,
    pub opp_pace: Option<f64>,
}

impl DerivedFeatures {
    /// `None` both for "no prior games" and for a window that was not
    /// configured.
    pub fn avg_prev(&self, window: usize) -> Option<f64> {
        lookup_window(&self.avg_prev, window)
    }

    pub fn avg_prev_opp(&self, window: usize) -> Option<f64> {
        lookup_window(&self.avg_prev_opp, window)
    }
}

fn lookup_window(values: &[(usize, Option<f64>)], window: usize) -> Option<f64> {
    values
        .iter()
        .find(|(w, _)| *w == window)
        .and_then(|(_, v)| *v)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub record: GameRecord,
    pub features: DerivedFeatures,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub players_retained: usize,
    pub players_dropped: usize,
    pub team_games: usize,
    pub degenerate_games: usize,
    pub lookup_misses: LookupMisses,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Input columns the rows' raw cells follow.
    pub columns: Vec<String>,
    pub windows: Vec<usize>,
    pub opponent_windows: Vec<usize>,
    pub rows: Vec<FeatureRow>,
    pub report: PipelineReport,
}

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub drop_columns: Vec<String>,
    pub round_decimals: Option<u32>,
}

impl From<&PipelineConfig> for OutputOptions {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            drop_columns: cfg.drop_columns.clone(),
            round_decimals: cfg.round_decimals,
        }
    }
}

pub struct FeaturePipeline {
    config: PipelineConfig,
    tables: ContextTables,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig, tables: ContextTables) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tables })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_table(&self, table: &Table) -> Result<PipelineOutput> {
        self.run(GameLog::from_table(table)?)
    }

    pub fn run(&self, log: GameLog) -> Result<PipelineOutput> {
        let cfg = &self.config;
        let GameLog { columns, records } = log;
        let input_rows = records.len();

        let (mut records, eligibility) = retain_eligible(records, cfg.min_games);
        info!(
            min_games = cfg.min_games,
            players_retained = eligibility.players_retained,
            players_dropped = eligibility.players_dropped,
            rows_dropped = eligibility.rows_dropped,
            "eligibility filter done"
        );

        // Nothing windowed may run before this sort.
        records.sort_by(|a, b| {
            a.player_id
                .cmp(&b.player_id)
                .then(a.game_date.cmp(&b.game_date))
        });

        let rest_days = player_rest_days(&records, cfg.default_rest_days);
        let team_games = team_games(&records, cfg.default_rest_days);
        let team_rest = pair_team_rest(&team_games, cfg.degenerate_games)?;

        let mut enricher = ContextEnricher::new(&self.tables);
        let contexts: Vec<GameContext> = records
            .iter()
            .map(|r| enricher.enrich(&r.matchup, &r.season_year))
            .collect();
        let lookup_misses = enricher.misses();
        if lookup_misses.def_rating > 0 || lookup_misses.pace > 0 {
            debug!(
                def_rating = lookup_misses.def_rating,
                pace = lookup_misses.pace,
                "opponent lookups without a table entry"
            );
        }

        let opp_codes: Vec<String> = contexts.iter().map(|c| c.opp_code.clone()).collect();
        let general: Vec<(usize, Vec<Option<f64>>)> = cfg
            .windows
            .iter()
            .map(|w| (*w, avg_prev(&records, *w)))
            .collect();
        let by_opponent: Vec<(usize, Vec<Option<f64>>)> = cfg
            .opponent_windows
            .iter()
            .map(|w| (*w, avg_prev_vs_opponent(&records, &opp_codes, *w)))
            .collect();

        let mut rows = Vec::with_capacity(records.len());
        for (idx, (record, ctx)) in records.into_iter().zip(contexts).enumerate() {
            let TeamRest {
                rest_days: team_rest_days,
                rest_diff,
            } = team_rest
                .get(&record.game_id, &record.team_code)
                .unwrap_or(TeamRest {
                    rest_days: cfg.default_rest_days,
                    rest_diff: None,
                });
            let features = DerivedFeatures {
                days_since_last_game: rest_days[idx],
                team_rest_days,
                rest_diff,
                avg_prev: general.iter().map(|(w, v)| (*w, v[idx])).collect(),
                avg_prev_opp: by_opponent.iter().map(|(w, v)| (*w, v[idx])).collect(),
                home_away: ctx.home_away,
                opp_code: ctx.opp_code,
                opp_def_rating: ctx.opp_def_rating,
                opp_pace: ctx.opp_pace,
            };
            rows.push(FeatureRow { record, features });
        }

        let report = PipelineReport {
            input_rows,
            output_rows: rows.len(),
            players_retained: eligibility.players_retained,
            players_dropped: eligibility.players_dropped,
            team_games: team_rest.len(),
            degenerate_games: team_rest.degenerate_games,
            lookup_misses,
        };
        info!(
            rows = report.output_rows,
            team_games = report.team_games,
            degenerate_games = report.degenerate_games,
            "feature pipeline done"
        );

        Ok(PipelineOutput {
            columns,
            windows: cfg.windows.clone(),
            opponent_windows: cfg.opponent_windows.clone(),
            rows,
            report,
        })
    }
}

impl PipelineOutput {
    pub fn derived_columns(&self) -> Vec<String> {
        let mut out = vec![
            game_log::DAYS_SINCE_LAST_GAME.to_string(),
            game_log::TEAM_REST_DAYS.to_string(),
            game_log::REST_DIFF.to_string(),
        ];
        out.extend(self.windows.iter().map(|w| game_log::avg_prev_column(*w)));
        out.extend([
            game_log::HOME_AWAY.to_string(),
            game_log::OPP.to_string(),
            game_log::OPP_DEF_RATING.to_string(),
        ]);
        out.extend(
            self.opponent_windows
                .iter()
                .map(|w| game_log::avg_prev_opp_column(*w)),
        );
        out.push(game_log::OPP_PACE.to_string());
        out
    }

    /// Input columns followed by the derived ones, minus `drop_columns`
    /// (unknown names are ignored), with numeric cells rounded. Required
    /// input columns are never dropped, so the result can be run again.
    pub fn to_table(&self, opts: &OutputOptions) -> Table {
        let all_columns: Vec<String> = self
            .columns
            .iter()
            .cloned()
            .chain(self.derived_columns())
            .collect();
        let keep: Vec<bool> = all_columns
            .iter()
            .map(|c| {
                game_log::REQUIRED_COLUMNS.contains(&c.as_str())
                    || !opts.drop_columns.iter().any(|d| d == c)
            })
            .collect();

        let mut table = Table::new(
            all_columns
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(c, _)| c.clone()),
        );

        for row in &self.rows {
            let f = &row.features;
            let fmt_f64 = |v: Option<f64>| v.map(|x| format_float(x, opts.round_decimals));

            let mut cells: Vec<Option<String>> = row
                .record
                .cells
                .iter()
                .map(|c| {
                    c.as_deref()
                        .map(|raw| round_numeric_text(raw, opts.round_decimals))
                })
                .collect();
            cells.push(Some(f.days_since_last_game.to_string()));
            cells.push(Some(f.team_rest_days.to_string()));
            cells.push(f.rest_diff.map(|d| d.to_string()));
            cells.extend(self.windows.iter().map(|w| fmt_f64(f.avg_prev(*w))));
            cells.push(Some(f.home_away.to_string()));
            cells.push(Some(f.opp_code.clone()));
            cells.push(fmt_f64(f.opp_def_rating));
            cells.extend(
                self.opponent_windows
                    .iter()
                    .map(|w| fmt_f64(f.avg_prev_opp(*w))),
            );
            cells.push(fmt_f64(f.opp_pace));

            table.push_row(
                cells
                    .into_iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(c, _)| c)
                    .collect(),
            );
        }
        table
    }
}

fn round_to(x: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals.min(MAX_ROUND_DECIMALS) as i32);
    (x * scale).round() / scale
}

fn format_float(x: f64, decimals: Option<u32>) -> String {
    match decimals {
        Some(d) => round_to(x, d).to_string(),
        None => x.to_string(),
    }
}

// Integers and text pass through untouched; only decimal numbers are rounded.
fn round_numeric_text(raw: &str, decimals: Option<u32>) -> String {
    let Some(d) = decimals else {
        return raw.to_string();
    };
    let looks_decimal = raw.contains(['.', 'e', 'E']);
    match raw.trim().parse::<f64>() {
        Ok(x) if looks_decimal && x.is_finite() => round_to(x, d).to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_only_touches_decimals() {
        assert_eq!(round_numeric_text("0.3333333", Some(5)), "0.33333");
        assert_eq!(round_numeric_text("1022400001", Some(5)), "1022400001");
        assert_eq!(round_numeric_text("LAS vs. NYL", Some(5)), "LAS vs. NYL");
        assert_eq!(round_numeric_text("0.3333333", None), "0.3333333");
        assert_eq!(format_float(15.0, Some(5)), "15");
        assert_eq!(format_float(2.0 / 3.0, Some(2)), "0.67");
        assert_eq!(format_float(0.5, Some(400)), "0.5");
        assert_eq!(round_numeric_text("34.5", Some(u32::MAX)), "34.5");
    }

    #[test]
    fn zero_min_games_is_rejected_up_front() {
        let cfg = PipelineConfig {
            min_games: 0,
            ..Default::default()
        };
        assert!(FeaturePipeline::new(cfg, ContextTables::default()).is_err());
    }
}
