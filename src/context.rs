//! Matchup parsing and opponent lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lookup::ContextTables;

const AWAY_MARKER: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeAway::Home => "Home",
            HomeAway::Away => "Away",
        }
    }
}

impl fmt::Display for HomeAway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "LAS @ NYL" is an away game against NYL, "LAS vs. NYL" a home game.
pub fn home_away(matchup: &str) -> HomeAway {
    if matchup.contains(AWAY_MARKER) {
        HomeAway::Away
    } else {
        HomeAway::Home
    }
}

/// Last whitespace-delimited token of the matchup.
pub fn opponent_code(matchup: &str) -> Option<&str> {
    matchup.split_whitespace().next_back()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameContext {
    pub home_away: HomeAway,
    pub opp_code: String,
    pub opp_def_rating: Option<f64>,
    pub opp_pace: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupMisses {
    pub def_rating: usize,
    pub pace: usize,
}

pub struct ContextEnricher<'a> {
    tables: &'a ContextTables,
    misses: LookupMisses,
}

impl<'a> ContextEnricher<'a> {
    pub fn new(tables: &'a ContextTables) -> Self {
        Self {
            tables,
            misses: LookupMisses::default(),
        }
    }

    pub fn enrich(&mut self, matchup: &str, season_year: &str) -> GameContext {
        let opp_code = opponent_code(matchup).unwrap_or_default().to_string();
        let opp_def_rating = self.tables.def_rating.get(season_year, &opp_code);
        let opp_pace = self.tables.pace.get(season_year, &opp_code);
        if opp_def_rating.is_none() {
            self.misses.def_rating += 1;
        }
        if opp_pace.is_none() {
            self.misses.pace += 1;
        }
        GameContext {
            home_away: home_away(matchup),
            opp_code,
            opp_def_rating,
            opp_pace,
        }
    }

    pub fn misses(&self) -> LookupMisses {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::OpponentLookup;

    #[test]
    fn matchup_notation() {
        assert_eq!(home_away("LAS @ NYL"), HomeAway::Away);
        assert_eq!(opponent_code("LAS @ NYL"), Some("NYL"));
        assert_eq!(home_away("LAS vs. NYL"), HomeAway::Home);
        assert_eq!(opponent_code("LAS vs. NYL"), Some("NYL"));
        assert_eq!(opponent_code("  NYL  "), Some("NYL"));
        assert_eq!(opponent_code("   "), None);
    }

    #[test]
    fn lookup_miss_is_null_and_counted() {
        let tables = ContextTables {
            def_rating: OpponentLookup::from_pairs("2024", [("NYL", 97.7)]),
            pace: OpponentLookup::new(),
        };
        let mut enricher = ContextEnricher::new(&tables);

        let ctx = enricher.enrich("LAS @ NYL", "2024");
        assert_eq!(ctx.home_away, HomeAway::Away);
        assert_eq!(ctx.opp_code, "NYL");
        assert_eq!(ctx.opp_def_rating, Some(97.7));
        assert_eq!(ctx.opp_pace, None);

        let ctx = enricher.enrich("LAS vs. NYL", "2031");
        assert_eq!(ctx.opp_def_rating, None);

        assert_eq!(
            enricher.misses(),
            LookupMisses {
                def_rating: 1,
                pace: 2,
            }
        );
    }
}
