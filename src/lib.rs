//! Feature derivation for basketball player game logs.
//!
//! Turns raw per-game box-score rows into a model-ready table: player and
//! team rest days, opponent-relative rest differential, trailing scoring
//! averages (overall and per opponent), home/away and season-scoped opponent
//! strength and pace.

pub mod config;
pub mod context;
pub mod eligibility;
pub mod error;
pub mod game_log;
pub mod io;
pub mod lookup;
pub mod pipeline;
pub mod rest;
pub mod rolling;
pub mod snapshot;
pub mod table;

pub use config::{DegenerateGamePolicy, PipelineConfig};
pub use error::{PipelineError, Result};
pub use game_log::{GameLog, GameRecord};
pub use lookup::{ContextTables, OpponentLookup};
pub use pipeline::{FeaturePipeline, FeatureRow, OutputOptions, PipelineOutput, PipelineReport};
pub use table::Table;
