use thiserror::Error;

/// Errors that abort a pipeline run. Lookup misses are not errors: they
/// surface as `None` fields and a counter in the run report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("row {row}: unparseable game date {value:?}")]
    UnparseableDate { row: usize, value: String },

    #[error("row {row}: invalid {column} value {value:?}")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: empty matchup")]
    EmptyMatchup { row: usize },

    #[error("game {game_id} has {} team(s) ({}), expected exactly 2", .teams.len(), .teams.join(", "))]
    DegenerateGameGrouping { game_id: String, teams: Vec<String> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
