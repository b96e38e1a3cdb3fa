//! In-memory table exchanged with the loaders and writers.

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Short rows are padded with missing cells, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }
}

/// Blank and whitespace-only cells count as missing.
pub fn cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_row_pads_to_header_width() {
        let mut table = Table::new(["A", "B", "C"]);
        table.push_row(vec![Some("1".to_string())]);
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.get(0, 0), Some("1"));
        assert_eq!(table.get(0, 2), None);
        assert_eq!(table.get(5, 0), None);
    }

    #[test]
    fn require_column_names_the_missing_one() {
        let table = Table::new(["PLAYER_ID"]);
        assert_eq!(table.require_column("PLAYER_ID").unwrap(), 0);
        let err = table.require_column("PTS").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "PTS"));
    }
}
