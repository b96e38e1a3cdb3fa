//! CSV and parquet loaders/writers for [`Table`].

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::table::{Table, cell};

const SERVICE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn read_csv(path: &Path) -> Result<Table> {
    let file = fs::File::open(path)?;
    let table = read_csv_from(file)?;
    debug!(path = %path.display(), rows = table.len(), "read csv");
    Ok(table)
}

/// Short rows are padded with missing cells; a row wider than the header
/// is an error.
pub fn read_csv_from<R: Read>(rdr: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers()?.clone();
    let mut table = Table::new(headers.iter().map(|h| h.trim().to_string()));
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(PipelineError::RaggedRow {
                row,
                expected: headers.len(),
                found: record.len(),
            });
        }
        table.push_row(record.iter().map(cell).collect());
    }
    Ok(table)
}

pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let tmp = path.with_extension("csv.tmp");
    let file = fs::File::create(&tmp)?;
    write_csv_to(file, table)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), rows = table.len(), "wrote csv");
    Ok(())
}

pub fn write_csv_to<W: Write>(wtr: W, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads one flat game-log parquet file. Dates and timestamps become
/// `YYYY-MM-DD` / `YYYY-MM-DDTHH:MM:SS` text; nulls become missing cells.
pub fn read_parquet(path: &Path) -> Result<Table> {
    let file = fs::File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut table = Table::new(columns);
    for row in reader.get_row_iter(None)? {
        let row = row?;
        let mut cells = vec![None; table.columns.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(idx) = table.column_index(name) {
                cells[idx] = field_text(field);
            }
        }
        table.push_row(cells);
    }
    Ok(table)
}

fn field_text(field: &Field) -> Option<String> {
    match field {
        Field::Null => None,
        Field::Str(s) => cell(s),
        Field::Bool(v) => Some(v.to_string()),
        Field::Byte(v) => Some(v.to_string()),
        Field::Short(v) => Some(v.to_string()),
        Field::Int(v) => Some(v.to_string()),
        Field::Long(v) => Some(v.to_string()),
        Field::UByte(v) => Some(v.to_string()),
        Field::UShort(v) => Some(v.to_string()),
        Field::UInt(v) => Some(v.to_string()),
        Field::ULong(v) => Some(v.to_string()),
        Field::Float(v) if v.is_nan() => None,
        Field::Float(v) => Some(v.to_string()),
        Field::Double(v) if v.is_nan() => None,
        Field::Double(v) => Some(v.to_string()),
        Field::Date(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
            .map(|dt| dt.date_naive().to_string()),
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms)
            .map(|dt| dt.naive_utc().format(SERVICE_DATETIME_FORMAT).to_string()),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us)
            .map(|dt| dt.naive_utc().format(SERVICE_DATETIME_FORMAT).to_string()),
        other => Some(other.to_string()),
    }
}

/// Every `*.parquet` file directly under `dir`, sorted by file name.
pub fn parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"))
        {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Loads a directory of per-player parquet files in parallel. Columns are
/// the union in first-seen order; rows keep file-name order.
pub fn load_parquet_dir(dir: &Path) -> Result<Table> {
    let files = parquet_files(dir)?;
    let tables = files
        .par_iter()
        .map(|path| read_parquet(path))
        .collect::<Result<Vec<Table>>>()?;
    let combined = concat_tables(tables);
    info!(
        dir = %dir.display(),
        files = files.len(),
        rows = combined.len(),
        "loaded parquet directory"
    );
    Ok(combined)
}

pub fn concat_tables(tables: Vec<Table>) -> Table {
    let mut out = Table::default();
    for t in &tables {
        for c in &t.columns {
            if out.column_index(c).is_none() {
                out.columns.push(c.clone());
            }
        }
    }
    for t in tables {
        let mapping: Vec<usize> = t
            .columns
            .iter()
            .filter_map(|c| out.column_index(c))
            .collect();
        for row in t.rows {
            let mut cells = vec![None; out.columns.len()];
            for (value, idx) in row.into_iter().zip(&mapping) {
                cells[*idx] = value;
            }
            out.push_row(cells);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_round_trips_missing_cells() {
        let raw = "PLAYER_ID,PTS,MATCHUP\n1, 12 ,LAS @ NYL\n2,,LAS vs. NYL\n";
        let table = read_csv_from(raw.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["PLAYER_ID", "PTS", "MATCHUP"]);
        assert_eq!(table.get(0, 1), Some("12"));
        assert_eq!(table.get(1, 1), None);

        let mut buf = Vec::new();
        write_csv_to(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("PLAYER_ID,PTS,MATCHUP\n"));
        assert!(text.contains("2,,LAS vs. NYL"));
    }

    #[test]
    fn wide_rows_are_rejected_short_rows_padded() {
        let raw = "PLAYER_ID,PTS,MATCHUP\n1,12\n2,8,LAS @ NYL,extra\n";
        match read_csv_from(raw.as_bytes()) {
            Err(PipelineError::RaggedRow {
                row,
                expected,
                found,
            }) => assert_eq!((row, expected, found), (1, 3, 4)),
            other => panic!("expected ragged row, got {other:?}"),
        }

        let table = read_csv_from("PLAYER_ID,PTS,MATCHUP\n1,12\n".as_bytes()).unwrap();
        assert_eq!(table.get(0, 1), Some("12"));
        assert_eq!(table.get(0, 2), None);
    }

    #[test]
    fn concat_unions_columns_in_first_seen_order() {
        let mut a = Table::new(["PLAYER_ID", "PTS"]);
        a.push_row(vec![Some("1".to_string()), Some("10".to_string())]);
        let mut b = Table::new(["PLAYER_ID", "REB", "PTS"]);
        b.push_row(vec![
            Some("2".to_string()),
            Some("4".to_string()),
            Some("8".to_string()),
        ]);

        let out = concat_tables(vec![a, b]);
        assert_eq!(out.columns, vec!["PLAYER_ID", "PTS", "REB"]);
        assert_eq!(out.get(0, 2), None);
        assert_eq!(out.get(1, 1), Some("8"));
        assert_eq!(out.get(1, 2), Some("4"));
    }

    #[test]
    fn parquet_dates_render_as_text() {
        assert_eq!(field_text(&Field::Date(19857)).as_deref(), Some("2024-05-14"));
        assert_eq!(
            field_text(&Field::TimestampMillis(1_715_644_800_000)).as_deref(),
            Some("2024-05-14T00:00:00")
        );
        assert_eq!(field_text(&Field::Null), None);
        assert_eq!(field_text(&Field::Long(25)).as_deref(), Some("25"));
    }
}
