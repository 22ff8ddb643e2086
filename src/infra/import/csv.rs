use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

use crate::domain::entities::dataset::ImportResult;
use crate::infra::sqlite::queries::create_dataset_from_rows;

/// Reads a CSV file into a header row and records padded or truncated to the
/// header width. Ragged rows are accepted and a leading BOM is dropped.
pub fn read_csv_table(csv_path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse csv record {row_idx}"))?;
        if record.len() != headers.len() {
            debug!(
                "csv record {row_idx} has {} fields, expected {}",
                record.len(),
                headers.len()
            );
        }
        let mut row: Vec<String> = record.iter().take(headers.len()).map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok((headers, rows))
}

pub fn import_csv_to_sqlite(db_path: &Path, csv_path: &Path) -> Result<ImportResult> {
    let (headers, rows) = read_csv_table(csv_path)?;
    let dataset_name = csv_path
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("dataset");

    let dataset_id = create_dataset_from_rows(
        db_path,
        dataset_name,
        &csv_path.to_string_lossy(),
        &headers,
        &rows,
    )
    .with_context(|| format!("failed to import csv: {}", csv_path.display()))?;

    Ok(ImportResult {
        dataset_id,
        row_count: rows.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ragged_rows_are_fitted_to_the_header() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let csv_path = std::env::temp_dir().join(format!("record-grid-ragged-{nanos}.csv"));
        fs::write(&csv_path, "\u{feff}id,name\n1\n2,Bob,extra\n").expect("should write csv");

        let (headers, rows) = read_csv_table(&csv_path).expect("csv should parse");

        assert_eq!(headers, vec!["id", "name"]);
        assert_eq!(rows, vec![vec!["1", ""], vec!["2", "Bob"]]);

        fs::remove_file(&csv_path).expect("should cleanup csv");
    }
}
