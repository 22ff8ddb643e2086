use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use log::debug;

use crate::domain::entities::dataset::ImportResult;
use crate::infra::sqlite::queries::create_dataset_from_rows;

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Imports every non-empty worksheet as its own dataset. The first row of a
/// sheet is its header row.
pub fn import_xlsx_sheets_to_sqlite(db_path: &Path, xlsx_path: &Path) -> Result<Vec<ImportResult>> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open xlsx: {}", xlsx_path.display()))?;
    let source_path = xlsx_path.to_string_lossy().into_owned();

    let mut imported = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
        let Some(headers) = rows.next().filter(|headers| !headers.is_empty()) else {
            debug!("skipping empty sheet {sheet_name}");
            continue;
        };
        let data: Vec<Vec<String>> = rows.collect();

        let dataset_id = create_dataset_from_rows(
            db_path,
            &sheet_name,
            &format!("{source_path}#{sheet_name}"),
            &headers,
            &data,
        )
        .with_context(|| format!("failed to import sheet: {sheet_name}"))?;

        imported.push(ImportResult {
            dataset_id,
            row_count: data.len() as i64,
        });
    }

    if imported.is_empty() {
        anyhow::bail!("workbook has no non-empty sheets: {}", xlsx_path.display())
    }

    Ok(imported)
}
