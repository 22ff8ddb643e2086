use std::fmt;

use log::{info, warn};
use serde_json::Value;

use crate::domain::entities::column::{ColumnDef, ColumnSet};
use crate::domain::entities::grid::GridState;
use crate::domain::entities::record::{display_text, Record};
use crate::error::ExportError;
use crate::infra::export::csv::encode_csv;
use crate::infra::export::xlsx::encode_xlsx;
use crate::usecase::ports::delivery::FileDelivery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8;",
            ExportFormat::Xlsx => "application/octet-stream",
        }
    }

    pub fn file_name(self, table_id: &str) -> String {
        format!("{table_id}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Xlsx => write!(f, "XLSX"),
        }
    }
}

/// The on-screen projection that gets exported: resolved headers and cell
/// values for the eligible columns of the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Columns that are both visible and exportable, in definition order.
pub fn exportable_columns<'a>(columns: &'a ColumnSet, state: &GridState) -> Vec<&'a ColumnDef> {
    columns
        .iter()
        .filter(|column| column.exportable && state.is_visible(&column.id))
        .collect()
}

pub fn project(columns: &[&ColumnDef], rows: &[Record]) -> ExportTable {
    ExportTable {
        headers: columns
            .iter()
            .map(|column| column.header_label().to_string())
            .collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(row_index, record)| {
                columns
                    .iter()
                    .map(|column| column.cell_value(record, row_index))
                    .collect()
            })
            .collect(),
    }
}

pub fn encode(format: ExportFormat, table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => {
            let rows: Vec<Vec<String>> = table
                .rows
                .iter()
                .map(|row| row.iter().map(display_text).collect())
                .collect();
            encode_csv(&table.headers, &rows).map_err(ExportError::Encode)
        }
        ExportFormat::Xlsx => encode_xlsx(&table.headers, &table.rows).map_err(ExportError::Encode),
    }
}

/// Encodes the given view and hands it to `delivery` as `<table_id>.<ext>`.
/// An empty row set produces no file.
pub fn export_view(
    format: ExportFormat,
    table_id: &str,
    columns: &[&ColumnDef],
    rows: &[Record],
    delivery: &dyn FileDelivery,
) -> Result<(), ExportError> {
    if rows.is_empty() {
        warn!("no data to export for {table_id}");
        return Err(ExportError::Empty);
    }

    let table = project(columns, rows);
    let payload = encode(format, &table)?;
    let file_name = format.file_name(table_id);
    delivery.deliver(&payload, format.mime(), &file_name)?;
    info!(
        "exported {} rows of {table_id} as {file_name}",
        table.rows.len()
    );
    Ok(())
}
