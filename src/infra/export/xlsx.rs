use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use serde_json::Value;

pub const SHEET_NAME: &str = "Sheet1";

fn column_number(col_idx: usize) -> Result<u16> {
    u16::try_from(col_idx).with_context(|| format!("column {col_idx} exceeds worksheet width"))
}

fn row_number(row_idx: usize) -> Result<u32> {
    u32::try_from(row_idx).with_context(|| format!("row {row_idx} exceeds worksheet height"))
}

/// Single-sheet workbook: a header row followed by one row per record.
/// Numbers and booleans keep their cell type, nulls stay blank.
pub fn encode_xlsx(headers: &[String], rows: &[Vec<Value>]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("failed to name worksheet")?;

    for (col_idx, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, column_number(col_idx)?, header)
            .with_context(|| format!("failed to write header: {header}"))?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = row_number(row_idx + 1)?;
        for (col_idx, value) in row.iter().enumerate() {
            let sheet_col = column_number(col_idx)?;
            let written = match value {
                Value::Null => continue,
                Value::Bool(flag) => worksheet.write_boolean(sheet_row, sheet_col, *flag),
                Value::Number(number) => match number.as_f64() {
                    Some(number) => worksheet.write_number(sheet_row, sheet_col, number),
                    None => worksheet.write_string(sheet_row, sheet_col, number.to_string()),
                },
                Value::String(text) => worksheet.write_string(sheet_row, sheet_col, text),
                nested => worksheet.write_string(sheet_row, sheet_col, nested.to_string()),
            };
            written.with_context(|| format!("failed to write cell ({sheet_row}, {sheet_col})"))?;
        }
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize workbook")
}
