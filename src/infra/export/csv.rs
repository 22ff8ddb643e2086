//! CSV payloads for grid exports.
//!
//! The payload starts with a UTF-8 BOM. Every field, header row included, is
//! double-quoted with embedded quotes doubled, and every record ends with
//! `\n`, the last one too.

use anyhow::{anyhow, Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Byte-order mark so spreadsheet applications detect UTF-8.
pub const UTF8_BOM: &[u8] = "\u{FEFF}".as_bytes();

pub fn encode_csv(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());

    writer
        .write_record(headers)
        .context("failed to write csv header row")?;
    for (row_idx, row) in rows.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("failed to write csv row {row_idx}"))?;
    }

    writer
        .into_inner()
        .map_err(|err| anyhow!("failed to flush csv payload: {}", err.error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn every_field_is_quoted_and_quotes_are_doubled() {
        let payload = encode_csv(
            &strings(&["id", "name"]),
            &[strings(&["1", "A,\"B\""])],
        )
        .expect("csv should encode");

        assert!(payload.starts_with(UTF8_BOM));
        let text = String::from_utf8(payload[UTF8_BOM.len()..].to_vec()).expect("utf-8 payload");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["\"id\",\"name\"", "\"1\",\"A,\"\"B\"\"\""]);
    }

    #[test]
    fn embedded_newlines_stay_inside_quoted_field() {
        let payload = encode_csv(&strings(&["note"]), &[strings(&["line one\nline two"])])
            .expect("csv should encode");

        let text = String::from_utf8(payload).expect("utf-8 payload");
        assert!(text.ends_with("\"note\"\n\"line one\nline two\"\n"));
    }
}
