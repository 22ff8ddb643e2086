use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, types::Value as SqlValue, OptionalExtension};
use serde_json::Value;

use crate::domain::entities::dataset::{DatasetId, DatasetMeta};
use crate::domain::entities::grid::{page_count_for, PageResult, Query};
use crate::domain::entities::record::Record;
use crate::infra::sqlite::schema::{init_db, open_connection};

pub fn insert_header_names(
    tx: &rusqlite::Transaction<'_>,
    dataset_id: i64,
    headers: &[String],
) -> Result<()> {
    let mut insert_header = tx
        .prepare("INSERT INTO column_name(dataset_id, col_idx, name) VALUES (?1, ?2, ?3)")
        .context("failed to prepare header insert")?;

    for (col_idx, name) in headers.iter().enumerate() {
        insert_header
            .execute(params![dataset_id, col_idx as i64, name])
            .context("failed to insert header")?;
    }

    Ok(())
}

pub fn create_dataset_from_rows(
    db_path: &Path,
    name: &str,
    source_path: &str,
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<DatasetId> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start dataset create transaction")?;

    tx.execute(
        "INSERT INTO dataset(name, source_path, row_count) VALUES (?1, ?2, 0)",
        params![name, source_path],
    )
    .context("failed to insert dataset")?;
    let dataset_id = tx.last_insert_rowid();

    insert_header_names(&tx, dataset_id, columns)?;

    let mut insert_cell = tx
        .prepare("INSERT INTO cell(dataset_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)")
        .context("failed to prepare cell insert")?;
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate().take(columns.len()) {
            insert_cell
                .execute(params![dataset_id, row_idx as i64, col_idx as i64, value])
                .context("failed to insert dataset cell")?;
        }
    }
    drop(insert_cell);

    tx.execute(
        "UPDATE dataset SET row_count = ?1 WHERE id = ?2",
        params![rows.len() as i64, dataset_id],
    )
    .context("failed to update dataset row_count")?;

    tx.commit().context("failed to commit dataset create")?;
    Ok(DatasetId(dataset_id))
}

pub fn list_datasets(db_path: &Path) -> Result<Vec<DatasetMeta>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT id, name, row_count, source_path
             FROM dataset
             ORDER BY id DESC",
        )
        .context("failed to prepare datasets query")?;

    let datasets = stmt
        .query_map([], |row| {
            Ok(DatasetMeta {
                id: row.get::<_, i64>(0)?.into(),
                name: row.get(1)?,
                row_count: row.get(2)?,
                source_path: row.get(3)?,
            })
        })
        .context("failed to query datasets")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect datasets")?;

    Ok(datasets)
}

pub fn load_columns(conn: &rusqlite::Connection, dataset_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name
             FROM column_name
             WHERE dataset_id = ?1
             ORDER BY col_idx ASC",
        )
        .context("failed to prepare columns query")?;
    let columns = stmt
        .query_map([dataset_id], |row| row.get::<_, String>(0))
        .context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect columns")?;
    Ok(columns)
}

pub fn dataset_columns(db_path: &Path, dataset_id: i64) -> Result<Vec<String>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    load_columns(&conn, dataset_id)
}

fn column_index(columns: &[String], id: &str) -> Option<i64> {
    columns
        .iter()
        .position(|name| name == id)
        .map(|idx| idx as i64)
}

/// `LIKE` pattern matching `term` anywhere, with wildcards in `term` taken
/// literally. Pair with `ESCAPE '\'`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Runs one grid query against a dataset: column filters and the global
/// filter are substring matches, sort keys compare cell text with missing
/// cells as empty, ties fall back to import order.
pub fn query_page(db_path: &Path, dataset_id: i64, query: &Query) -> Result<PageResult> {
    let page_size = query.pagination.page_size;
    if page_size == 0 {
        anyhow::bail!("page_size must be greater than zero")
    }

    let conn = open_connection(db_path)?;
    let columns = load_columns(&conn, dataset_id)?;
    if columns.is_empty() {
        return Ok(PageResult::default());
    }

    let mut filter_clauses = vec!["base.dataset_id = ?".to_string()];
    let mut filter_params = vec![SqlValue::Integer(dataset_id)];

    let global_search = query.global_filter.trim();
    if !global_search.is_empty() {
        filter_clauses.push(
            "EXISTS (
                SELECT 1 FROM cell gs
                WHERE gs.dataset_id = ?
                  AND gs.row_idx = base.row_idx
                  AND gs.value LIKE ? ESCAPE '\\'
            )"
            .to_string(),
        );
        filter_params.push(SqlValue::Integer(dataset_id));
        filter_params.push(SqlValue::Text(contains_pattern(global_search)));
    }

    for filter in &query.column_filters {
        let term = filter.value.trim();
        if term.is_empty() {
            continue;
        }
        let Some(col_idx) = column_index(&columns, &filter.id) else {
            debug!("dataset #{dataset_id}: ignoring filter on unknown column `{}`", filter.id);
            continue;
        };
        filter_clauses.push(
            "EXISTS (
                SELECT 1 FROM cell cs
                WHERE cs.dataset_id = ?
                  AND cs.row_idx = base.row_idx
                  AND cs.col_idx = ?
                  AND cs.value LIKE ? ESCAPE '\\'
            )"
            .to_string(),
        );
        filter_params.push(SqlValue::Integer(dataset_id));
        filter_params.push(SqlValue::Integer(col_idx));
        filter_params.push(SqlValue::Text(contains_pattern(term)));
    }

    let where_sql = filter_clauses.join(" AND ");

    let count_sql = format!(
        "SELECT COUNT(*)
         FROM (
             SELECT base.row_idx
             FROM cell base
             WHERE {where_sql}
             GROUP BY base.row_idx
         ) filtered"
    );
    let total_rows: i64 = conn
        .query_row(
            &count_sql,
            rusqlite::params_from_iter(filter_params.iter().cloned()),
            |row| row.get(0),
        )
        .context("failed to query filtered row count")?;
    let total_row_count = total_rows.max(0) as u64;

    let mut row_params = Vec::<SqlValue>::new();
    let mut row_sql = String::from("SELECT base.row_idx FROM cell base ");
    let mut order_terms = Vec::new();
    for (position, sort) in query.sorting.iter().enumerate() {
        let Some(col_idx) = column_index(&columns, &sort.id) else {
            debug!("dataset #{dataset_id}: ignoring sort on unknown column `{}`", sort.id);
            continue;
        };
        row_sql.push_str(&format!(
            "LEFT JOIN cell sort_{position}
             ON sort_{position}.dataset_id = base.dataset_id
            AND sort_{position}.row_idx = base.row_idx
            AND sort_{position}.col_idx = ? "
        ));
        row_params.push(SqlValue::Integer(col_idx));
        let direction = if sort.desc { "DESC" } else { "ASC" };
        order_terms.push(format!("COALESCE(sort_{position}.value, '') {direction}"));
    }
    order_terms.push("base.row_idx ASC".to_string());

    row_sql.push_str(&format!(
        "WHERE {where_sql} GROUP BY base.row_idx ORDER BY {} LIMIT ? OFFSET ?",
        order_terms.join(", ")
    ));

    let offset = query.pagination.page_index as i64 * page_size as i64;
    row_params.extend(filter_params.iter().cloned());
    row_params.push(SqlValue::Integer(page_size as i64));
    row_params.push(SqlValue::Integer(offset));

    let mut row_stmt = conn
        .prepare(&row_sql)
        .context("failed to prepare page row_idx query")?;
    let row_indices = row_stmt
        .query_map(rusqlite::params_from_iter(row_params), |row| {
            row.get::<_, i64>(0)
        })
        .context("failed to query page row_idx")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect page row_idx")?;
    drop(row_stmt);

    let page_count = page_count_for(total_row_count, page_size);
    if row_indices.is_empty() {
        return Ok(PageResult {
            rows: Vec::new(),
            page_count,
            total_row_count,
        });
    }

    let placeholders = std::iter::repeat_n("?", row_indices.len())
        .collect::<Vec<_>>()
        .join(",");
    let hydrate_sql = format!(
        "SELECT row_idx, col_idx, value
         FROM cell
         WHERE dataset_id = ? AND row_idx IN ({placeholders})
         ORDER BY row_idx ASC, col_idx ASC"
    );
    let mut hydrate_params = vec![SqlValue::Integer(dataset_id)];
    hydrate_params.extend(row_indices.iter().copied().map(SqlValue::Integer));

    let empty_record: Record = columns
        .iter()
        .map(|name| (name.clone(), Value::String(String::new())))
        .collect();
    let mut rows = vec![empty_record; row_indices.len()];
    let row_pos: HashMap<i64, usize> = row_indices
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, row_idx)| (row_idx, idx))
        .collect();

    let mut hydrate_stmt = conn
        .prepare(&hydrate_sql)
        .context("failed to prepare row hydration query")?;

    let mut hydrate_rows = hydrate_stmt
        .query(rusqlite::params_from_iter(hydrate_params))
        .context("failed to run row hydration query")?;

    while let Some(row) = hydrate_rows.next().context("failed to read hydrated row")? {
        let row_idx: i64 = row.get(0).context("failed to read row_idx")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let value: String = row.get(2).context("failed to read value")?;

        let column = columns.get(col_idx as usize);
        if let (Some(&dest_row_idx), Some(column)) = (row_pos.get(&row_idx), column) {
            if let Some(dest_row) = rows.get_mut(dest_row_idx) {
                dest_row.insert(column.clone(), Value::String(value));
            }
        }
    }

    Ok(PageResult {
        rows,
        page_count,
        total_row_count,
    })
}

pub fn get_preference(db_path: &Path, key: &str) -> Result<Option<String>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    conn.query_row(
        "SELECT value FROM preference WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .with_context(|| format!("failed to read preference: {key}"))
}

pub fn set_preference(db_path: &Path, key: &str, value: &str) -> Result<()> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    conn.execute(
        "INSERT INTO preference(key, value, updated_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             updated_at = excluded.updated_at",
        params![key, value],
    )
    .with_context(|| format!("failed to write preference: {key}"))?;
    Ok(())
}

pub fn remove_preference(db_path: &Path, key: &str) -> Result<()> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    conn.execute("DELETE FROM preference WHERE key = ?1", [key])
        .with_context(|| format!("failed to remove preference: {key}"))?;
    Ok(())
}
