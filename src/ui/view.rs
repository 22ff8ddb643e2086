//! Render-ready snapshots of a grid, so the component tree never holds a
//! borrow of the controller while building elements.

use crate::domain::entities::record::display_text;
use crate::usecase::services::grid_controller::{GridController, GridStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub id: String,
    pub label: String,
    pub width: f64,
    pub sticky_left: Option<f64>,
    pub is_selection: bool,
    pub sortable: bool,
    /// `Some(desc)` when the column takes part in sorting.
    pub sort: Option<bool>,
    pub sort_rank: Option<usize>,
    pub filterable: bool,
    pub filter: String,
    pub resizable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub index: usize,
    pub selected: bool,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnToggle {
    pub id: String,
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub toggles: Vec<ColumnToggle>,
    pub page_label: String,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub can_previous: bool,
    pub can_next: bool,
    pub total_row_count: u64,
    pub global_filter: String,
    pub all_selected: bool,
    pub some_selected: bool,
    pub selected_count: usize,
    pub status: GridStatus,
    pub total_width: f64,
    pub multi_sort: bool,
}

pub fn snapshot(grid: &GridController) -> GridSnapshot {
    let state = grid.state();
    GridSnapshot {
        headers: build_headers(grid),
        rows: build_rows(grid),
        toggles: column_toggles(grid),
        page_label: page_label(state.pagination.page_index, grid.page_count()),
        page_size: state.pagination.page_size,
        page_size_options: grid.config().page_size_options.clone(),
        can_previous: grid.can_previous_page(),
        can_next: grid.can_next_page(),
        total_row_count: grid.total_row_count(),
        global_filter: state.global_filter.clone(),
        all_selected: grid.is_all_rows_selected(),
        some_selected: grid.is_some_rows_selected(),
        selected_count: grid.selected_records().len(),
        status: grid.status(),
        total_width: grid.total_width(),
        multi_sort: state.sorting.len() > 1,
    }
}

pub fn build_headers(grid: &GridController) -> Vec<HeaderView> {
    let offsets = grid.sticky_offsets();
    let state = grid.state();
    grid.visible_columns()
        .into_iter()
        .map(|column| HeaderView {
            id: column.id.clone(),
            label: column.header_label().to_string(),
            width: grid.effective_width(column),
            sticky_left: offsets
                .iter()
                .find(|offset| offset.column_id == column.id)
                .map(|offset| offset.left),
            is_selection: column.is_selection(),
            sortable: column.sortable,
            sort: state.sort_of(&column.id).map(|sort| sort.desc),
            sort_rank: state.sorting.iter().position(|sort| sort.id == column.id),
            filterable: column.filterable,
            filter: state.filter_value(&column.id).unwrap_or_default().to_string(),
            resizable: column.resizable,
        })
        .collect()
}

pub fn build_rows(grid: &GridController) -> Vec<RowView> {
    let columns = grid.visible_columns();
    grid.rows()
        .iter()
        .enumerate()
        .map(|(index, record)| RowView {
            index,
            selected: grid.is_row_selected(index),
            cells: columns
                .iter()
                .map(|column| {
                    if column.is_selection() {
                        String::new()
                    } else {
                        display_text(&column.cell_value(record, index))
                    }
                })
                .collect(),
        })
        .collect()
}

pub fn column_toggles(grid: &GridController) -> Vec<ColumnToggle> {
    grid.columns()
        .iter()
        .filter(|column| column.hideable)
        .map(|column| ColumnToggle {
            id: column.id.clone(),
            label: column.header_label().to_string(),
            visible: grid.state().is_visible(&column.id),
        })
        .collect()
}

pub fn sort_indicator(sort: Option<bool>, rank: Option<usize>, multi: bool) -> String {
    let arrow = match sort {
        None => return String::new(),
        Some(false) => "▲",
        Some(true) => "▼",
    };
    match rank {
        Some(rank) if multi => format!(" {arrow}{}", rank + 1),
        _ => format!(" {arrow}"),
    }
}

pub fn page_label(page_index: usize, page_count: Option<usize>) -> String {
    match page_count {
        Some(0) => "Page 0 of 0".to_string(),
        Some(count) => format!("Page {} of {count}", page_index + 1),
        None => format!("Page {} of ?", page_index + 1),
    }
}

pub fn status_message(status: GridStatus) -> Option<&'static str> {
    match status {
        GridStatus::Loading => Some("Loading..."),
        GridStatus::Empty => Some("No data"),
        GridStatus::Ready => None,
    }
}

pub fn root_container_style() -> &'static str {
    "display: flex; flex-direction: column; height: 100vh; padding: 12px; box-sizing: border-box; font-family: sans-serif;"
}

pub fn table_container_style() -> &'static str {
    "flex: 1; min-height: 0; overflow: auto; border: 1px solid #ccc;"
}

pub fn table_style(total_width: f64) -> String {
    format!("border-collapse: separate; border-spacing: 0; table-layout: fixed; width: {total_width}px; background: #fff;")
}

fn sticky_style(sticky_left: Option<f64>, z_index: u8) -> String {
    match sticky_left {
        Some(left) => format!("position: sticky; left: {left}px; z-index: {z_index};"),
        None => String::new(),
    }
}

pub fn header_cell_style(width: f64, sticky_left: Option<f64>) -> String {
    format!(
        "position: relative; width: {width}px; min-width: {width}px; max-width: {width}px; border: 1px solid #bbb; padding: 4px 6px; background: #f4f4f4; text-align: left; white-space: nowrap; overflow: hidden; {}",
        sticky_style(sticky_left, 3)
    )
}

pub fn body_cell_style(width: f64, sticky_left: Option<f64>, selected: bool) -> String {
    let background = if selected { "#eef4ff" } else { "#fff" };
    format!(
        "width: {width}px; max-width: {width}px; border: 1px solid #ddd; padding: 4px 6px; background: {background}; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; {}",
        sticky_style(sticky_left, 1)
    )
}

pub fn resize_handle_style() -> &'static str {
    "position: absolute; top: 0; right: 0; width: 5px; height: 100%; cursor: col-resize; user-select: none;"
}
