use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::entities::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn first(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size,
        }
    }
}

/// One sort key. The position inside `GridState::sorting` is its precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub id: String,
    pub desc: bool,
}

impl ColumnSort {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// Opaque per-column predicate; the data source decides what it means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

pub type ColumnVisibility = BTreeMap<String, bool>;
pub type ColumnSizing = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub String);

pub type RowSelection = BTreeSet<RowId>;

#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    pub pagination: Pagination,
    pub sorting: Vec<ColumnSort>,
    pub column_filters: Vec<ColumnFilter>,
    pub global_filter: String,
    pub column_visibility: ColumnVisibility,
    pub column_sizing: ColumnSizing,
    pub row_selection: RowSelection,
}

impl GridState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            pagination: Pagination::first(page_size),
            sorting: Vec::new(),
            column_filters: Vec::new(),
            global_filter: String::new(),
            column_visibility: ColumnVisibility::new(),
            column_sizing: ColumnSizing::new(),
            row_selection: RowSelection::new(),
        }
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(true)
    }

    pub fn filter_value(&self, column_id: &str) -> Option<&str> {
        self.column_filters
            .iter()
            .find(|filter| filter.id == column_id)
            .map(|filter| filter.value.as_str())
    }

    pub fn sort_of(&self, column_id: &str) -> Option<&ColumnSort> {
        self.sorting.iter().find(|sort| sort.id == column_id)
    }

    pub fn query(&self) -> Query {
        Query {
            pagination: self.pagination,
            sorting: self.sorting.clone(),
            column_filters: self.column_filters.clone(),
            global_filter: self.global_filter.clone(),
        }
    }
}

/// The navigational slice of `GridState` sent to the data source for one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub pagination: Pagination,
    pub sorting: Vec<ColumnSort>,
    pub column_filters: Vec<ColumnFilter>,
    pub global_filter: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageResult {
    pub rows: Vec<Record>,
    pub page_count: usize,
    pub total_row_count: u64,
}

pub fn page_count_for(total_rows: u64, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_rows.div_ceil(page_size as u64) as usize
}
