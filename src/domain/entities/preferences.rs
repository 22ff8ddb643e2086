use serde::{Deserialize, Serialize};

use crate::domain::entities::grid::{
    ColumnFilter, ColumnSizing, ColumnSort, ColumnVisibility, GridState, Pagination,
};

/// Persisted layout for one table. Every slice is optional so a partial
/// record only overrides what it actually carries. Row selection is never
/// part of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_visibility: Option<ColumnVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_filters: Option<Vec<ColumnFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<Vec<ColumnSort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_sizing: Option<ColumnSizing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_filter: Option<String>,
}

impl TablePreferences {
    pub fn from_state(state: &GridState) -> Self {
        Self {
            column_visibility: Some(state.column_visibility.clone()),
            column_filters: Some(state.column_filters.clone()),
            sorting: Some(state.sorting.clone()),
            column_sizing: Some(state.column_sizing.clone()),
            pagination: Some(state.pagination),
            global_filter: Some(state.global_filter.clone()),
        }
    }
}
