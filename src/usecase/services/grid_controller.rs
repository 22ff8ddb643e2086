//! Grid state controller.
//!
//! Owns the interactive state of one mounted table and drives the fetch
//! protocol. Navigational state (pagination, sorting, column filters, global
//! filter) decides which rows are in scope and triggers a fetch when it
//! changes; presentational state (visibility, sizing, selection) never does.
//!
//! Fetches are handed out as [`FetchRequest`]s carrying a sequence number.
//! The host runs the query wherever it likes and feeds the result back
//! through [`GridController::complete`]; only the response for the most
//! recently issued request is applied.

use std::sync::Arc;

use log::{debug, info};

use crate::config::GridConfig;
use crate::domain::entities::column::{ColumnDef, ColumnSet};
use crate::domain::entities::grid::{
    page_count_for, ColumnFilter, ColumnSizing, ColumnSort, ColumnVisibility, GridState,
    PageResult, Pagination, Query, RowId, RowSelection,
};
use crate::domain::entities::preferences::TablePreferences;
use crate::domain::entities::record::{display_text, Record};
use crate::domain::layout::{sticky_offsets, LayoutColumn, StickyOffset};
use crate::error::{ConfigError, ExportError, GridError};
use crate::usecase::ports::delivery::{DeliveryError, FileDelivery};
use crate::usecase::ports::report::ErrorReporter;
use crate::usecase::ports::source::{DataSource, SourceError};
use crate::usecase::ports::store::KeyValueStore;
use crate::usecase::services::export_service::{export_view, exportable_columns, ExportFormat};
use crate::usecase::services::preference_service::PreferenceStore;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied,
    /// The response was applied but the page index fell out of range; the
    /// clamped query must be fetched next.
    Clamped(FetchRequest),
    /// Latest request failed; previous rows are still displayed.
    Failed,
    /// A newer request was issued in the meantime; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStatus {
    Loading,
    Empty,
    Ready,
}

pub struct GridController {
    table_id: String,
    columns: ColumnSet,
    config: GridConfig,
    state: GridState,
    rows: Vec<Record>,
    page_count: Option<usize>,
    /// Page size of the response `page_count` came from.
    counted_page_size: usize,
    total_row_count: u64,
    loading: bool,
    latest_seq: u64,
    preferences: PreferenceStore,
    reporter: Arc<dyn ErrorReporter>,
}

impl GridController {
    /// Creates default state for `table_id`, merges saved preferences over it
    /// and issues the initial fetch.
    pub fn mount(
        table_id: impl Into<String>,
        columns: Vec<ColumnDef>,
        config: GridConfig,
        store: Arc<dyn KeyValueStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<(Self, FetchRequest), ConfigError> {
        config.validate()?;

        let mut definitions = Vec::with_capacity(columns.len() + 1);
        if config.selection_column {
            definitions.push(ColumnDef::selection());
        }
        definitions.extend(columns);
        let columns = ColumnSet::new(definitions)?;

        let table_id = table_id.into();
        let mut controller = Self {
            state: GridState::with_page_size(config.page_size),
            preferences: PreferenceStore::new(store, reporter.clone()),
            table_id,
            columns,
            config,
            rows: Vec::new(),
            page_count: None,
            counted_page_size: 0,
            total_row_count: 0,
            loading: false,
            latest_seq: 0,
            reporter,
        };

        if let Some(saved) = controller.preferences.load(&controller.table_id) {
            controller.apply_preferences(saved);
        }

        let request = controller.issue_fetch();
        Ok((controller, request))
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// `None` until the first successful fetch.
    /// Page count for the current page size, once a response has arrived.
    pub fn page_count(&self) -> Option<usize> {
        self.page_count_for_size(self.state.pagination.page_size)
    }

    pub fn total_row_count(&self) -> u64 {
        self.total_row_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn status(&self) -> GridStatus {
        if self.loading {
            GridStatus::Loading
        } else if self.rows.is_empty() {
            GridStatus::Empty
        } else {
            GridStatus::Ready
        }
    }

    // Navigational mutators. Each returns the fetch to run when the query
    // actually changed.

    /// Replaces pagination. The page index is clamped to the known page
    /// count for the requested page size; a zero page size is ignored. Does
    /// not reset the page index.
    pub fn set_pagination(&mut self, next: Pagination) -> Option<FetchRequest> {
        if next.page_size == 0 {
            debug!("{}: ignoring zero page size", self.table_id);
            return None;
        }
        let previous = self.state.query();
        self.state.pagination = self.clamp_pagination(next);
        self.commit_navigation(previous)
    }

    /// Replaces sorting and returns to the first page.
    pub fn set_sorting(&mut self, next: Vec<ColumnSort>) -> Option<FetchRequest> {
        let previous = self.state.query();
        self.state.sorting = self.normalize_sorting(next);
        self.state.pagination.page_index = 0;
        self.commit_navigation(previous)
    }

    /// Replaces column filters and returns to the first page.
    pub fn set_column_filters(&mut self, next: Vec<ColumnFilter>) -> Option<FetchRequest> {
        let previous = self.state.query();
        self.state.column_filters = self.normalize_filters(next);
        self.state.pagination.page_index = 0;
        self.commit_navigation(previous)
    }

    /// Replaces the global filter and returns to the first page.
    pub fn set_global_filter(&mut self, next: impl Into<String>) -> Option<FetchRequest> {
        let previous = self.state.query();
        self.state.global_filter = next.into();
        self.state.pagination.page_index = 0;
        self.commit_navigation(previous)
    }

    pub fn set_page_index(&mut self, page_index: usize) -> Option<FetchRequest> {
        self.set_pagination(Pagination {
            page_index,
            ..self.state.pagination
        })
    }

    /// Changes the page size while keeping the first visible row on screen.
    pub fn set_page_size(&mut self, page_size: usize) -> Option<FetchRequest> {
        if page_size == 0 {
            debug!("{}: ignoring zero page size", self.table_id);
            return None;
        }
        let current = self.state.pagination;
        let first_row = current.page_index * current.page_size;
        self.set_pagination(Pagination {
            page_index: first_row / page_size,
            page_size,
        })
    }

    pub fn first_page(&mut self) -> Option<FetchRequest> {
        self.set_page_index(0)
    }

    pub fn previous_page(&mut self) -> Option<FetchRequest> {
        if !self.can_previous_page() {
            return None;
        }
        self.set_page_index(self.state.pagination.page_index - 1)
    }

    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if !self.can_next_page() {
            return None;
        }
        self.set_page_index(self.state.pagination.page_index + 1)
    }

    pub fn last_page(&mut self) -> Option<FetchRequest> {
        match self.page_count() {
            Some(page_count) if page_count > 0 => self.set_page_index(page_count - 1),
            _ => None,
        }
    }

    pub fn can_previous_page(&self) -> bool {
        self.state.pagination.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_count()
            .is_some_and(|page_count| self.state.pagination.page_index + 1 < page_count)
    }

    /// Sets or clears (empty value) the filter of a single column. Same side
    /// effects as [`Self::set_column_filters`].
    pub fn set_column_filter(
        &mut self,
        column_id: &str,
        value: impl Into<String>,
    ) -> Option<FetchRequest> {
        let value = value.into();
        let mut next: Vec<ColumnFilter> = self
            .state
            .column_filters
            .iter()
            .filter(|filter| filter.id != column_id)
            .cloned()
            .collect();
        if !value.is_empty() {
            next.push(ColumnFilter::new(column_id, value));
        }
        self.set_column_filters(next)
    }

    /// Header-click sorting: none, ascending, descending, none. With `multi`
    /// the column is toggled inside the existing sort list instead of
    /// replacing it.
    pub fn toggle_sorting(&mut self, column_id: &str, multi: bool) -> Option<FetchRequest> {
        if !self
            .columns
            .get(column_id)
            .is_some_and(|column| column.sortable)
        {
            debug!("{}: column `{column_id}` is not sortable", self.table_id);
            return None;
        }

        let next_desc = match self.state.sort_of(column_id).map(|sort| sort.desc) {
            None => Some(false),
            Some(false) => Some(true),
            Some(true) => None,
        };

        let mut next = if multi {
            self.state.sorting.clone()
        } else {
            Vec::new()
        };
        let position = next.iter().position(|sort| sort.id == column_id);
        match (position, next_desc) {
            (Some(index), Some(desc)) => next[index].desc = desc,
            (Some(index), None) => {
                next.remove(index);
            }
            (None, Some(desc)) => next.push(ColumnSort {
                id: column_id.to_string(),
                desc,
            }),
            (None, None) => {}
        }
        self.set_sorting(next)
    }

    /// Re-issues the current query unchanged.
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue_fetch()
    }

    // Presentational mutators. None of these fetch.

    pub fn set_column_visibility(&mut self, next: ColumnVisibility) {
        self.state.column_visibility = self.normalize_visibility(next);
    }

    pub fn toggle_column_visibility(&mut self, column_id: &str) {
        let mut next = self.state.column_visibility.clone();
        next.insert(column_id.to_string(), !self.state.is_visible(column_id));
        self.set_column_visibility(next);
    }

    pub fn set_column_sizing(&mut self, next: ColumnSizing) {
        self.state.column_sizing = self.normalize_sizing(next);
    }

    /// One step of a resize drag. Widths below the column minimum are clamped;
    /// non-positive widths are rejected.
    pub fn resize_column(&mut self, column_id: &str, width: f64) -> bool {
        let Some(column) = self.columns.get(column_id) else {
            return false;
        };
        if !column.resizable || !width.is_finite() || width <= 0.0 {
            return false;
        }
        let width = width.max(column.min_size);
        self.state
            .column_sizing
            .insert(column_id.to_string(), width);
        true
    }

    pub fn set_row_selection(&mut self, next: RowSelection) {
        self.state.row_selection = next;
    }

    pub fn toggle_row_selected(&mut self, row_index: usize) {
        if row_index >= self.rows.len() {
            return;
        }
        let row_id = self.row_id(row_index);
        if !self.state.row_selection.remove(&row_id) {
            self.state.row_selection.insert(row_id);
        }
    }

    pub fn toggle_all_rows_selected(&mut self) {
        if self.is_all_rows_selected() {
            self.state.row_selection.clear();
        } else {
            self.state.row_selection = (0..self.rows.len()).map(|index| self.row_id(index)).collect();
        }
    }

    pub fn is_row_selected(&self, row_index: usize) -> bool {
        self.state.row_selection.contains(&self.row_id(row_index))
    }

    pub fn is_all_rows_selected(&self) -> bool {
        !self.rows.is_empty() && (0..self.rows.len()).all(|index| self.is_row_selected(index))
    }

    pub fn is_some_rows_selected(&self) -> bool {
        !self.state.row_selection.is_empty() && !self.is_all_rows_selected()
    }

    pub fn selected_records(&self) -> Vec<&Record> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(index, _)| self.is_row_selected(*index))
            .map(|(_, record)| record)
            .collect()
    }

    /// Row identity within the current page: the configured key field, or
    /// the row index.
    pub fn row_id(&self, row_index: usize) -> RowId {
        let keyed = self
            .config
            .row_key
            .as_deref()
            .and_then(|key| self.rows.get(row_index)?.get(key))
            .map(display_text);
        RowId(keyed.unwrap_or_else(|| row_index.to_string()))
    }

    // Fetch protocol.

    /// Applies the outcome of request `seq`. Responses for anything but the
    /// latest issued request are discarded.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<PageResult, SourceError>,
    ) -> FetchOutcome {
        if seq != self.latest_seq {
            debug!(
                "{}: discarding stale response #{seq} (latest #{})",
                self.table_id, self.latest_seq
            );
            return FetchOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                debug!(
                    "{}: applied response #{seq} ({} rows, {} pages, {} total)",
                    self.table_id,
                    page.rows.len(),
                    page.page_count,
                    page.total_row_count
                );
                self.rows = page.rows;
                self.page_count = Some(page.page_count);
                self.counted_page_size = self.state.pagination.page_size;
                self.total_row_count = page.total_row_count;

                let clamped = self.clamp_pagination(self.state.pagination);
                if clamped != self.state.pagination {
                    debug!(
                        "{}: page {} out of range, clamping to {}",
                        self.table_id, self.state.pagination.page_index, clamped.page_index
                    );
                    self.state.pagination = clamped;
                    return FetchOutcome::Clamped(self.issue_fetch());
                }
                FetchOutcome::Applied
            }
            Err(source) => {
                self.reporter.report(&GridError::Fetch {
                    table_id: self.table_id.clone(),
                    source,
                });
                FetchOutcome::Failed
            }
        }
    }

    /// Runs `request` against `source` synchronously.
    pub fn resolve(&mut self, request: FetchRequest, source: &dyn DataSource) -> FetchOutcome {
        let result = source.fetch(&request.query);
        self.complete(request.seq, result)
    }

    /// Resolves `request` and any clamp follow-ups it causes.
    pub fn drive(&mut self, request: Option<FetchRequest>, source: &dyn DataSource) {
        let mut pending = request;
        while let Some(request) = pending.take() {
            if let FetchOutcome::Clamped(next) = self.resolve(request, source) {
                pending = Some(next);
            }
        }
    }

    // Preferences.

    pub fn save_preferences(&self) -> bool {
        self.preferences
            .save(&self.table_id, &TablePreferences::from_state(&self.state))
    }

    /// Restores defaults for every slice, forgets saved preferences and
    /// clears the selection. Returns the fetch to run if the query changed.
    pub fn reset_all(&mut self) -> Option<FetchRequest> {
        self.preferences.clear(&self.table_id);
        let previous = self.state.query();
        self.state = GridState::with_page_size(self.config.page_size);
        self.commit_navigation(previous)
    }

    // Layout.

    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns
            .iter()
            .filter(|column| self.state.is_visible(&column.id))
            .collect()
    }

    pub fn effective_width(&self, column: &ColumnDef) -> f64 {
        self.state
            .column_sizing
            .get(&column.id)
            .copied()
            .unwrap_or(column.size)
    }

    pub fn total_width(&self) -> f64 {
        self.visible_columns()
            .into_iter()
            .map(|column| self.effective_width(column))
            .sum()
    }

    pub fn sticky_offsets(&self) -> Vec<StickyOffset> {
        sticky_offsets(self.visible_columns().into_iter().map(|column| LayoutColumn {
            id: &column.id,
            width: self.effective_width(column),
            sticky: column.sticky,
        }))
    }

    pub fn sticky_offset(&self, column_id: &str) -> Option<f64> {
        self.sticky_offsets()
            .into_iter()
            .find(|offset| offset.column_id == column_id)
            .map(|offset| offset.left)
    }

    // Export.

    pub fn export_csv(&self, delivery: &dyn FileDelivery) -> bool {
        self.export(ExportFormat::Csv, delivery)
    }

    pub fn export_xlsx(&self, delivery: &dyn FileDelivery) -> bool {
        self.export(ExportFormat::Xlsx, delivery)
    }

    /// Exports the visible exportable columns of the current page.
    pub fn export(&self, format: ExportFormat, delivery: &dyn FileDelivery) -> bool {
        let columns = exportable_columns(&self.columns, &self.state);
        match export_view(format, &self.table_id, &columns, &self.rows, delivery) {
            Ok(()) => true,
            Err(ExportError::Delivery(DeliveryError::Cancelled)) => {
                info!("{format} export of {} cancelled", self.table_id);
                false
            }
            Err(source) => {
                self.reporter.report(&GridError::Export {
                    table_id: self.table_id.clone(),
                    format,
                    source,
                });
                false
            }
        }
    }

    fn issue_fetch(&mut self) -> FetchRequest {
        self.latest_seq += 1;
        self.loading = true;
        self.state.row_selection.clear();
        let query = self.state.query();
        debug!("{}: issuing fetch #{} {query:?}", self.table_id, self.latest_seq);
        FetchRequest {
            seq: self.latest_seq,
            query,
        }
    }

    fn commit_navigation(&mut self, previous: Query) -> Option<FetchRequest> {
        if self.state.query() == previous {
            return None;
        }
        Some(self.issue_fetch())
    }

    /// The source's page count when it was computed for `page_size`,
    /// otherwise one derived from the known total.
    fn page_count_for_size(&self, page_size: usize) -> Option<usize> {
        let page_count = self.page_count?;
        if page_size == self.counted_page_size {
            Some(page_count)
        } else {
            Some(page_count_for(self.total_row_count, page_size))
        }
    }

    fn clamp_pagination(&self, pagination: Pagination) -> Pagination {
        match self.page_count_for_size(pagination.page_size) {
            Some(page_count) => Pagination {
                page_index: pagination.page_index.min(page_count.saturating_sub(1)),
                ..pagination
            },
            None => pagination,
        }
    }

    fn apply_preferences(&mut self, saved: TablePreferences) {
        if let Some(visibility) = saved.column_visibility {
            self.state.column_visibility = self.normalize_visibility(visibility);
        }
        if let Some(filters) = saved.column_filters {
            self.state.column_filters = self.normalize_filters(filters);
        }
        if let Some(sorting) = saved.sorting {
            self.state.sorting = self.normalize_sorting(sorting);
        }
        if let Some(sizing) = saved.column_sizing {
            self.state.column_sizing = self.normalize_sizing(sizing);
        }
        if let Some(pagination) = saved.pagination {
            if pagination.page_size == 0 {
                debug!("{}: ignoring saved pagination with zero page size", self.table_id);
            } else {
                self.state.pagination = pagination;
            }
        }
        if let Some(global_filter) = saved.global_filter {
            self.state.global_filter = global_filter;
        }
    }

    fn normalize_sorting(&self, sorting: Vec<ColumnSort>) -> Vec<ColumnSort> {
        let mut normalized: Vec<ColumnSort> = Vec::with_capacity(sorting.len());
        for sort in sorting {
            if !self.columns.get(&sort.id).is_some_and(|column| column.sortable) {
                debug!("{}: dropping sort on `{}`", self.table_id, sort.id);
                continue;
            }
            if normalized.iter().any(|existing| existing.id == sort.id) {
                continue;
            }
            normalized.push(sort);
        }
        normalized
    }

    fn normalize_filters(&self, filters: Vec<ColumnFilter>) -> Vec<ColumnFilter> {
        let mut normalized: Vec<ColumnFilter> = Vec::with_capacity(filters.len());
        for filter in filters {
            if !self
                .columns
                .get(&filter.id)
                .is_some_and(|column| column.filterable)
            {
                debug!("{}: dropping filter on `{}`", self.table_id, filter.id);
                continue;
            }
            normalized.retain(|existing| existing.id != filter.id);
            if !filter.value.is_empty() {
                normalized.push(filter);
            }
        }
        normalized
    }

    fn normalize_visibility(&self, visibility: ColumnVisibility) -> ColumnVisibility {
        visibility
            .into_iter()
            .filter(|(column_id, visible)| match self.columns.get(column_id) {
                Some(column) => *visible || column.hideable,
                None => false,
            })
            .collect()
    }

    fn normalize_sizing(&self, sizing: ColumnSizing) -> ColumnSizing {
        sizing
            .into_iter()
            .filter_map(|(column_id, width)| {
                let column = self.columns.get(&column_id)?;
                if !width.is_finite() || width <= 0.0 {
                    return None;
                }
                let width = width.max(column.min_size);
                Some((column_id, width))
            })
            .collect()
    }
}
