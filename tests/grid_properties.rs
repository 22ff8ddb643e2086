//! Property-based tests for the grid state controller and layout math.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use record_grid::domain::entities::grid::page_count_for;
use record_grid::domain::layout::{sticky_offsets, LayoutColumn};
use record_grid::infra::memory::MemoryStore;
use record_grid::usecase::ports::report::CollectingReporter;
use record_grid::{
    ColumnDef, ColumnFilter, ColumnSort, FetchOutcome, GridConfig, GridController, PageResult,
    Pagination,
};

fn mounted_grid(page_count: usize) -> GridController {
    let (mut grid, request) = GridController::mount(
        "props",
        vec![
            ColumnDef::new("id").sticky(true),
            ColumnDef::new("name"),
            ColumnDef::new("city"),
        ],
        GridConfig {
            selection_column: false,
            ..GridConfig::default()
        },
        Arc::new(MemoryStore::new()),
        Arc::new(CollectingReporter::new()),
    )
    .expect("grid should mount");
    grid.complete(
        request.seq,
        Ok(PageResult {
            rows: Vec::new(),
            page_count,
            total_row_count: (page_count * 10) as u64,
        }),
    );
    grid
}

fn page_tagged(tag: usize) -> PageResult {
    let row = json!({"id": tag});
    PageResult {
        rows: row.as_object().cloned().into_iter().collect(),
        page_count: 1,
        total_row_count: 1,
    }
}

#[derive(Debug, Clone)]
enum Change {
    Sort(bool),
    Filter(String),
    Global(String),
}

fn change_strategy() -> impl Strategy<Value = Change> {
    prop_oneof![
        any::<bool>().prop_map(Change::Sort),
        "[a-z]{0,4}".prop_map(Change::Filter),
        "[a-z]{0,4}".prop_map(Change::Global),
    ]
}

fn shuffled_indices() -> impl Strategy<Value = Vec<usize>> {
    (1usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    /// Sorting, filter and global-filter changes always land on the first page.
    #[test]
    fn prop_query_changes_reset_page_index(
        start_page in 0usize..20,
        change in change_strategy(),
    ) {
        let mut grid = mounted_grid(20);
        grid.set_page_index(start_page);

        match change {
            Change::Sort(desc) => {
                grid.set_sorting(vec![ColumnSort { id: "name".to_string(), desc }]);
            }
            Change::Filter(value) => {
                grid.set_column_filters(vec![ColumnFilter::new("city", value)]);
            }
            Change::Global(value) => {
                grid.set_global_filter(value);
            }
        }

        prop_assert_eq!(grid.state().pagination.page_index, 0);
    }

    /// Whatever order responses arrive in, only the last issued request is applied.
    #[test]
    fn prop_latest_request_wins(order in shuffled_indices()) {
        let mut grid = mounted_grid(1);
        let requests: Vec<_> = (0..order.len())
            .filter_map(|idx| grid.set_global_filter(format!("term-{idx}")))
            .collect();
        prop_assert_eq!(requests.len(), order.len());
        let last = requests.len() - 1;

        for &idx in &order {
            let outcome = grid.complete(requests[idx].seq, Ok(page_tagged(idx)));
            if idx == last {
                prop_assert_eq!(outcome, FetchOutcome::Applied);
            } else {
                prop_assert_eq!(outcome, FetchOutcome::Stale);
            }
        }

        prop_assert!(!grid.is_loading());
        prop_assert_eq!(&grid.rows()[0]["id"], &json!(last));
    }

    /// Requested pages never exceed the last known page.
    #[test]
    fn prop_page_index_is_clamped(page_count in 1usize..30, target in 0usize..100) {
        let mut grid = mounted_grid(page_count);

        grid.set_pagination(Pagination { page_index: target, page_size: 10 });

        prop_assert!(grid.state().pagination.page_index < page_count);
    }

    /// Each sticky column starts where the previous sticky columns end.
    #[test]
    fn prop_sticky_offsets_are_prefix_sums(
        columns in prop::collection::vec((1.0f64..400.0, any::<bool>()), 0..12),
    ) {
        let ids: Vec<String> = (0..columns.len()).map(|idx| format!("c{idx}")).collect();
        let offsets = sticky_offsets(columns.iter().zip(&ids).map(|(&(width, sticky), id)| {
            LayoutColumn { id, width, sticky }
        }));

        let mut expected = Vec::new();
        let mut left = 0.0;
        for (&(width, sticky), id) in columns.iter().zip(&ids) {
            if sticky {
                expected.push((id.clone(), left));
                left += width;
            }
        }
        let actual: Vec<(String, f64)> = offsets
            .into_iter()
            .map(|offset| (offset.column_id, offset.left))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    /// Page count is the smallest number of pages holding every row.
    #[test]
    fn prop_page_count_covers_all_rows(total in 0u64..10_000, size in 1usize..200) {
        let pages = page_count_for(total, size) as u64;

        prop_assert!(pages * size as u64 >= total);
        prop_assert!(pages == 0 || (pages - 1) * (size as u64) < total);
    }
}
