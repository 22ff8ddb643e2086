use tokio::task::{self, JoinError};

use crate::domain::entities::grid::{PageResult, Query};
use crate::usecase::ports::source::{DataSource, SourceError};

/// Runs `work` on the blocking pool of the ambient tokio runtime.
pub async fn run_blocking<F, T>(work: F) -> Result<T, JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work).await
}

/// Runs one page query against `source` on the blocking pool. A panicking
/// source surfaces as a transport error.
pub async fn fetch_in_background<S>(source: S, query: Query) -> Result<PageResult, SourceError>
where
    S: DataSource + 'static,
{
    match run_blocking(move || source.fetch(&query)).await {
        Ok(result) => result,
        Err(err) => Err(SourceError::Transport(format!("fetch task failed: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::grid::Pagination;

    fn query(page_index: usize) -> Query {
        Query {
            pagination: Pagination {
                page_index,
                page_size: 10,
            },
            sorting: Vec::new(),
            column_filters: Vec::new(),
            global_filter: String::new(),
        }
    }

    #[tokio::test]
    async fn fetch_runs_the_query_on_a_worker_thread() {
        let caller = std::thread::current().id();
        let source = move |query: &Query| -> Result<PageResult, SourceError> {
            assert_ne!(std::thread::current().id(), caller);
            Ok(PageResult {
                rows: Vec::new(),
                page_count: query.pagination.page_index + 1,
                total_row_count: 0,
            })
        };

        let page = fetch_in_background(source, query(2))
            .await
            .expect("fetch should succeed");

        assert_eq!(page.page_count, 3);
    }

    #[tokio::test]
    async fn panicking_source_becomes_transport_error() {
        let source = |_: &Query| -> Result<PageResult, SourceError> { panic!("source blew up") };

        let result = fetch_in_background(source, query(0)).await;

        assert!(matches!(result, Err(SourceError::Transport(_))));
    }
}
