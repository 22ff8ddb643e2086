use thiserror::Error;

use crate::domain::entities::grid::{PageResult, Query};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{0}")]
    Message(String),
}

/// Pull-based remote data source: one query in, one page of rows out.
pub trait DataSource: Send + Sync {
    fn fetch(&self, query: &Query) -> Result<PageResult, SourceError>;
}

impl<F> DataSource for F
where
    F: Fn(&Query) -> Result<PageResult, SourceError> + Send + Sync,
{
    fn fetch(&self, query: &Query) -> Result<PageResult, SourceError> {
        self(query)
    }
}
