pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod platform;
pub mod ui;
pub mod usecase;

pub use config::GridConfig;
pub use domain::entities::column::{ColumnDef, ColumnSet};
pub use domain::entities::grid::{
    ColumnFilter, ColumnSort, GridState, PageResult, Pagination, Query, RowId,
};
pub use domain::entities::record::Record;
pub use error::{ConfigError, ExportError, GridError};
pub use usecase::services::grid_controller::{
    FetchOutcome, FetchRequest, GridController, GridStatus,
};

#[cfg(test)]
mod tests;
