use thiserror::Error;

use crate::usecase::ports::delivery::DeliveryError;
use crate::usecase::ports::source::SourceError;
use crate::usecase::ports::store::StoreError;
use crate::usecase::services::export_service::ExportFormat;

/// Caller defects detected while mounting a grid. These are never coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate column id: {0}")]
    DuplicateColumnId(String),
    #[error("column id must not be empty")]
    EmptyColumnId,
    #[error("column `{0}` must declare a positive size")]
    InvalidColumnSize(String),
    #[error("page size must be greater than zero")]
    NonPositivePageSize,
    #[error("page size options must be non-empty and greater than zero")]
    InvalidPageSizeOptions,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no rows to export")]
    Empty,
    #[error("failed to encode payload: {0:#}")]
    Encode(anyhow::Error),
    #[error("failed to deliver file: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Recoverable failures surfaced through the error-reporting seam.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("fetch for table `{table_id}` failed: {source}")]
    Fetch {
        table_id: String,
        source: SourceError,
    },
    #[error("could not encode preferences for table `{table_id}`: {source}")]
    PreferenceEncode {
        table_id: String,
        source: serde_json::Error,
    },
    #[error("could not save preferences for table `{table_id}`: {source}")]
    PreferenceWrite {
        table_id: String,
        source: StoreError,
    },
    #[error("could not read preferences for table `{table_id}`: {source}")]
    PreferenceRead {
        table_id: String,
        source: StoreError,
    },
    #[error("ignoring unreadable preferences for table `{table_id}`: {source}")]
    PreferenceParse {
        table_id: String,
        source: serde_json::Error,
    },
    #[error("could not clear preferences for table `{table_id}`: {source}")]
    PreferenceClear {
        table_id: String,
        source: StoreError,
    },
    #[error("{format} export for table `{table_id}` failed: {source}")]
    Export {
        table_id: String,
        format: ExportFormat,
        source: ExportError,
    },
}

impl GridError {
    pub fn table_id(&self) -> &str {
        match self {
            GridError::Fetch { table_id, .. }
            | GridError::PreferenceEncode { table_id, .. }
            | GridError::PreferenceWrite { table_id, .. }
            | GridError::PreferenceRead { table_id, .. }
            | GridError::PreferenceParse { table_id, .. }
            | GridError::PreferenceClear { table_id, .. }
            | GridError::Export { table_id, .. } => table_id,
        }
    }
}
