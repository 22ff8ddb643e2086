use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::error::ConfigError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const PAGE_SIZE_OPTIONS: [usize; 6] = [10, 20, 30, 40, 50, 100];
pub const DB_PATH_ENV: &str = "RECORD_GRID_DB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    /// Prepend the built-in sticky selection column.
    pub selection_column: bool,
    /// Record field used as row identity; falls back to the row index.
    pub row_key: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            selection_column: true,
            row_key: None,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::NonPositivePageSize);
        }
        if self.page_size_options.is_empty() || self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidPageSizeOptions);
        }
        Ok(())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "recordgrid", "record-grid")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(DB_PATH_ENV).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(project_dirs()?.data_local_dir().join("records.sqlite"))
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(project_dirs()?.data_local_dir())
}
