use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;

use crate::domain::entities::dataset::ImportResult;
use crate::infra::import::csv::import_csv_to_sqlite;
use crate::infra::import::xlsx::import_xlsx_sheets_to_sqlite;

pub struct ImportService {
    db_path: PathBuf,
}

impl ImportService {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn import_csv(&self, path: &Path) -> Result<ImportResult> {
        let result = import_csv_to_sqlite(&self.db_path, path)?;
        info!(
            "imported {} rows from {} as dataset #{}",
            result.row_count,
            path.display(),
            result.dataset_id.0
        );
        Ok(result)
    }

    pub fn import_xlsx(&self, path: &Path) -> Result<Vec<ImportResult>> {
        let results = import_xlsx_sheets_to_sqlite(&self.db_path, path)?;
        info!("imported {} sheets from {}", results.len(), path.display());
        Ok(results)
    }

    /// Picks the importer from the file extension.
    pub fn import_path(&self, path: &Path) -> Result<Vec<ImportResult>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(vec![self.import_csv(path)?]),
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => self.import_xlsx(path),
            _ => anyhow::bail!("unsupported file type: {}", path.display()),
        }
    }
}
