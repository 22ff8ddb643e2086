use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::entities::dataset::{DatasetId, DatasetMeta};
use crate::domain::entities::grid::{PageResult, Query};
use crate::infra::sqlite::queries::{
    create_dataset_from_rows, dataset_columns, get_preference, list_datasets, query_page,
    remove_preference, set_preference,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::source::{DataSource, SourceError};
use crate::usecase::ports::store::{KeyValueStore, StoreError};

/// Datasets and preferences kept in one SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pub db_path: PathBuf,
}

impl SqliteRepo {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn init(&self) -> Result<()> {
        init_db(&self.db_path)
    }

    pub fn list_datasets(&self) -> Result<Vec<DatasetMeta>> {
        list_datasets(&self.db_path)
    }

    pub fn dataset_columns(&self, id: DatasetId) -> Result<Vec<String>> {
        dataset_columns(&self.db_path, id.0)
    }

    pub fn create_dataset(
        &self,
        name: &str,
        source_path: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<DatasetId> {
        create_dataset_from_rows(&self.db_path, name, source_path, columns, rows)
    }

    pub fn query_page(&self, id: DatasetId, query: &Query) -> Result<PageResult> {
        query_page(&self.db_path, id.0, query)
    }
}

impl KeyValueStore for SqliteRepo {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        get_preference(&self.db_path, key).map_err(|err| StoreError::Message(format!("{err:#}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        set_preference(&self.db_path, key, value)
            .map_err(|err| StoreError::Message(format!("{err:#}")))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        remove_preference(&self.db_path, key)
            .map_err(|err| StoreError::Message(format!("{err:#}")))
    }
}

/// Serves grid queries for one imported dataset.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    repo: Arc<SqliteRepo>,
    dataset_id: DatasetId,
}

impl DatasetSource {
    pub fn new(repo: Arc<SqliteRepo>, dataset_id: DatasetId) -> Self {
        Self { repo, dataset_id }
    }

    pub fn dataset_id(&self) -> DatasetId {
        self.dataset_id
    }
}

impl DataSource for DatasetSource {
    fn fetch(&self, query: &Query) -> Result<PageResult, SourceError> {
        self.repo
            .query_page(self.dataset_id, query)
            .map_err(|err| SourceError::Message(format!("{err:#}")))
    }
}
