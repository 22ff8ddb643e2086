#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(pub i64);

impl From<i64> for DatasetId {
    fn from(value: i64) -> Self {
        DatasetId(value)
    }
}

impl From<DatasetId> for i64 {
    fn from(value: DatasetId) -> Self {
        value.0
    }
}

impl DatasetId {
    /// Table id under which the grid for this dataset keeps its preferences.
    pub fn table_id(self) -> String {
        format!("dataset_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetMeta {
    pub id: DatasetId,
    pub name: String,
    pub row_count: i64,
    pub source_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub dataset_id: DatasetId,
    pub row_count: i64,
}
