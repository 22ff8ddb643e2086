use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::entities::record::Record;
use crate::error::ConfigError;

pub const SELECTION_COLUMN_ID: &str = "select";
pub const DEFAULT_COLUMN_SIZE: f64 = 150.0;
pub const DEFAULT_MIN_COLUMN_SIZE: f64 = 20.0;
const SELECTION_COLUMN_SIZE: f64 = 50.0;

pub type AccessorFn = Arc<dyn Fn(&Record, usize) -> Value + Send + Sync>;

/// Static description of one grid column.
///
/// Behaviour is driven by the capability flags rather than by column kinds:
/// a column is sortable, filterable, sticky, exportable, hideable and
/// resizable independently of what it displays.
#[derive(Clone)]
pub struct ColumnDef {
    pub id: String,
    /// Literal header label. `None` means the header is rendered by the host,
    /// and exports fall back to the column id.
    pub header: Option<String>,
    pub accessor: Option<AccessorFn>,
    pub size: f64,
    pub min_size: f64,
    pub sortable: bool,
    pub filterable: bool,
    pub sticky: bool,
    pub exportable: bool,
    pub hideable: bool,
    pub resizable: bool,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("accessor", &self.accessor.as_ref().map(|_| "fn"))
            .field("size", &self.size)
            .field("min_size", &self.min_size)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("sticky", &self.sticky)
            .field("exportable", &self.exportable)
            .field("hideable", &self.hideable)
            .field("resizable", &self.resizable)
            .finish()
    }
}

impl ColumnDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: None,
            accessor: None,
            size: DEFAULT_COLUMN_SIZE,
            min_size: DEFAULT_MIN_COLUMN_SIZE,
            sortable: true,
            filterable: true,
            sticky: false,
            exportable: true,
            hideable: true,
            resizable: true,
        }
    }

    /// Built-in row selection column pinned to the leading edge.
    pub fn selection() -> Self {
        Self {
            size: SELECTION_COLUMN_SIZE,
            sortable: false,
            filterable: false,
            sticky: true,
            exportable: false,
            hideable: false,
            resizable: false,
            ..Self::new(SELECTION_COLUMN_ID)
        }
    }

    pub fn header(mut self, label: impl Into<String>) -> Self {
        self.header = Some(label.into());
        self
    }

    pub fn accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&Record, usize) -> Value + Send + Sync + 'static,
    {
        self.accessor = Some(Arc::new(accessor));
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn min_size(mut self, min_size: f64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    pub fn exportable(mut self, exportable: bool) -> Self {
        self.exportable = exportable;
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn is_selection(&self) -> bool {
        self.id == SELECTION_COLUMN_ID
    }

    pub fn header_label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }

    pub fn cell_value(&self, record: &Record, row_index: usize) -> Value {
        match &self.accessor {
            Some(accessor) => accessor(record, row_index),
            None => record.get(&self.id).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Column definitions in declaration order, validated for unique ids and
/// positive sizes.
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<ColumnDef>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if column.id.is_empty() {
                return Err(ConfigError::EmptyColumnId);
            }
            if !seen.insert(column.id.as_str()) {
                return Err(ConfigError::DuplicateColumnId(column.id.clone()));
            }
            if !(column.size.is_finite() && column.size > 0.0) {
                return Err(ConfigError::InvalidColumnSize(column.id.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDef> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
