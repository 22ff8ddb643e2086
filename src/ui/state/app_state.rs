use std::path::PathBuf;
use std::sync::Arc;

use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::dataset::{DatasetId, DatasetMeta};
use crate::infra::sqlite::repo::{DatasetSource, SqliteRepo};
use crate::usecase::ports::report::CollectingReporter;
use crate::usecase::services::grid_controller::GridController;

/// An in-progress column resize: column id, pointer x and width at drag start.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    pub column_id: String,
    pub start_x: f64,
    pub start_width: f64,
}

impl ResizeDrag {
    pub fn width_at(&self, x: f64) -> f64 {
        self.start_width + (x - self.start_x)
    }
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub repo: Signal<Arc<SqliteRepo>>,
    pub reporter: Signal<Arc<CollectingReporter>>,
    pub datasets: Signal<Vec<DatasetMeta>>,
    pub selected_dataset_id: Signal<Option<DatasetId>>,
    pub grid: Signal<Option<GridController>>,
    pub source: Signal<Option<DatasetSource>>,
    /// Bumped whenever `grid` is replaced, so late responses for the old
    /// grid are dropped.
    pub grid_epoch: Signal<u64>,
    pub resize_drag: Signal<Option<ResizeDrag>>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            repo: use_signal(|| Arc::new(SqliteRepo::new(db_path))),
            reporter: use_signal(|| Arc::new(CollectingReporter::new())),
            datasets: use_signal(Vec::<DatasetMeta>::new),
            selected_dataset_id: use_signal(|| None::<DatasetId>),
            grid: use_signal(|| None::<GridController>),
            source: use_signal(|| None::<DatasetSource>),
            grid_epoch: use_signal(|| 0_u64),
            resize_drag: use_signal(|| None::<ResizeDrag>),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
        }
    }
}
