use std::path::PathBuf;

use log::info;
use rfd::FileDialog;

use crate::usecase::ports::delivery::{DeliveryError, FileDelivery};

/// Asks for a destination with the native save dialog and writes the file.
#[derive(Debug, Default, Clone)]
pub struct NativeSaveDialog {
    pub start_dir: Option<PathBuf>,
}

impl NativeSaveDialog {
    pub fn new() -> Self {
        Self::default()
    }
}

fn filter_for(filename: &str) -> Option<(&'static str, &'static str)> {
    match filename.rsplit('.').next() {
        Some("csv") => Some(("CSV", "csv")),
        Some("xlsx") => Some(("Excel", "xlsx")),
        _ => None,
    }
}

impl FileDelivery for NativeSaveDialog {
    fn deliver(&self, payload: &[u8], mime: &str, filename: &str) -> Result<(), DeliveryError> {
        let mut dialog = FileDialog::new().set_file_name(filename);
        if let Some((label, extension)) = filter_for(filename) {
            dialog = dialog.add_filter(label, &[extension]);
        }
        if let Some(dir) = &self.start_dir {
            dialog = dialog.set_directory(dir);
        }

        let path = dialog.save_file().ok_or(DeliveryError::Cancelled)?;
        std::fs::write(&path, payload)
            .map_err(|err| DeliveryError::Io(format!("failed to write {}: {err}", path.display())))?;
        info!("saved {} ({mime}, {} bytes)", path.display(), payload.len());
        Ok(())
    }
}
