use std::sync::Mutex;

use log::{error, warn};

use crate::error::{ExportError, GridError};

/// The single seam through which the grid surfaces recoverable errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &GridError);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &GridError) {
        match error {
            GridError::Fetch { .. } => error!("{error}"),
            GridError::Export {
                source: ExportError::Encode(_),
                ..
            } => error!("{error}"),
            _ => warn!("{error}"),
        }
    }
}

/// Logs every report and keeps its message so a host can show it later.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn take_last(&self) -> Option<String> {
        let mut messages = self.messages.lock().ok()?;
        let last = messages.pop();
        messages.clear();
        last
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &GridError) {
        LogReporter.report(error);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(error.to_string());
        }
    }
}
