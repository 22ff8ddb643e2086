use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("save cancelled")]
    Cancelled,
    #[error("{0}")]
    Io(String),
}

/// Hands a finished export to the user (save dialog, download, ...).
pub trait FileDelivery {
    fn deliver(&self, payload: &[u8], mime: &str, filename: &str) -> Result<(), DeliveryError>;
}
