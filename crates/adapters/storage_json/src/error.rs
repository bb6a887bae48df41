//! Storage-specific error type wrapping filesystem and JSON errors.

use homecircuit_domain::error::CircuitError;

/// Errors originating from the JSON file storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the snapshot file failed.
    #[error("filesystem error")]
    Io(#[from] std::io::Error),

    /// Serializing the snapshot failed.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for CircuitError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
