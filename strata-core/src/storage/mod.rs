pub mod local;

use crate::document::DocumentError;
use crate::types::CanvasDocument;

/// Persistence collaborator for whole documents.
/// Implementations: LocalStorage (filesystem).
pub trait DocumentStorage: Send + Sync {
    /// Read the stored document, upgraded to the current shape.
    /// Returns Ok(None) when nothing has been stored yet.
    fn load(&self) -> Result<Option<CanvasDocument>, StorageError>;

    /// Hand off a snapshot for durable storage.
    /// Returns Ok(false) when the stored copy was already identical.
    fn save(&self, document: &CanvasDocument) -> Result<bool, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt document at {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: DocumentError,
    },

    #[error("Failed to encode document: {0}")]
    Encode(#[source] DocumentError),
}
