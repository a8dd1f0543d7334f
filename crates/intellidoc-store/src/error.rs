use thiserror::Error;

/// Errors produced by the substrate boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An update targeted a document that does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Transient I/O failure talking to the remote store.
    #[error("Sync backend unavailable: {0}")]
    Unavailable(String),

    /// The store returned a document the caller could not interpret.
    #[error("Invalid document data: {0}")]
    InvalidData(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
