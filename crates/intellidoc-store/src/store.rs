//! The substrate contract consumed by the collaboration core.

use async_trait::async_trait;

use crate::batch::WriteBatch;
use crate::document::{Document, Fields};
use crate::error::Result;
use crate::query::Query;
use crate::subscription::SnapshotStream;

/// A remote real-time document store.
///
/// Collections are addressed by path; sub-collections nest with `/`
/// (`profiles/{uid}/friends`). Every method is a suspension point — the
/// caller yields until the store answers. Implementations must guarantee
/// that a committed [`WriteBatch`] applies atomically and that snapshot
/// emissions within one subscription follow the order in which the store
/// observed the underlying writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create or fully overwrite a document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Merge fields into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Execute a query once.
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Commit a batch of writes atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Subscribe to a query. The stream yields the current result set first,
    /// then a full result set after every change.
    async fn watch(&self, query: Query) -> Result<SnapshotStream>;
}
