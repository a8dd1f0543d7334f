//! Boundary to the remote synchronization substrate.
//!
//! The IntelliDoc client keeps no authoritative data of its own; everything
//! lives in a remote real-time document store that offers equality and
//! membership queries, ordered snapshot subscriptions, and atomic
//! multi-document batch commits. This crate defines that contract as the
//! [`DocumentStore`] trait plus the document/query/batch/subscription types
//! it speaks, and ships [`MemoryStore`], an in-process implementation used by
//! tests and offline development.
//!
//! The substrate deliberately offers no compare-and-swap: existence checks
//! are separate prior reads, and isolation exists only inside a single batch.
//! Callers that need one-per-pair records derive the document id from the
//! pair instead of relying on the store for uniqueness.

pub mod batch;
pub mod document;
pub mod error;
pub mod memory;
pub mod query;
pub mod store;
pub mod subscription;

pub use batch::{WriteBatch, WriteOp};
pub use document::{Document, Fields};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, Query};
pub use store::DocumentStore;
pub use subscription::{channel, SnapshotSender, SnapshotStream};
