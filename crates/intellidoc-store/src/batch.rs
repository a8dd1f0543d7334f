//! Atomic multi-document writes.
//!
//! A [`WriteBatch`] is a set of create/update operations submitted together;
//! the substrate applies all of them or none. There is no isolation across
//! batches and no conditional write beyond existence checks performed as
//! separate prior reads.

use crate::document::Fields;

/// One write inside a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Unconditional upsert of the full field map.
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge fields into an existing document; fails if it does not exist.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
}

/// An ordered set of writes committed atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: impl Into<String>, id: impl Into<String>, fields: Fields) {
        self.ops.push(WriteOp::Set {
            collection: collection.into(),
            id: id.into(),
            fields,
        });
    }

    pub fn update(&mut self, collection: impl Into<String>, id: impl Into<String>, fields: Fields) {
        self.ops.push(WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            fields,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
