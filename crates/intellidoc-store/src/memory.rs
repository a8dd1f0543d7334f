//! In-process reference implementation of [`DocumentStore`].
//!
//! Backs the test suite and offline development. Collections are plain
//! ordered maps behind one mutex; watcher re-evaluation happens synchronously
//! under that lock, which is what gives each subscription snapshot order
//! matching write order. Watchers whose consumer has gone away are pruned on
//! the next delivery attempt.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::batch::{WriteBatch, WriteOp};
use crate::document::{Document, Fields};
use crate::error::{Result, StoreError};
use crate::query::Query;
use crate::store::DocumentStore;
use crate::subscription::{channel, SnapshotSender, SnapshotStream};

struct Watcher {
    query: Query,
    tx: SnapshotSender,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    watchers: Vec<Watcher>,
    available: bool,
}

/// In-memory document store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                available: true,
                ..Inner::default()
            })),
        }
    }

    /// Simulate a backend outage. While unavailable every operation fails
    /// with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_available(inner: &Inner) -> Result<()> {
    if inner.available {
        Ok(())
    } else {
        Err(StoreError::Unavailable("simulated outage".into()))
    }
}

fn evaluate(collections: &HashMap<String, BTreeMap<String, Fields>>, query: &Query) -> Vec<Document> {
    let mut docs: Vec<Document> = collections
        .get(&query.collection)
        .map(|collection| {
            collection
                .iter()
                .filter(|(_, fields)| query.matches(fields))
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .collect()
        })
        .unwrap_or_default();
    query.arrange(&mut docs);
    docs
}

/// Re-deliver snapshots to every watcher of a touched collection, dropping
/// watchers whose consumer has cancelled.
fn broadcast(inner: &mut Inner, touched: &[&str]) {
    let Inner {
        collections,
        watchers,
        ..
    } = inner;
    watchers.retain(|watcher| {
        if !touched.contains(&watcher.query.collection.as_str()) {
            return true;
        }
        watcher.tx.send(evaluate(collections, &watcher.query))
    });
}

fn apply(inner: &mut Inner, op: WriteOp) {
    match op {
        WriteOp::Set {
            collection,
            id,
            fields,
        } => {
            inner
                .collections
                .entry(collection)
                .or_default()
                .insert(id, fields);
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            if let Some(existing) = inner
                .collections
                .get_mut(&collection)
                .and_then(|c| c.get_mut(&id))
            {
                for (key, value) in fields {
                    existing.insert(key, value);
                }
            }
        }
    }
}

fn exists(inner: &Inner, collection: &str, id: &str) -> bool {
    inner
        .collections
        .get(collection)
        .is_some_and(|c| c.contains_key(id))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let inner = self.lock();
        check_available(&inner)?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut inner = self.lock();
        check_available(&inner)?;
        apply(
            &mut inner,
            WriteOp::Set {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        );
        broadcast(&mut inner, &[collection]);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut inner = self.lock();
        check_available(&inner)?;
        if !exists(&inner, collection, id) {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        apply(
            &mut inner,
            WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        );
        broadcast(&mut inner, &[collection]);
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        let inner = self.lock();
        check_available(&inner)?;
        Ok(evaluate(&inner.collections, query))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.lock();
        check_available(&inner)?;

        let ops = batch.into_ops();

        // Validate every operation before applying any: the batch is
        // all-or-nothing.
        for op in &ops {
            if let WriteOp::Update { collection, id, .. } = op {
                if !exists(&inner, collection, id) {
                    return Err(StoreError::NotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    });
                }
            }
        }

        let mut touched: Vec<String> = Vec::new();
        for op in ops {
            let collection = match &op {
                WriteOp::Set { collection, .. } | WriteOp::Update { collection, .. } => {
                    collection.clone()
                }
            };
            if !touched.contains(&collection) {
                touched.push(collection);
            }
            apply(&mut inner, op);
        }

        let touched: Vec<&str> = touched.iter().map(String::as_str).collect();
        broadcast(&mut inner, &touched);
        Ok(())
    }

    async fn watch(&self, query: Query) -> Result<SnapshotStream> {
        let mut inner = self.lock();
        check_available(&inner)?;

        let (tx, stream) = channel();
        tx.send(evaluate(&inner.collections, &query));
        debug!(collection = %query.collection, "watcher registered");
        inner.watchers.push(Watcher { query, tx });
        Ok(stream)
    }
}
