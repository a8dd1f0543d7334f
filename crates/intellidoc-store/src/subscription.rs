//! Push-based snapshot subscriptions.
//!
//! A watcher receives the full current result set of its query, then a fresh
//! full result set after every underlying change, in the order the store
//! observed the writes. The receiving half is a [`SnapshotStream`]: an
//! explicit handle the consumer must cancel (or drop) when no longer
//! interested, otherwise the watcher keeps standing.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::document::Document;

/// Producer half held by the store.
#[derive(Debug)]
pub struct SnapshotSender {
    tx: mpsc::UnboundedSender<Vec<Document>>,
}

impl SnapshotSender {
    /// Deliver a snapshot. Returns false once the consumer has gone away,
    /// at which point the store should drop the watcher.
    pub fn send(&self, snapshot: Vec<Document>) -> bool {
        self.tx.send(snapshot).is_ok()
    }
}

/// Consumer half of a snapshot subscription.
#[derive(Debug)]
pub struct SnapshotStream {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
}

/// Create a connected sender/stream pair.
pub fn channel() -> (SnapshotSender, SnapshotStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SnapshotSender { tx }, SnapshotStream { rx })
}

impl SnapshotStream {
    /// Receive the next snapshot, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }

    /// Stop the subscription. No further snapshots are accepted; the store
    /// prunes its watcher on the next delivery attempt.
    pub fn cancel(&mut self) {
        self.rx.close();
    }
}

impl Stream for SnapshotStream {
    type Item = Vec<Document>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
