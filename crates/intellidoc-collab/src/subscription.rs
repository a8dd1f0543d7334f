//! Typed live sequences over raw snapshot subscriptions.
//!
//! A [`Live`] wraps a substrate watcher in a forwarding task that maps each
//! raw snapshot to a domain value before pushing it to the consumer. The
//! handle must be cancelled (or dropped) when the consumer loses interest;
//! otherwise the underlying watcher keeps standing. Cancelling aborts the
//! forwarding task, which drops the raw stream and lets the store prune the
//! watcher.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use intellidoc_store::SnapshotStream;

/// A cancellable push sequence of domain values.
#[derive(Debug)]
pub struct Live<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Live<T> {
    /// Spawn a forwarding task that maps every raw snapshot through `map`.
    /// A `None` from the mapper skips that emission.
    pub(crate) fn spawn<M, Fut>(mut raw: SnapshotStream, mut map: M) -> Self
    where
        M: FnMut(Vec<intellidoc_store::Document>) -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = raw.recv().await {
                if let Some(item) = map(snapshot).await {
                    if tx.send(item).is_err() {
                        break;
                    }
                }
            }
        });
        Self {
            rx,
            task: Some(task),
        }
    }

    /// A sequence that is already finished. Used for unauthenticated
    /// callers, whose observations are empty rather than errors.
    pub fn empty() -> Self {
        let (_, rx) = mpsc::unbounded_channel();
        Self { rx, task: None }
    }
}

impl<T> Live<T> {
    /// Receive the next emission, or `None` once the sequence has ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Tear the subscription down.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl<T> Drop for Live<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Stream for Live<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
