use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::Result;
use crate::event::WatchEvent;

/// Source of filesystem creation events.
pub trait Watcher {
    /// Start watching `path`.
    ///
    /// Failing to establish the subscription is fatal to the caller and
    /// surfaces as [`IngestError::WatcherInit`](crate::IngestError::WatcherInit).
    fn subscribe(&self, path: &Path) -> Result<Subscription>;
}

/// Cloneable handle that closes a [`Subscription`] from anywhere, e.g. a
/// signal handler running alongside the ingestion loop.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    closed: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            closed: Arc::new(tx),
        }
    }

    /// Close the subscription. Idempotent.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            debug!("subscription closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the subscription has been closed.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this only returns on close.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// An owned, scoped subscription to a watcher's event stream.
///
/// Events are delivered in the order the watcher produced them. Closing the
/// subscription (explicitly, through a [`CloseHandle`], or by dropping it)
/// ends the stream and stops the producer.
#[derive(Debug)]
pub struct Subscription {
    path: PathBuf,
    events: mpsc::UnboundedReceiver<WatchEvent>,
    closer: CloseHandle,
}

impl Subscription {
    /// Build a subscription around an existing event channel.
    ///
    /// Producers should stop once [`CloseHandle::closed`] resolves.
    pub fn new(
        path: impl Into<PathBuf>,
        events: mpsc::UnboundedReceiver<WatchEvent>,
    ) -> Self {
        Self {
            path: path.into(),
            events,
            closer: CloseHandle::new(),
        }
    }

    /// A subscription fed by an in-process sender.
    pub fn channel(path: impl Into<PathBuf>) -> (mpsc::UnboundedSender<WatchEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(path, rx))
    }

    /// The watched path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription is closed or the producer has
    /// gone away; use [`Subscription::is_closed`] to tell the two apart.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        if self.closer.is_closed() {
            return None;
        }
        let closer = self.closer.clone();
        tokio::select! {
            biased;
            _ = closer.closed() => None,
            event = self.events.recv() => event,
        }
    }

    pub fn close(&self) {
        self.closer.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    pub fn closer(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.closer.close();
    }
}
