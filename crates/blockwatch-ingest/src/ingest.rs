use serde::Serialize;
use tracing::{debug, info, warn};

use blockwatch_ledger::Ledger;

use crate::error::{IngestError, Result};
use crate::event::WatchEvent;
use crate::reader::ContentReader;
use crate::report::ReportSink;
use crate::watcher::Subscription;

/// Counters accumulated by an [`Ingestor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub appended: usize,
    pub read_failures: usize,
    pub notification_errors: usize,
}

/// What [`Ingestor::handle`] did with a single event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// A block was appended at this index.
    Appended(usize),
    /// The file could not be read; the ledger is unchanged.
    ReadFailed,
    /// A watcher notification error was reported.
    NotificationReported,
}

/// Turns creation events into ledger appends, one block per file.
///
/// The ingestor is the ledger's only writer. Events are handled strictly
/// one at a time in delivery order.
pub struct Ingestor<R, S> {
    ledger: Ledger,
    reader: R,
    sink: S,
    summary: IngestSummary,
}

impl<R: ContentReader, S: ReportSink> Ingestor<R, S> {
    /// Create an ingestor around a fresh ledger.
    pub fn new(reader: R, sink: S) -> Self {
        Self::with_ledger(Ledger::new(), reader, sink)
    }

    /// Continue appending to an existing ledger.
    pub fn with_ledger(ledger: Ledger, reader: R, sink: S) -> Self {
        Self {
            ledger,
            reader,
            sink,
            summary: IngestSummary::default(),
        }
    }

    /// Consume events until the subscription ends.
    ///
    /// Returns the summary if the subscription was closed, or
    /// [`IngestError::SourceClosed`] if the event source went away on its own.
    /// Per-event failures never end the loop.
    pub async fn run(&mut self, subscription: &mut Subscription) -> Result<IngestSummary> {
        info!(path = %subscription.path().display(), "ingestion started");

        while let Some(event) = subscription.next_event().await {
            self.handle(event);
        }

        if subscription.is_closed() {
            info!(
                appended = self.summary.appended,
                read_failures = self.summary.read_failures,
                notification_errors = self.summary.notification_errors,
                blocks = self.ledger.len(),
                "ingestion stopped"
            );
            Ok(self.summary)
        } else {
            warn!(path = %subscription.path().display(), "event source closed unexpectedly");
            Err(IngestError::SourceClosed)
        }
    }

    /// Process a single event.
    pub fn handle(&mut self, event: WatchEvent) -> EventOutcome {
        match event {
            WatchEvent::Created(path) => match self.reader.read_all(&path) {
                Ok(content) => {
                    debug!(path = %path.display(), bytes = content.len(), "file read");
                    self.ledger.append(content);
                    self.summary.appended += 1;
                    self.sink.block_appended(&self.ledger);
                    EventOutcome::Appended(self.ledger.len() - 1)
                }
                Err(source) => {
                    let err = IngestError::FileRead { path, source };
                    warn!(error = %err, "skipping file");
                    self.summary.read_failures += 1;
                    self.sink.ingest_failed(&err);
                    EventOutcome::ReadFailed
                }
            },
            WatchEvent::NotificationError(msg) => {
                let err = IngestError::Notification(msg);
                warn!(error = %err, "watcher error");
                self.summary.notification_errors += 1;
                self.sink.ingest_failed(&err);
                EventOutcome::NotificationReported
            }
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn summary(&self) -> IngestSummary {
        self.summary
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::poll::{PollConfig, PollWatcher};
    use crate::reader::FsReader;
    use crate::watcher::{CloseHandle, Watcher};

    /// Records what it was told and optionally closes a subscription after
    /// a number of appends.
    #[derive(Default)]
    struct RecordingSink {
        appended: Vec<usize>,
        errors: Vec<String>,
        close_after: Option<(usize, CloseHandle)>,
    }

    impl RecordingSink {
        fn closing_after(appends: usize, closer: CloseHandle) -> Self {
            Self {
                close_after: Some((appends, closer)),
                ..Self::default()
            }
        }
    }

    impl ReportSink for RecordingSink {
        fn block_appended(&mut self, ledger: &Ledger) {
            assert!(ledger.verify());
            self.appended.push(ledger.len());
            if let Some((n, closer)) = &self.close_after {
                if self.appended.len() >= *n {
                    closer.close();
                }
            }
        }

        fn ingest_failed(&mut self, error: &IngestError) {
            self.errors.push(error.to_string());
        }
    }

    fn memory_reader(path: &Path) -> io::Result<Vec<u8>> {
        match path.file_name().and_then(|n| n.to_str()) {
            Some("a.txt") => Ok(b"alpha".to_vec()),
            Some("b.txt") => Ok(b"beta".to_vec()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    #[test]
    fn created_event_appends_block() {
        let mut ingestor = Ingestor::new(memory_reader, RecordingSink::default());

        let outcome = ingestor.handle(WatchEvent::created("storage/a.txt"));

        assert_eq!(outcome, EventOutcome::Appended(1));
        assert_eq!(ingestor.ledger().len(), 2);
        assert_eq!(ingestor.ledger().tail().payload(), b"alpha");
        assert_eq!(ingestor.sink().appended, vec![2]);
        assert!(ingestor.ledger().verify());
    }

    #[test]
    fn read_failure_leaves_ledger_untouched() {
        let mut ingestor = Ingestor::new(memory_reader, RecordingSink::default());
        ingestor.handle(WatchEvent::created("storage/a.txt"));
        let before = ingestor.ledger().blocks().to_vec();

        let outcome = ingestor.handle(WatchEvent::created("storage/vanished.txt"));

        assert_eq!(outcome, EventOutcome::ReadFailed);
        assert_eq!(ingestor.ledger().blocks(), before.as_slice());
        assert_eq!(ingestor.summary().read_failures, 1);
        assert_eq!(ingestor.sink().errors.len(), 1);
        assert!(ingestor.sink().errors[0].contains("vanished.txt"));
    }

    #[test]
    fn vanished_file_on_disk_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        std::fs::write(&path, b"short-lived").unwrap();
        std::fs::remove_file(&path).unwrap();
        let mut ingestor = Ingestor::new(FsReader, RecordingSink::default());

        assert_eq!(ingestor.handle(WatchEvent::Created(path)), EventOutcome::ReadFailed);
        assert!(ingestor.ledger().is_genesis_only());
        assert!(ingestor.ledger().verify());
    }

    #[test]
    fn events_are_appended_in_delivery_order() {
        let mut ingestor = Ingestor::new(memory_reader, RecordingSink::default());
        ingestor.handle(WatchEvent::created("storage/a.txt"));
        ingestor.handle(WatchEvent::created("storage/b.txt"));

        let blocks = ingestor.ledger().blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].payload(), b"alpha");
        assert_eq!(blocks[2].payload(), b"beta");
        assert_eq!(blocks[2].previous_hash(), blocks[1].self_hash());
    }

    #[test]
    fn failures_between_appends_keep_chain_valid() {
        let mut ingestor = Ingestor::new(memory_reader, RecordingSink::default());
        ingestor.handle(WatchEvent::created("storage/a.txt"));
        ingestor.handle(WatchEvent::created("storage/missing.txt"));
        ingestor.handle(WatchEvent::NotificationError("overflow".into()));
        ingestor.handle(WatchEvent::created("storage/b.txt"));

        let ledger = ingestor.ledger();
        assert_eq!(ledger.len(), 3);
        assert!(ledger.verify());
        assert_eq!(
            ingestor.summary(),
            IngestSummary {
                appended: 2,
                read_failures: 1,
                notification_errors: 1,
            }
        );
    }

    #[tokio::test]
    async fn notification_error_does_not_stop_run() {
        let (tx, mut sub) = Subscription::channel("storage");
        let sink = RecordingSink::closing_after(1, sub.closer());
        let mut ingestor = Ingestor::new(memory_reader, sink);

        tx.send(WatchEvent::NotificationError("queue overflow".into())).unwrap();
        tx.send(WatchEvent::created("storage/a.txt")).unwrap();

        let summary = ingestor.run(&mut sub).await.unwrap();
        assert_eq!(summary.notification_errors, 1);
        assert_eq!(summary.appended, 1);
        assert!(ingestor.sink().errors[0].contains("queue overflow"));
    }

    #[tokio::test]
    async fn run_returns_summary_after_close() {
        let (_tx, mut sub) = Subscription::channel("storage");
        let closer = sub.closer();
        let mut ingestor = Ingestor::new(memory_reader, RecordingSink::default());

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            closer.close();
        });

        let summary = ingestor.run(&mut sub).await.unwrap();
        stopper.await.unwrap();
        assert_eq!(summary, IngestSummary::default());
        assert!(ingestor.ledger().is_genesis_only());
    }

    #[tokio::test]
    async fn dead_source_is_an_error() {
        let (tx, mut sub) = Subscription::channel("storage");
        tx.send(WatchEvent::created("storage/a.txt")).unwrap();
        drop(tx);
        let mut ingestor = Ingestor::new(memory_reader, RecordingSink::default());

        let err = ingestor.run(&mut sub).await.unwrap_err();
        assert!(matches!(err, IngestError::SourceClosed));
        assert_eq!(ingestor.ledger().len(), 2);
    }

    #[tokio::test]
    async fn new_file_in_watched_directory_becomes_a_block() {
        let watched = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let watcher = PollWatcher::new(PollConfig {
            interval: Duration::from_millis(20),
            recursive: false,
        });
        let mut sub = watcher.subscribe(watched.path()).unwrap();
        let sink = RecordingSink::closing_after(1, sub.closer());
        let mut ingestor = Ingestor::new(FsReader, sink);

        // Rename so the poller never observes a half-written file.
        let staged = staging.path().join("a.txt");
        std::fs::write(&staged, b"hello").unwrap();
        std::fs::rename(&staged, watched.path().join("a.txt")).unwrap();

        let summary = tokio::time::timeout(Duration::from_secs(5), ingestor.run(&mut sub))
            .await
            .expect("timed out waiting for ingestion")
            .unwrap();

        assert_eq!(summary.appended, 1);
        assert_eq!(ingestor.sink().appended, vec![2]);
        assert!(ingestor.sink().errors.is_empty());
        let ledger = ingestor.into_ledger();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.tail().payload(), b"hello");
        assert_eq!(ledger.tail().previous_hash(), ledger.genesis().self_hash());
        assert!(ledger.verify());
    }
}
