//! Event-driven ingestion for Blockwatch.
//!
//! Bridges a stream of filesystem creation events into ledger appends: one
//! block per newly created file, in delivery order. Notification and read
//! failures are reported and skipped; only losing the event source itself
//! stops the loop with an error.

pub mod error;
pub mod event;
pub mod ingest;
pub mod poll;
pub mod reader;
pub mod report;
pub mod watcher;

pub use error::{IngestError, Result};
pub use event::WatchEvent;
pub use ingest::{EventOutcome, IngestSummary, Ingestor};
pub use poll::{PollConfig, PollWatcher};
pub use reader::{ContentReader, FsReader};
pub use report::{ConsoleReport, ReportFormat, ReportScope, ReportSink, TracingReport};
pub use watcher::{CloseHandle, Subscription, Watcher};
