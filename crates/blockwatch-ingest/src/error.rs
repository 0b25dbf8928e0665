use std::io;
use std::path::PathBuf;

/// Errors produced by the ingestion subsystem.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The watcher could not establish a subscription. Fatal.
    #[error("failed to watch {}: {reason}", path.display())]
    WatcherInit { path: PathBuf, reason: String },

    /// The watcher reported a problem while delivering events.
    #[error("watcher notification error: {0}")]
    Notification(String),

    /// A newly created file could not be read; the event is dropped.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The event source ended without the subscription being closed.
    #[error("event source closed unexpectedly")]
    SourceClosed,
}

impl IngestError {
    /// Returns `true` for errors that only affect a single event.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Notification(_) | Self::FileRead { .. })
    }

    /// The filesystem path this error concerns, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::WatcherInit { path, .. } | Self::FileRead { path, .. } => Some(path),
            Self::Notification(_) | Self::SourceClosed => None,
        }
    }
}

/// Convenience alias used throughout the ingest crate.
pub type Result<T> = std::result::Result<T, IngestError>;
