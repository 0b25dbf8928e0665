use std::fmt;
use std::path::PathBuf;

/// A notification delivered by a [`Watcher`](crate::Watcher).
///
/// Only creation is part of the vocabulary: modifications, deletions and
/// renames are never emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// A new file appeared at this path.
    Created(PathBuf),
    /// The watcher hit a non-fatal problem.
    NotificationError(String),
}

impl WatchEvent {
    /// Convenience constructor for a creation event.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::Created(path.into())
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(path) => write!(f, "created {}", path.display()),
            Self::NotificationError(msg) => write!(f, "notification error: {msg}"),
        }
    }
}
