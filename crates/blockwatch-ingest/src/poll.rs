//! Polling directory watcher.
//!
//! Walks the watched directory on a fixed interval and reports files that
//! were not present on the previous walk, oldest creation time first. Files
//! already present when the subscription starts are never reported, even if
//! a later walk temporarily fails to see them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{IngestError, Result};
use crate::event::WatchEvent;
use crate::watcher::{CloseHandle, Subscription, Watcher};

/// Configuration for the [`PollWatcher`].
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Time between directory walks.
    pub interval: Duration,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            recursive: false,
        }
    }
}

/// [`Watcher`] that detects new files by periodically walking a directory.
///
/// Must be subscribed from within a tokio runtime; the walk runs on the
/// blocking pool.
#[derive(Clone, Debug, Default)]
pub struct PollWatcher {
    config: PollConfig,
}

impl PollWatcher {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }
}

impl Watcher for PollWatcher {
    fn subscribe(&self, path: &Path) -> Result<Subscription> {
        let init_err = |reason: String| IngestError::WatcherInit {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = std::fs::metadata(path).map_err(|e| init_err(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(init_err("not a directory".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| init_err(format!("no async runtime: {e}")))?;

        let baseline = scan(path, self.config.recursive);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription::new(path, rx);

        let poller = Poller {
            root: path.to_path_buf(),
            config: self.config.clone(),
            seen: baseline.paths(),
            events: tx,
            closer: subscription.closer(),
        };
        runtime.spawn(poller.run());

        info!(
            path = %path.display(),
            existing = baseline.files.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            recursive = self.config.recursive,
            "watching for new files"
        );
        Ok(subscription)
    }
}

/// Background task owning the previous walk's snapshot.
struct Poller {
    root: PathBuf,
    config: PollConfig,
    seen: HashSet<PathBuf>,
    events: mpsc::UnboundedSender<WatchEvent>,
    closer: CloseHandle,
}

impl Poller {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the baseline already covers it.
        ticker.tick().await;
        let closer = self.closer.clone();

        loop {
            tokio::select! {
                _ = closer.closed() => break,
                _ = ticker.tick() => {
                    if !self.poll_once().await {
                        break;
                    }
                }
            }
        }
        debug!(path = %self.root.display(), "poller stopped");
    }

    /// One walk-and-diff pass. Returns `false` once nobody is listening.
    async fn poll_once(&mut self) -> bool {
        let root = self.root.clone();
        let recursive = self.config.recursive;
        let snapshot = match tokio::task::spawn_blocking(move || scan(&root, recursive)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "directory walk task failed");
                return self
                    .events
                    .send(WatchEvent::NotificationError(e.to_string()))
                    .is_ok();
            }
        };

        for err in &snapshot.errors {
            if self
                .events
                .send(WatchEvent::NotificationError(err.clone()))
                .is_err()
            {
                return false;
            }
        }

        let created = snapshot.advance(&mut self.seen);
        if !created.is_empty() {
            debug!(count = created.len(), "new files detected");
        }
        for path in created {
            if self.events.send(WatchEvent::Created(path)).is_err() {
                return false;
            }
        }
        true
    }
}

/// Files found by one directory walk, each with its creation time.
#[derive(Debug, Default)]
struct Snapshot {
    files: Vec<(PathBuf, SystemTime)>,
    errors: Vec<String>,
}

impl Snapshot {
    fn paths(&self) -> HashSet<PathBuf> {
        self.files.iter().map(|(path, _)| path.clone()).collect()
    }

    /// Files absent from `seen`, oldest creation first, ties by path.
    fn created_since(&self, seen: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let mut fresh: Vec<_> = self
            .files
            .iter()
            .filter(|(path, _)| !seen.contains(path))
            .collect();
        fresh.sort_by(|(pa, ta), (pb, tb)| ta.cmp(tb).then_with(|| pa.cmp(pb)));
        fresh.into_iter().map(|(path, _)| path.clone()).collect()
    }

    /// Report files absent from `seen` and fold this walk into it.
    ///
    /// A walk that hit errors may have missed part of the tree, so it only
    /// adds to `seen`; a clean walk replaces it.
    fn advance(&self, seen: &mut HashSet<PathBuf>) -> Vec<PathBuf> {
        let created = self.created_since(seen);
        if self.errors.is_empty() {
            *seen = self.paths();
        } else {
            seen.extend(created.iter().cloned());
        }
        created
    }
}

/// Birth time where the platform records one, otherwise last modification.
fn creation_time(metadata: &std::fs::Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn scan(root: &Path, recursive: bool) -> Snapshot {
    let mut walker = WalkDir::new(root).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut snapshot = Snapshot::default();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let created = entry
                    .metadata()
                    .map(|m| creation_time(&m))
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                snapshot.files.push((entry.into_path(), created));
            }
            Ok(_) => {}
            Err(e) => snapshot.errors.push(e.to_string()),
        }
    }
    snapshot
}
