// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay file watcher for hot reload.
//!
//! Watches the directory holding the replay file, so replacing the file
//! through a rename is noticed as well as writing it in place.

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

/// Debounce applied to file system events
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Events for the watched replay file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayFileEvent {
    /// The file was created or modified
    Changed,
    /// The file was removed
    Removed,
    /// The watcher reported an error
    Error(String),
}

/// Watches one replay file
pub struct ReplayWatcher {
    /// Keeps the debounced watcher alive
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    /// Receiver for file events
    event_rx: Receiver<ReplayFileEvent>,
    /// Watched file
    path: PathBuf,
}

impl ReplayWatcher {
    /// Start watching `path`
    pub fn new(path: &Path) -> Result<Self, notify::Error> {
        let (event_tx, event_rx) = mpsc::channel();
        let file_name: Option<OsString> = path.file_name().map(ToOwned::to_owned);

        let mut debouncer = new_debouncer(DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        let touches_replay = event
                            .paths
                            .iter()
                            .any(|changed| changed.file_name() == file_name.as_deref());
                        if !touches_replay {
                            continue;
                        }

                        let file_event = match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) => ReplayFileEvent::Changed,
                            EventKind::Remove(_) => ReplayFileEvent::Removed,
                            EventKind::Any | EventKind::Access(_) | EventKind::Other => continue,
                        };
                        let _ = event_tx.send(file_event);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = event_tx.send(ReplayFileEvent::Error(error.to_string()));
                    }
                }
            }
        })?;

        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        debouncer.watch(directory, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching {} for changes", path.display());

        Ok(Self {
            _debouncer: debouncer,
            event_rx,
            path: path.to_path_buf(),
        })
    }

    /// Watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Poll for pending events (non-blocking)
    pub fn poll_events(&self) -> Vec<ReplayFileEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Replay watcher channel disconnected");
                    break;
                }
            }
        }
        events
    }
}

impl std::fmt::Debug for ReplayWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
