//! Filesystem watching.
//!
//! The watcher callback runs on a `notify` thread; it only translates events
//! and sends them down a channel. All cache updates happen on the receiving
//! side, inside the session.

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Created,
    Changed,
    Deleted,
}

/// A change to one file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileChangeKind,
}

impl FileEvent {
    #[must_use]
    pub const fn new(path: PathBuf, kind: FileChangeKind) -> Self {
        Self { path, kind }
    }
}

/// Translate a `notify` event into per-file changes
#[must_use]
pub fn file_events(event: &Event) -> Vec<FileEvent> {
    event
        .paths
        .iter()
        .filter_map(|path| {
            let kind = match event.kind {
                EventKind::Create(_) => FileChangeKind::Created,
                // Either side of a rename; whether the path still exists tells which
                EventKind::Modify(ModifyKind::Name(_)) => {
                    if path.exists() {
                        FileChangeKind::Created
                    } else {
                        FileChangeKind::Deleted
                    }
                }
                EventKind::Modify(ModifyKind::Metadata(_)) => return None,
                EventKind::Modify(_) => FileChangeKind::Changed,
                EventKind::Remove(_) => FileChangeKind::Deleted,
                _ => return None,
            };
            Some(FileEvent::new(path.clone(), kind))
        })
        .collect()
}

/// Watch `root` recursively.
///
/// The returned watcher must be kept alive for events to keep flowing.
pub fn watch(root: &Path) -> notify::Result<(RecommendedWatcher, mpsc::UnboundedReceiver<FileEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
        Ok(event) => {
            for file_event in file_events(&event) {
                // The receiver is gone once the server shuts down
                let _ = tx.send(file_event);
            }
        }
        Err(err) => tracing::warn!(error = %err, "File watcher error"),
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    tracing::info!(root = %root.display(), "Watching workspace for changes");
    Ok((watcher, rx))
}
