use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::document_io::DocumentError;

/// Events sent from the file watcher to the session loop.
#[derive(Debug, PartialEq, Eq)]
pub enum FileEvent {
    /// The document was created, modified, replaced or removed on disk.
    Changed(PathBuf),
}

/// Watches a single task document for changes made outside this process.
///
/// The parent directory is watched rather than the file, because editors and
/// our own atomic writes replace the file instead of modifying it in place.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl DocumentWatcher {
    /// Start watching `document`.
    /// Returns a `DocumentWatcher` whose `poll()` method should be called each tick.
    pub fn start(document: &Path) -> Result<Self, DocumentError> {
        let (tx, rx) = mpsc::channel();
        let dir = match document.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name: OsString = document
            .file_name()
            .ok_or_else(|| {
                DocumentError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", document.display()),
                ))
            })?
            .to_os_string();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                // Only the document itself; temp files from atomic writes are skipped
                if let Some(path) = event
                    .paths
                    .into_iter()
                    .find(|p| p.file_name() == Some(file_name.as_os_str()))
                {
                    let _ = tx.send(FileEvent::Changed(path));
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(DocumentWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
