//! Route cache watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::routing::cache;
use crate::routing::collection::Collection;

/// Watches the route cache file and sends each successfully reloaded table.
pub struct CacheWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Collection>,
}

impl CacheWatcher {
    /// Returns the watcher and the receiving end for reloaded route tables.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Collection>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle stops the watch when dropped.
    ///
    /// The parent directory is watched rather than the file, since the
    /// cache is replaced by rename on every write.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_cache = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_cache || !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    tracing::info!(path = %path.display(), "Route cache change detected, reloading");
                    match cache::load(&path) {
                        Ok(collection) => {
                            let _ = tx.send(collection);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload route cache. Keeping current routes.");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Route cache watcher started");
        Ok(watcher)
    }
}
