//! Polling-based dataset watcher.
//!
//! Checks the three input tables' mtimes every poll interval. When any of
//! them changes, debounces (exports and editors often write in stages), then
//! reloads a complete snapshot into the `SharedDataset` and reports the
//! outcome on an mpsc channel. A failed reload leaves the old snapshot active.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{DataPaths, DatasetStats, SharedDataset};

/// Events emitted by the dataset watcher.
#[derive(Debug)]
pub enum DatasetEvent {
    /// A new snapshot was swapped in.
    Reloaded(DatasetStats),
    /// Reload was attempted but failed (previous snapshot remains active).
    Error(String),
}

/// Run the dataset watcher loop.
///
/// Returns when `cancel` fires or the receiving side of `tx` is dropped.
pub async fn run_dataset_watcher(
    dataset: SharedDataset,
    paths: DataPaths,
    poll_interval: Duration,
    debounce: Duration,
    tx: mpsc::Sender<DatasetEvent>,
    cancel: CancellationToken,
) {
    tracing::info!(
        events = %paths.events.display(),
        assets = %paths.assets.display(),
        incidents = %paths.incidents.display(),
        "Dataset watcher started"
    );

    let mut last_mtimes = get_mtimes(&paths);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("Dataset watcher cancelled");
                return;
            }
            () = tokio::time::sleep(poll_interval) => {}
        }

        let current = get_mtimes(&paths);
        if current == last_mtimes {
            continue;
        }

        // A table vanished mid-export: keep serving the old snapshot
        if current.iter().any(Option::is_none) {
            if last_mtimes.iter().all(Option::is_some) {
                tracing::warn!("Dataset table not accessible, keeping current snapshot, will retry");
            }
            last_mtimes = current;
            continue;
        }

        // Debounce: wait, then re-check to ensure the write is complete
        tokio::time::sleep(debounce).await;
        if get_mtimes(&paths) != current {
            continue;
        }
        last_mtimes = current;

        let event = match dataset.reload(&paths) {
            Ok(stats) => DatasetEvent::Reloaded(stats),
            Err(e) => {
                tracing::error!(error = %e, "Dataset hot-reload failed, keeping previous snapshot");
                DatasetEvent::Error(e.to_string())
            }
        };

        if tx.send(event).await.is_err() {
            tracing::debug!("Dataset watcher channel closed, stopping");
            return;
        }
    }
}

fn get_mtimes(paths: &DataPaths) -> [Option<SystemTime>; 3] {
    paths.all().map(get_mtime)
}

/// Read the modification time of a file, returning None on any error.
fn get_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
}
