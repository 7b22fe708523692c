//! Trait definitions for the relocation module.

use async_trait::async_trait;
use tracing::warn;

use super::error::MoveError;
use super::types::{
    MoveFailure, RelocationOutcome, RelocationPlan, RelocationPlanEntry, TorrentHandle,
};
use crate::metrics::{FILES_FAILED, FILES_MOVED};
use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentFile};

/// Source of the torrents currently known to the daemon.
#[async_trait]
pub trait TorrentDirectory: Send + Sync {
    /// Fresh snapshot of every torrent, in daemon order.
    async fn list_handles(&self) -> Result<Vec<TorrentHandle>, TorrentClientError>;
}

/// Source of a single torrent's file entries.
#[async_trait]
pub trait FileLister: Send + Sync {
    async fn list_torrent_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError>;
}

#[async_trait]
impl<T: TorrentClient + ?Sized> TorrentDirectory for T {
    async fn list_handles(&self) -> Result<Vec<TorrentHandle>, TorrentClientError> {
        let torrents = self.list_torrents().await?;
        Ok(torrents.into_iter().map(TorrentHandle::from).collect())
    }
}

#[async_trait]
impl<T: TorrentClient + ?Sized> FileLister for T {
    async fn list_torrent_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        self.list_files(hash).await
    }
}

/// Performs the moves of a plan.
#[async_trait]
pub trait RelocationExecutor: Send + Sync {
    /// Executor name for logging.
    fn name(&self) -> &str;

    /// Moves one file, returning the number of bytes now at the destination.
    async fn move_entry(&self, entry: &RelocationPlanEntry) -> Result<u64, MoveError>;

    /// Moves every entry in plan order.
    ///
    /// Each entry is committed on its own: a failure is recorded and the
    /// next entry is attempted. Files rejected during planning are reported
    /// as failures without touching the filesystem.
    async fn execute(&self, plan: &RelocationPlan) -> RelocationOutcome {
        let mut outcome = RelocationOutcome {
            destination_directory: plan.destination_directory.clone(),
            failed: plan.rejected.clone(),
            skipped_torrents: plan.skipped_torrents.clone(),
            ..Default::default()
        };

        for entry in &plan.entries {
            match self.move_entry(entry).await {
                Ok(bytes) => {
                    FILES_MOVED.inc();
                    outcome.moved.push(entry.display_name.clone());
                    outcome.bytes_moved += bytes;
                }
                Err(e) => {
                    warn!(
                        file = %entry.display_name,
                        source = %entry.source_path.display(),
                        destination = %entry.destination_path.display(),
                        error = %e,
                        "Failed to move file"
                    );
                    FILES_FAILED.with_label_values(&[e.kind()]).inc();
                    outcome.failed.push(MoveFailure {
                        display_name: entry.display_name.clone(),
                        reason: e.reason(),
                    });
                }
            }
        }

        outcome
    }
}
