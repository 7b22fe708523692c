//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the daemon and chat
//! collaborators, allowing the dispatcher and relocation flows to be
//! exercised end to end without a running qBittorrent or Telegram.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::testing::{MockMessenger, MockTorrentClient};
//!
//! let torrent_client = MockTorrentClient::with_save_path("/dl");
//! torrent_client.add_torrent_with_files("h1", "Movie", &["movie.mkv"]).await;
//!
//! let messenger = MockMessenger::new();
//! // ... drive a Dispatcher, then inspect messenger.notifications()
//! ```

mod mock_messenger;
mod mock_torrent_client;

pub use mock_messenger::{MockMessenger, SentKind, SentMessage};
pub use mock_torrent_client::{MockTorrentClient, RecordedAddTorrent, RecordedRemoval};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::torrent_client::{TorrentInfo, TorrentState};

    /// A completed torrent saved at `save_path`.
    pub fn torrent_info(hash: &str, name: &str, save_path: impl Into<PathBuf>) -> TorrentInfo {
        TorrentInfo {
            hash: hash.to_string(),
            name: name.to_string(),
            state: TorrentState::Seeding,
            progress: 1.0,
            size_bytes: 0,
            save_path: save_path.into(),
            added_at: None,
        }
    }

    /// A torrent still downloading.
    pub fn downloading_torrent(hash: &str, name: &str, progress: f64) -> TorrentInfo {
        TorrentInfo {
            state: TorrentState::Downloading,
            progress,
            size_bytes: 1024 * 1024,
            ..torrent_info(hash, name, format!("/downloads/{hash}"))
        }
    }

    /// Writes `contents` to `root/relative`, creating parent directories.
    pub fn write_file(root: &Path, relative: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
