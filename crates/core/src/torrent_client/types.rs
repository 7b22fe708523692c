//! Types for torrent client operations.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

impl TorrentClientError {
    /// Whether the daemon could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout | Self::AuthenticationFailed(_)
        )
    }
}

/// State of a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    /// Downloading from peers.
    Downloading,
    /// Seeding to peers.
    Seeding,
    /// Download or upload is paused.
    Paused,
    /// Checking file integrity.
    Checking,
    /// Queued for download.
    Queued,
    /// Stalled (no peers).
    Stalled,
    /// Error state.
    Error,
    /// Unknown state.
    Unknown,
}

impl TorrentState {
    /// Returns the string representation used in status messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Downloading => "downloading",
            TorrentState::Seeding => "seeding",
            TorrentState::Paused => "paused",
            TorrentState::Checking => "checking",
            TorrentState::Queued => "queued",
            TorrentState::Stalled => "stalled",
            TorrentState::Error => "error",
            TorrentState::Unknown => "unknown",
        }
    }
}

/// Information about a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Torrent name. Not guaranteed to be unique.
    pub name: String,
    /// Current state.
    pub state: TorrentState,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// Directory the torrent's files live in.
    pub save_path: PathBuf,
    /// When the torrent was added.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// A file belonging to a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Path relative to the torrent's save path. Multi-file torrents
    /// include their subdirectory components.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
}

impl TorrentFile {
    /// Create a file entry with only a relative name (size and progress zeroed).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes: 0,
            progress: 0.0,
        }
    }
}

/// Request to add a new torrent from a magnet link or a .torrent URL.
#[derive(Debug, Clone, PartialEq)]
pub struct AddTorrentRequest {
    /// Magnet URI or HTTP(S) link to a .torrent file.
    pub uri: String,
    /// Optional download path override.
    pub download_path: Option<String>,
}

impl AddTorrentRequest {
    /// Create a request with default options.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            download_path: None,
        }
    }

    /// Set the download path.
    pub fn with_download_path(mut self, path: impl Into<String>) -> Self {
        self.download_path = Some(path.into());
        self
    }

    /// Whether the URI is a magnet link.
    pub fn is_magnet(&self) -> bool {
        self.uri.starts_with("magnet:")
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash of the added torrent (empty when not derivable from the URI).
    pub hash: String,
}

/// Trait for torrent daemon backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Add a new torrent.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;

    /// List all torrents in daemon order.
    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError>;

    /// List the files of a torrent.
    async fn list_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError>;

    /// Remove a torrent.
    /// If `delete_files` is true, also delete downloaded files.
    async fn remove_torrent(&self, hash: &str, delete_files: bool)
        -> Result<(), TorrentClientError>;

    /// Find a torrent by exact name or by hash (case-insensitive).
    ///
    /// The first match in daemon order wins; names are not unique.
    async fn find_torrent(
        &self,
        name_or_hash: &str,
    ) -> Result<Option<TorrentInfo>, TorrentClientError> {
        let torrents = self.list_torrents().await?;
        Ok(torrents
            .into_iter()
            .find(|t| t.name == name_or_hash || t.hash.eq_ignore_ascii_case(name_or_hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_state_as_str() {
        assert_eq!(TorrentState::Downloading.as_str(), "downloading");
        assert_eq!(TorrentState::Seeding.as_str(), "seeding");
        assert_eq!(TorrentState::Paused.as_str(), "paused");
        assert_eq!(TorrentState::Checking.as_str(), "checking");
        assert_eq!(TorrentState::Queued.as_str(), "queued");
        assert_eq!(TorrentState::Stalled.as_str(), "stalled");
        assert_eq!(TorrentState::Error.as_str(), "error");
        assert_eq!(TorrentState::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_torrent_state_serialization() {
        assert_eq!(
            serde_json::to_string(&TorrentState::Downloading).unwrap(),
            "\"downloading\""
        );
        assert_eq!(
            serde_json::to_string(&TorrentState::Seeding).unwrap(),
            "\"seeding\""
        );
    }

    #[test]
    fn test_add_torrent_request_builder() {
        let req = AddTorrentRequest::new("magnet:?xt=urn:btih:abc123")
            .with_download_path("/downloads");

        assert!(req.is_magnet());
        assert_eq!(req.download_path, Some("/downloads".to_string()));
    }

    #[test]
    fn test_add_torrent_request_url_is_not_magnet() {
        let req = AddTorrentRequest::new("https://example.org/file.torrent");
        assert!(!req.is_magnet());
        assert_eq!(req.download_path, None);
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(TorrentClientError::Timeout.is_connectivity());
        assert!(TorrentClientError::ConnectionFailed("refused".into()).is_connectivity());
        assert!(!TorrentClientError::TorrentNotFound("abc".into()).is_connectivity());
        assert!(!TorrentClientError::ApiError("HTTP 500".into()).is_connectivity());
    }

    #[test]
    fn test_torrent_file_named() {
        let file = TorrentFile::named("Show/S01E01.mkv");
        assert_eq!(file.name, "Show/S01E01.mkv");
        assert_eq!(file.size_bytes, 0);
    }
}
