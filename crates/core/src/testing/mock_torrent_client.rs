//! Mock torrent client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{
    extract_hash_from_magnet, AddTorrentRequest, AddTorrentResult, TorrentClient,
    TorrentClientError, TorrentFile, TorrentInfo, TorrentState,
};

/// A recorded torrent addition for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAddTorrent {
    /// The request that was made.
    pub request: AddTorrentRequest,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// A recorded torrent removal for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRemoval {
    pub hash: String,
    pub delete_files: bool,
}

/// Internal state for a mock torrent.
#[derive(Debug, Clone)]
struct MockTorrent {
    info: TorrentInfo,
    files: Vec<TorrentFile>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted torrents and file lists, returned in insertion order
/// - Per-torrent file listing failures
/// - Track added and removed torrents and file listing calls
/// - Simulate failures of the next operation
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::with_save_path("/dl");
/// client.add_torrent_with_files("h1", "Movie", &["movie.mkv", "movie.srt"]).await;
/// client.fail_listing("h2", "daemon hiccup").await;
///
/// let files = client.list_files("h1").await?;
/// assert_eq!(files.len(), 2);
/// assert_eq!(client.list_files_calls().await, vec!["h1"]);
/// ```
#[derive(Debug)]
pub struct MockTorrentClient {
    /// Recorded add_torrent calls.
    added: Arc<RwLock<Vec<RecordedAddTorrent>>>,
    /// Recorded remove_torrent calls.
    removed: Arc<RwLock<Vec<RecordedRemoval>>>,
    /// Known torrents in daemon order.
    torrents: Arc<RwLock<Vec<MockTorrent>>>,
    /// Hashes whose file listing fails, with the failure message.
    failing_listings: Arc<RwLock<HashMap<String, String>>>,
    /// Hashes passed to list_files, in call order.
    list_files_calls: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// Counter for generating unique hashes.
    hash_counter: Arc<RwLock<u32>>,
    /// Base directory for torrents added without an explicit save path.
    default_save_path: PathBuf,
}

impl Default for MockTorrentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self {
            added: Arc::new(RwLock::new(Vec::new())),
            removed: Arc::new(RwLock::new(Vec::new())),
            torrents: Arc::new(RwLock::new(Vec::new())),
            failing_listings: Arc::new(RwLock::new(HashMap::new())),
            list_files_calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            hash_counter: Arc::new(RwLock::new(0)),
            default_save_path: PathBuf::from("/mock/downloads"),
        }
    }

    /// Create a mock client with a custom base save path.
    pub fn with_save_path(save_path: impl Into<PathBuf>) -> Self {
        Self {
            default_save_path: save_path.into(),
            ..Self::new()
        }
    }

    /// Get all recorded add_torrent calls.
    pub async fn added_torrents(&self) -> Vec<RecordedAddTorrent> {
        self.added.read().await.clone()
    }

    /// Get all recorded remove_torrent calls.
    pub async fn removed_torrents(&self) -> Vec<RecordedRemoval> {
        self.removed.read().await.clone()
    }

    /// Hashes passed to list_files so far.
    pub async fn list_files_calls(&self) -> Vec<String> {
        self.list_files_calls.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every file listing of `hash` fail.
    pub async fn fail_listing(&self, hash: &str, message: &str) {
        self.failing_listings
            .write()
            .await
            .insert(hash.to_string(), message.to_string());
    }

    /// Check if a torrent exists.
    pub async fn has_torrent(&self, hash: &str) -> bool {
        self.torrents.read().await.iter().any(|t| t.info.hash == hash)
    }

    /// Pre-populate a torrent with no files.
    pub async fn add_mock_torrent(&self, info: TorrentInfo) {
        self.insert(info, Vec::new()).await;
    }

    /// Pre-populate a torrent and its files.
    pub async fn add_mock_torrent_with_files(&self, info: TorrentInfo, files: Vec<TorrentFile>) {
        self.insert(info, files).await;
    }

    /// Pre-populate a completed torrent saved under `<default save path>/<hash>`.
    pub async fn add_torrent_with_files(&self, hash: &str, name: &str, files: &[&str]) {
        let info = mock_info(hash, name, self.default_save_path.join(hash));
        let files = files.iter().map(|f| TorrentFile::named(*f)).collect();
        self.insert(info, files).await;
    }

    /// Set the progress for a torrent (0.0 to 1.0).
    ///
    /// When progress reaches 1.0, the torrent state changes to Seeding.
    pub async fn set_progress(&self, hash: &str, progress: f64) {
        let mut torrents = self.torrents.write().await;
        if let Some(torrent) = torrents.iter_mut().find(|t| t.info.hash == hash) {
            torrent.info.progress = progress.clamp(0.0, 1.0);
            torrent.info.state = if progress >= 1.0 {
                TorrentState::Seeding
            } else {
                TorrentState::Downloading
            };
        }
    }

    async fn insert(&self, info: TorrentInfo, files: Vec<TorrentFile>) {
        let mut torrents = self.torrents.write().await;
        torrents.retain(|t| t.info.hash != info.hash);
        torrents.push(MockTorrent { info, files });
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<TorrentClientError> {
        self.next_error.write().await.take()
    }

    /// Generate a unique mock hash.
    async fn generate_hash(&self) -> String {
        let mut counter = self.hash_counter.write().await;
        *counter += 1;
        format!("mockhash{:08x}", *counter)
    }
}

fn mock_info(hash: &str, name: &str, save_path: PathBuf) -> TorrentInfo {
    TorrentInfo {
        hash: hash.to_string(),
        name: name.to_string(),
        state: TorrentState::Seeding,
        progress: 1.0,
        size_bytes: 0,
        save_path,
        added_at: Some(Utc::now()),
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.added.write().await.push(RecordedAddTorrent {
            request: request.clone(),
            timestamp: Utc::now(),
        });

        let hash = match extract_hash_from_magnet(&request.uri) {
            Some(hash) => hash,
            None => self.generate_hash().await,
        };

        let save_path = request
            .download_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_save_path.join(&hash));

        let mut info = mock_info(&hash, &hash, save_path);
        info.state = TorrentState::Downloading;
        info.progress = 0.0;
        self.insert(info, Vec::new()).await;

        Ok(AddTorrentResult { hash })
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(self
            .torrents
            .read()
            .await
            .iter()
            .map(|t| t.info.clone())
            .collect())
    }

    async fn list_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        self.list_files_calls.write().await.push(hash.to_string());

        if let Some(message) = self.failing_listings.read().await.get(hash) {
            return Err(TorrentClientError::ApiError(message.clone()));
        }

        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.info.hash == hash)
            .map(|t| t.files.clone())
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn remove_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut torrents = self.torrents.write().await;
        let before = torrents.len();
        torrents.retain(|t| t.info.hash != hash);
        if torrents.len() == before {
            return Err(TorrentClientError::TorrentNotFound(hash.to_string()));
        }

        self.removed.write().await.push(RecordedRemoval {
            hash: hash.to_string(),
            delete_files,
        });
        Ok(())
    }
}
