//! qBittorrent torrent client implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;
use crate::metrics::DAEMON_REQUEST_ERRORS;

use super::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentFile,
    TorrentInfo, TorrentState,
};

/// qBittorrent client implementation.
///
/// The session is established lazily and re-established once per request
/// when the daemon answers 403 (expired cookie or daemon restart).
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Session marker (cookie itself lives in the client's jar).
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and store session cookie.
    pub async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Drop the session and log in again.
    async fn reauthenticate(&self) -> Result<(), TorrentClientError> {
        warn!("qBittorrent session expired, re-authenticating");
        {
            let mut session = self.session.write().await;
            *session = None;
        }
        self.login().await
    }

    /// Make an authenticated GET request.
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            self.reauthenticate().await?;

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(map_request_error)?;
            return read_body(response, endpoint).await;
        }

        read_body(response, endpoint).await
    }

    /// Make an authenticated POST request with form data.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            self.reauthenticate().await?;

            let response = self
                .client
                .post(&url)
                .form(params)
                .send()
                .await
                .map_err(map_request_error)?;
            return read_body(response, endpoint).await;
        }

        read_body(response, endpoint).await
    }

    /// Make an authenticated POST request with multipart data.
    ///
    /// Multipart forms cannot be replayed, so a 403 here only refreshes the
    /// session for the next call.
    async fn post_multipart(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<String, TorrentClientError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            self.reauthenticate().await?;
        }

        read_body(response, endpoint).await
    }
}

/// Classify a transport-level reqwest error.
fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    DAEMON_REQUEST_ERRORS.with_label_values(&["transport"]).inc();
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// Read a response body, mapping HTTP failures to client errors.
async fn read_body(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<String, TorrentClientError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        DAEMON_REQUEST_ERRORS.with_label_values(&["not_found"]).inc();
        return Err(TorrentClientError::TorrentNotFound(endpoint.to_string()));
    }
    if status == StatusCode::FORBIDDEN {
        DAEMON_REQUEST_ERRORS.with_label_values(&["forbidden"]).inc();
        return Err(TorrentClientError::AuthenticationFailed(format!(
            "HTTP {}",
            status
        )));
    }
    if !status.is_success() {
        DAEMON_REQUEST_ERRORS.with_label_values(&["http"]).inc();
        return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
    }

    response
        .text()
        .await
        .map_err(|e| TorrentClientError::ApiError(e.to_string()))
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    progress: f64,
    size: i64,
    #[serde(default)]
    added_on: i64,
    save_path: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state: parse_qb_state(&self.state),
            progress: self.progress,
            size_bytes: self.size.max(0) as u64,
            save_path: PathBuf::from(self.save_path),
            added_at: timestamp_to_datetime(self.added_on),
        }
    }
}

/// qBittorrent torrent file response.
#[derive(Debug, Deserialize)]
struct QBTorrentFile {
    name: String,
    size: i64,
    #[serde(default)]
    progress: f64,
}

impl QBTorrentFile {
    fn into_torrent_file(self) -> TorrentFile {
        TorrentFile {
            name: self.name,
            size_bytes: self.size.max(0) as u64,
            progress: self.progress,
        }
    }
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "allocating" => TorrentState::Downloading,
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Paused,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "stalledDL" | "stalledUP" => TorrentState::Stalled,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

/// Convert Unix timestamp to DateTime<Utc>.
fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        Utc.timestamp_opt(ts, 0).single()
    } else {
        None
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let hash = if request.is_magnet() {
            extract_hash_from_magnet(&request.uri).unwrap_or_default()
        } else {
            String::new()
        };

        let mut form = multipart::Form::new().text("urls", request.uri);

        if let Some(path) = request
            .download_path
            .as_ref()
            .or(self.config.download_path.as_ref())
        {
            form = form.text("savepath", path.clone());
        }

        let body = self.post_multipart("/api/v2/torrents/add", form).await?;
        if body.contains("Fails.") {
            return Err(TorrentClientError::InvalidTorrent(
                "qBittorrent rejected the torrent".to_string(),
            ));
        }

        Ok(AddTorrentResult { hash })
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents
            .into_iter()
            .map(|t| t.into_torrent_info())
            .collect())
    }

    async fn list_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        let endpoint = format!("/api/v2/torrents/files?hash={}", hash.to_lowercase());
        let response = self.get(&endpoint).await.map_err(|e| match e {
            TorrentClientError::TorrentNotFound(_) => {
                TorrentClientError::TorrentNotFound(hash.to_string())
            }
            other => other,
        })?;

        let files: Vec<QBTorrentFile> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(files.into_iter().map(|f| f.into_torrent_file()).collect())
    }

    async fn remove_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let delete_str = if delete_files { "true" } else { "false" };

        self.post_form(
            "/api/v2/torrents/delete",
            &[("hashes", &hash_lower), ("deleteFiles", delete_str)],
        )
        .await?;

        Ok(())
    }
}

/// Extract info hash from a magnet URI.
pub(crate) fn extract_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, query) = magnet.split_once('?')?;

    query
        .split('&')
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .map(|hash| hash.to_lowercase())
}
