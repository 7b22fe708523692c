use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::relocation::RelocationConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub auth: AuthConfig,
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub relocation: RelocationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub token: String,
    /// Bot API base URL (override for self-hosted Bot API servers).
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Long polling timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u32 {
    30
}

/// Authorization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Telegram user ids allowed to talk to the bot (used by `allow_list`).
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Everyone may use the bot. Must be chosen explicitly.
    None,
    AllowList,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Save path passed with new torrents (daemon default if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
}

fn default_timeout() -> u32 {
    30
}

/// Health and metrics HTTP endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    9090
}

/// Sanitized config for logs and the config endpoint (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub auth: SanitizedAuthConfig,
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub relocation: RelocationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub token_configured: bool,
    pub poll_timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub allowed_users: usize,
}

/// Sanitized qBittorrent config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            telegram: SanitizedTelegramConfig {
                api_url: config.telegram.api_url.clone(),
                token_configured: !config.telegram.token.is_empty(),
                poll_timeout_secs: config.telegram.poll_timeout_secs,
            },
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::AllowList => "allow_list".to_string(),
                },
                allowed_users: config.auth.allowed_users.len(),
            },
            qbittorrent: SanitizedQBittorrentConfig {
                url: config.qbittorrent.url.clone(),
                username: config.qbittorrent.username.clone(),
                password_configured: !config.qbittorrent.password.is_empty(),
                timeout_secs: config.qbittorrent.timeout_secs,
            },
            relocation: config.relocation.clone(),
            server: config.server.clone(),
        }
    }
}
