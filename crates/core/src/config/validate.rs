use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Longest poll the Bot API honours before it answers with an empty batch.
const MAX_POLL_TIMEOUT_SECS: u32 = 50;

/// Validate configuration
/// Currently validates:
/// - Telegram token is present and the poll timeout is within Bot API limits
/// - qBittorrent URL is an http(s) URL and the request timeout is non-zero
/// - Allow list is non-empty when `allow_list` auth is selected
/// - Server port is not 0 when the endpoint is enabled
/// - Relocation copy buffer is non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.token cannot be empty".to_string(),
        ));
    }

    if config.telegram.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError(format!(
            "telegram.poll_timeout_secs cannot exceed {}",
            MAX_POLL_TIMEOUT_SECS
        )));
    }

    let url = config.qbittorrent.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(
            "qbittorrent.url must be an http(s) URL".to_string(),
        ));
    }

    if config.qbittorrent.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "qbittorrent.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::AllowList && config.auth.allowed_users.is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.allowed_users cannot be empty when method is allow_list".to_string(),
        ));
    }

    if config.server.enabled && config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.relocation.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "relocation.buffer_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
