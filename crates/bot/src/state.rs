use chrono::{DateTime, Utc};
use courier_core::{Config, SanitizedConfig};
use sha2::{Digest, Sha256};

/// Shared state of the health/metrics endpoint.
pub struct AppState {
    config: Config,
    config_hash: String,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config_hash = config_fingerprint(&config);
        Self {
            config,
            config_hash,
            started_at: Utc::now(),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Short fingerprint of the loaded configuration.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// First 16 hex chars of the SHA-256 of the sanitized config.
///
/// Secrets are redacted before hashing, so rotating a token keeps the
/// fingerprint stable.
pub fn config_fingerprint(config: &Config) -> String {
    let json = serde_json::to_string(&SanitizedConfig::from(config)).unwrap_or_default();
    let digest = format!("{:x}", Sha256::digest(json.as_bytes()));
    digest[..16].to_string()
}
