use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};
use crate::messaging::UserId;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User {0} is not allowed to use this bot")]
    Forbidden(UserId),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Capability check placed in front of every command and conversation reply.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authorize a request and return the identity
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authorization method
    fn method_name(&self) -> &'static str;
}
