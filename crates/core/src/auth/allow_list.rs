//! Allow-list authorization.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::messaging::UserId;

/// Authenticator that only admits a configured set of user ids.
pub struct AllowListAuthenticator {
    allowed: HashSet<UserId>,
}

impl AllowListAuthenticator {
    pub fn new(allowed: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: allowed.into_iter().map(UserId).collect(),
        }
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.allowed.contains(&user_id)
    }
}

#[async_trait]
impl Authenticator for AllowListAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        if self.is_allowed(request.user_id) {
            Ok(Identity::new(request, self.method_name()))
        } else {
            Err(AuthError::Forbidden(request.user_id))
        }
    }

    fn method_name(&self) -> &'static str {
        "allow_list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allowed_user() {
        let auth = AllowListAuthenticator::new([1, 42]);
        let request = AuthRequest::new(UserId(42), Some("alice".to_string()));

        let identity = auth.authenticate(&request).await.unwrap();

        assert_eq!(identity.user_id, UserId(42));
        assert_eq!(identity.method, "allow_list");
    }

    #[tokio::test]
    async fn test_unknown_user_forbidden() {
        let auth = AllowListAuthenticator::new([1, 42]);
        let request = AuthRequest::new(UserId(7), None);

        let result = auth.authenticate(&request).await;

        assert!(matches!(result, Err(AuthError::Forbidden(UserId(7)))));
    }

    #[tokio::test]
    async fn test_empty_list_denies_everyone() {
        let auth = AllowListAuthenticator::new(Vec::new());
        let result = auth.authenticate(&AuthRequest::new(UserId(1), None)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_method_name() {
        let auth = AllowListAuthenticator::new([1]);
        assert_eq!(auth.method_name(), "allow_list");
    }
}
