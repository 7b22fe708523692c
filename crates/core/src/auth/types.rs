use serde::{Deserialize, Serialize};

use crate::messaging::UserId;

/// Request information for authorization
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub user_id: UserId,
    pub username: Option<String>,
}

impl AuthRequest {
    pub fn new(user_id: UserId, username: Option<String>) -> Self {
        Self { user_id, username }
    }
}

/// Authorized identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub method: String,
}

impl Identity {
    pub fn new(request: &AuthRequest, method: &str) -> Self {
        Self {
            user_id: request.user_id,
            username: request.username.clone(),
            method: method.to_string(),
        }
    }

    /// Human label for logs: `@username` when known, the numeric id otherwise.
    pub fn label(&self) -> String {
        match &self.username {
            Some(name) => format!("@{}", name),
            None => self.user_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_request() {
        let request = AuthRequest::new(UserId(42), Some("alice".to_string()));
        let identity = Identity::new(&request, "allow_list");
        assert_eq!(identity.user_id, UserId(42));
        assert_eq!(identity.method, "allow_list");
        assert_eq!(identity.label(), "@alice");
    }

    #[test]
    fn test_identity_label_without_username() {
        let identity = Identity::new(&AuthRequest::new(UserId(7), None), "none");
        assert_eq!(identity.label(), "7");
    }

    #[test]
    fn test_identity_serialization() {
        let identity = Identity::new(&AuthRequest::new(UserId(7), None), "none");
        let json = serde_json::to_string(&identity).unwrap();
        assert_eq!(json, r#"{"user_id":7,"method":"none"}"#);
    }
}
