mod allow_list;
mod none;
mod traits;
mod types;

pub use allow_list::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::AllowList => {
            if config.allowed_users.is_empty() {
                return Err(AuthError::ConfigurationError(
                    "allowed_users must be set when using AllowList auth method".to_string(),
                ));
            }
            Ok(Box::new(AllowListAuthenticator::new(
                config.allowed_users.iter().copied(),
            )))
        }
    }
}
