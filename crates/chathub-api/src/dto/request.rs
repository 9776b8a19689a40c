//! Request DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: String,
    /// Email address (optional).
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    /// Plaintext password.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    /// Display name (optional).
    pub display_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_username_rejected() {
        let req = RegisterRequest {
            username: "ab".to_string(),
            email: None,
            password: "long-enough-password".to_string(),
            display_name: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_request_accepted() {
        let req = RegisterRequest {
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            password: "long-enough-password".to_string(),
            display_name: Some("Alice".to_string()),
        };
        assert!(req.validate().is_ok());
    }
}
