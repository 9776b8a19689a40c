//! JWT token validation and decoding.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use chathub_core::config::auth::AuthConfig;
use chathub_core::error::AppError;

use super::claims::Claims;

/// Validates and decodes signed JWT access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation parameters (algorithm, expiry).
    validation: Validation,
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decodes and validates an access token, returning its claims.
    ///
    /// Expired or tampered tokens map to `ErrorKind::Authentication`.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::authentication(format!("Invalid access token: {e}")))
    }
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-do-not-use".to_string(),
            jwt_access_ttl_minutes: 5,
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let user_id = Uuid::new_v4();
        let (token, _) = encoder.generate_access_token(user_id, "alice").unwrap();
        let claims = decoder.decode_access_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&AuthConfig {
            jwt_secret: "a-different-secret".to_string(),
            jwt_access_ttl_minutes: 5,
        });

        let (token, _) = encoder
            .generate_access_token(Uuid::new_v4(), "alice")
            .unwrap();
        assert!(decoder.decode_access_token(&token).is_err());
    }
}
