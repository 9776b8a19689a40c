//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// JWT and password authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign JWT access tokens.
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u32,
}

fn default_access_ttl() -> u32 {
    720
}
