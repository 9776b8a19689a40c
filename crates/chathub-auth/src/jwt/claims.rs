//! JWT claim definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a ChatHub access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Username (cached for display and logging).
    pub username: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Unique token id.
    pub jti: Uuid,
}

impl Claims {
    /// The user this token was issued to.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}
