//! # chathub-auth
//!
//! Ambient authentication plumbing for ChatHub: Argon2id password hashing
//! and JWT access tokens. The realtime core treats user identities as
//! opaque; this crate is where they are minted and verified.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
