//! # chathub-database
//!
//! PostgreSQL connection management, migrations, and repository
//! implementations for ChatHub. The [`repositories::message::MessageStore`]
//! trait defined here is the persistence contract consumed by the
//! real-time delivery path.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::message::{MessageRepository, MessageStore};
pub use repositories::user::UserRepository;
