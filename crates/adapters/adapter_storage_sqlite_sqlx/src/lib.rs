//! # agora-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `agora-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Write every moderation change and its audit entry in one transaction
//!
//! ## Dependency rule
//! Depends on `agora-app` (for port traits) and `agora-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod forum_repo;
pub mod match_repo;
pub mod pool;
pub mod read_marker_repo;
pub mod user_repo;

mod decode;
mod window;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::StorageError;
pub use forum_repo::SqliteForumRepository;
pub use match_repo::SqliteMatchRepository;
pub use pool::{Config, DEFAULT_MAX_CONNECTIONS, Database};
pub use read_marker_repo::SqliteReadMarkerRepository;
pub use user_repo::SqliteUserRepository;
