//! Storage-specific error type wrapping sqlx errors.

use agora_domain::error::AgoraError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize or deserialize a stored JSON column.
    #[error("JSON column error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row the operation depends on vanished mid-transaction.
    #[error("{0} row missing")]
    MissingRow(&'static str),
}

impl From<StorageError> for AgoraError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
