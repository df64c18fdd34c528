//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("username already registered: {username}")]
    DuplicateUser { username: String },

    #[error("invalid username or password for user {username}")]
    InvalidCredentials { username: String },

    #[error("cannot add data for non-existent user_id: {user_id}")]
    InvalidUser { user_id: i32 },

    #[error(transparent)]
    Core(#[from] dextrack_core::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl MetadataError {
    /// Whether the error is a caller-level misuse of a caught set.
    pub fn is_invalid_caught_set_state(&self) -> bool {
        matches!(
            self,
            Self::Core(dextrack_core::Error::InvalidCaughtSetState { .. })
        )
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
