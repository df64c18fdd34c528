//! User repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use dextrack_core::User;

/// Repository for registered users.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Register a user.
    ///
    /// Fails with `DuplicateUser` when the username is taken.
    async fn create_user(&self, username: &str, password: &str) -> MetadataResult<()>;

    /// Look up a user by exact (username, password) match.
    ///
    /// Passwords are compared as stored, in clear form. Fails with
    /// `InvalidCredentials` when no row matches.
    async fn authenticate_user(&self, username: &str, password: &str) -> MetadataResult<User>;
}
