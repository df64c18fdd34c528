//! Registered users and the session identity guard.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A registered user as returned from storage.
///
/// The password column never leaves the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
}

impl User {
    pub fn new(id: i32, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Identity fields carried by a request session.
///
/// Both fields are optional because a session may be empty or partially
/// populated; [`SessionIdentity::into_user`] is the authorization guard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: Option<i32>,
    pub username: Option<String>,
}

impl SessionIdentity {
    /// Session identity for a logged-in user.
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            username: Some(user.username.clone()),
        }
    }

    /// Check that both the user id and the username are set and non-empty.
    pub fn is_valid(&self) -> bool {
        matches!(self.user_id, Some(id) if id > 0)
            && self
                .username
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
    }

    /// Convert into a [`User`], failing when the session is incomplete.
    pub fn into_user(self) -> Result<User> {
        if !self.is_valid() {
            return Err(Error::Unauthenticated("user or id not set".to_string()));
        }
        match (self.user_id, self.username) {
            (Some(id), Some(username)) => Ok(User { id, username }),
            _ => Err(Error::Unauthenticated("user or id not set".to_string())),
        }
    }
}
