//! User storage abstraction
//!
//! The auth service talks to users through [`UserStore`]. The PostgreSQL
//! repository is used in production; the in-memory store backs development
//! runs without `DATABASE_URL` and the test suite.

use std::future::Future;

use uuid::Uuid;

use crate::core::db::models::{NewUser, User};

/// User store error types
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistence operations the auth core needs.
///
/// `insert` must enforce username uniqueness atomically: of two concurrent
/// inserts with the same username exactly one succeeds and the other returns
/// [`UserStoreError::UsernameAlreadyExists`].
pub trait UserStore: Clone + Send + Sync + 'static {
    /// Find a user by exact (case-sensitive) username
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, UserStoreError>> + Send;

    /// Find a user by ID
    fn find_by_id(&self, id: Uuid)
    -> impl Future<Output = Result<Option<User>, UserStoreError>> + Send;

    /// Persist a new user and return the stored entity
    fn insert(&self, user: NewUser) -> impl Future<Output = Result<User, UserStoreError>> + Send;
}
