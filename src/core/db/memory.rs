//! In-memory user store
//!
//! Users are kept in two `DashMap`s (by id and by username). Nothing survives
//! a restart; this store is meant for local runs and tests.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::core::db::models::{NewUser, User};
use crate::core::db::store::{UserStore, UserStoreError};

/// DashMap-backed [`UserStore`]
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    by_username: Arc<DashMap<String, Uuid>>,
    users: Arc<DashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStoreError> {
        let Some(id) = self.by_username.get(username).map(|entry| *entry.value()) else {
            return Ok(None);
        };

        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let user = user.into_user();

        // The username shard stays locked until the user row is in place,
        // so a concurrent lookup never sees a dangling id.
        match self.by_username.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(UserStoreError::UsernameAlreadyExists),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }
}
