//! InMemory User Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, User, UserId, UserRepository, Username};

/// インメモリ User Repository 実装
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().await;

        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict {
                entity: "user",
                id: user.id.into_string(),
            });
        }
        let normalized = user.username.normalized();
        if users.values().any(|u| u.username.normalized() == normalized) {
            return Err(RepositoryError::Conflict {
                entity: "username",
                id: user.username.into_string(),
            });
        }

        tracing::debug!("User '{}' stored", user.id);
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users.get(user_id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let normalized = username.normalized();
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.username.normalized() == normalized)
            .cloned())
    }
}
