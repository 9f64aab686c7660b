//! InMemory Group Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Group, GroupId, GroupRepository, RepositoryError, UserId};

/// インメモリ Group Repository 実装
#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Mutex<HashMap<GroupId, Group>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn insert(&self, group: Group) -> Result<(), RepositoryError> {
        let mut groups = self.groups.lock().await;
        if groups.contains_key(&group.id) {
            return Err(RepositoryError::Conflict {
                entity: "group",
                id: group.id.into_string(),
            });
        }
        tracing::debug!("Group '{}' stored", group.id);
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn find_by_id(&self, group_id: &GroupId) -> Result<Option<Group>, RepositoryError> {
        let groups = self.groups.lock().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn add_member(
        &self,
        group_id: &GroupId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut groups = self.groups.lock().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "group",
                id: group_id.to_string(),
            })?;
        Ok(group.add_member(user_id))
    }

    async fn list_for_member(&self, user_id: &UserId) -> Result<Vec<Group>, RepositoryError> {
        let groups = self.groups.lock().await;
        let mut result: Vec<Group> = groups
            .values()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect();

        // Newest first, id as a stable tiebreak
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(result)
    }
}
