//! UseCase: グループへのメンバー追加
//!
//! 追加できるのは既存のメンバーだけ。既に所属しているユーザーの追加は何もしない。

use std::sync::Arc;

use crate::domain::{Group, GroupId, GroupRepository, User, UserId, UserRepository, Username};

use super::error::GroupManagementError;

/// 追加するユーザーの指定方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    Id(String),
    Username(String),
}

impl MemberRef {
    pub fn from_parts(
        user_id: Option<String>,
        username: Option<String>,
    ) -> Result<Self, GroupManagementError> {
        match (user_id, username) {
            (Some(id), _) if !id.trim().is_empty() => Ok(MemberRef::Id(id)),
            (_, Some(name)) if !name.trim().is_empty() => Ok(MemberRef::Username(name)),
            _ => Err(GroupManagementError::MissingMember),
        }
    }
}

pub struct AddGroupMemberUseCase {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl AddGroupMemberUseCase {
    pub fn new(users: Arc<dyn UserRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self { users, groups }
    }

    /// メンバーを追加し、更新後のグループを返す
    pub async fn execute(
        &self,
        actor_id: &UserId,
        group_id: GroupId,
        member: MemberRef,
    ) -> Result<Group, GroupManagementError> {
        let mut group = self
            .groups
            .find_by_id(&group_id)
            .await?
            .ok_or_else(|| GroupManagementError::GroupNotFound(group_id.clone()))?;
        if !group.is_member(actor_id) {
            return Err(GroupManagementError::NotGroupMember(group_id));
        }

        let user = self.resolve(member).await?;
        if self.groups.add_member(&group_id, user.id.clone()).await? {
            tracing::info!(
                "User '{}' added to group '{}' by '{}'",
                user.id,
                group_id,
                actor_id
            );
        }
        group.add_member(user.id);
        Ok(group)
    }

    async fn resolve(&self, member: MemberRef) -> Result<User, GroupManagementError> {
        match member {
            MemberRef::Id(raw) => {
                let user_id = UserId::new(raw.clone())?;
                self.users
                    .find_by_id(&user_id)
                    .await?
                    .ok_or(GroupManagementError::UserNotFound(raw))
            }
            MemberRef::Username(raw) => {
                let username = Username::new(raw.clone())?;
                self.users
                    .find_by_username(&username)
                    .await?
                    .ok_or(GroupManagementError::UserNotFound(raw))
            }
        }
    }
}
