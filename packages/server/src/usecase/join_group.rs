//! UseCase: グループルームへの参加
//!
//! ルーム管理自体は認可を行わないため、参加の前に永続化されたメンバーシップを確認する。

use std::sync::Arc;

use crate::domain::{ConnectionId, GroupId, GroupRepository, RoomId, RoomManager, UserId};

use super::error::JoinGroupError;

pub struct JoinGroupUseCase {
    groups: Arc<dyn GroupRepository>,
    rooms: Arc<dyn RoomManager>,
}

impl JoinGroupUseCase {
    pub fn new(groups: Arc<dyn GroupRepository>, rooms: Arc<dyn RoomManager>) -> Self {
        Self { groups, rooms }
    }

    /// 接続をグループルームに参加させる
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 新たに参加した
    /// * `Ok(false)` - 既に参加済み（冪等）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
        group_id: GroupId,
    ) -> Result<bool, JoinGroupError> {
        let group = self
            .groups
            .find_by_id(&group_id)
            .await?
            .ok_or_else(|| JoinGroupError::GroupNotFound(group_id.clone()))?;

        if !group.is_member(user_id) {
            tracing::warn!("User '{}' tried to join group '{}' without membership", user_id, group_id);
            return Err(JoinGroupError::NotGroupMember(group_id));
        }

        Ok(self.rooms.join(connection_id, RoomId::Group(group_id)).await)
    }
}
