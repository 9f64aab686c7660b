//! UseCase: グループメッセージ履歴の取得

use std::sync::Arc;

use crate::domain::{GroupId, GroupMessage, GroupRepository, MessageRepository, UserId};

use super::error::HistoryError;

pub struct GetGroupHistoryUseCase {
    groups: Arc<dyn GroupRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl GetGroupHistoryUseCase {
    pub fn new(groups: Arc<dyn GroupRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { groups, messages }
    }

    /// グループの履歴を作成日時の昇順で返す。メンバーだけが参照できる。
    pub async fn execute(
        &self,
        user_id: &UserId,
        group_id: GroupId,
    ) -> Result<Vec<GroupMessage>, HistoryError> {
        let group = self
            .groups
            .find_by_id(&group_id)
            .await?
            .ok_or_else(|| HistoryError::GroupNotFound(group_id.clone()))?;
        if !group.is_member(user_id) {
            return Err(HistoryError::NotGroupMember(group_id));
        }

        let mut history = self.messages.group_history(&group_id).await?;
        history.sort_by_key(|m| m.created_at);
        Ok(history)
    }
}
