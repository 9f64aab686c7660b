//! UseCase: 所属グループ一覧

use std::sync::Arc;

use crate::domain::{Group, GroupRepository, UserId};

use super::error::GroupManagementError;

pub struct ListGroupsUseCase {
    groups: Arc<dyn GroupRepository>,
}

impl ListGroupsUseCase {
    pub fn new(groups: Arc<dyn GroupRepository>) -> Self {
        Self { groups }
    }

    /// ユーザーが所属するグループを作成日時の新しい順で返す
    pub async fn execute(&self, user_id: &UserId) -> Result<Vec<Group>, GroupManagementError> {
        Ok(self.groups.list_for_member(user_id).await?)
    }
}
