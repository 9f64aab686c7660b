//! UseCase: グループ作成

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{Group, GroupId, GroupName, GroupRepository, Timestamp, UserId};

use super::error::GroupManagementError;

pub struct CreateGroupUseCase {
    groups: Arc<dyn GroupRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateGroupUseCase {
    pub fn new(groups: Arc<dyn GroupRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { groups, clock }
    }

    /// 作成者を最初のメンバーとしてグループを作る
    pub async fn execute(
        &self,
        creator_id: &UserId,
        name: String,
    ) -> Result<Group, GroupManagementError> {
        let name = GroupName::new(name)?;
        let group = Group::new(
            GroupId::generate(),
            name,
            creator_id.clone(),
            Timestamp::new(self.clock.now_millis()),
        );
        self.groups.insert(group.clone()).await?;

        tracing::info!("Group '{}' created by '{}'", group.id, creator_id);
        Ok(group)
    }
}
