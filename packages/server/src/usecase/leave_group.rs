//! UseCase: グループルームからの退出

use std::sync::Arc;

use crate::domain::{ConnectionId, GroupId, RoomId, RoomManager};

pub struct LeaveGroupUseCase {
    rooms: Arc<dyn RoomManager>,
}

impl LeaveGroupUseCase {
    pub fn new(rooms: Arc<dyn RoomManager>) -> Self {
        Self { rooms }
    }

    /// 冪等な退出。実際に退出した場合 `true`。
    ///
    /// 退出はメンバーシップを変更しないため認可は不要。
    pub async fn execute(&self, connection_id: &ConnectionId, group_id: GroupId) -> bool {
        self.rooms
            .leave(connection_id, &RoomId::Group(group_id))
            .await
    }
}
