//! InMemory Message Repository 実装
//!
//! メッセージは保存順の Vec に追記される。書き込みが成功した時点で永続 ID を割り当てる。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    DirectMessage, GroupId, GroupMessage, MessageId, MessageRepository, NewDirectMessage,
    NewGroupMessage, RepositoryError, UserId,
};

/// インメモリ Message Repository 実装
#[derive(Default)]
pub struct InMemoryMessageRepository {
    direct: Mutex<Vec<DirectMessage>>,
    group: Mutex<Vec<GroupMessage>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert_direct(
        &self,
        message: NewDirectMessage,
    ) -> Result<DirectMessage, RepositoryError> {
        let persisted = message.into_persisted(MessageId::generate());
        self.direct.lock().await.push(persisted.clone());
        Ok(persisted)
    }

    async fn insert_group(
        &self,
        message: NewGroupMessage,
    ) -> Result<GroupMessage, RepositoryError> {
        let persisted = message.into_persisted(MessageId::generate());
        self.group.lock().await.push(persisted.clone());
        Ok(persisted)
    }

    async fn direct_between(
        &self,
        user_a: &UserId,
        user_b: &UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let direct = self.direct.lock().await;
        Ok(direct
            .iter()
            .filter(|m| {
                (&m.sender_id == user_a && &m.recipient_id == user_b)
                    || (&m.sender_id == user_b && &m.recipient_id == user_a)
            })
            .cloned()
            .collect())
    }

    async fn direct_involving(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let direct = self.direct.lock().await;
        Ok(direct
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect())
    }

    async fn group_history(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupMessage>, RepositoryError> {
        let group = self.group.lock().await;
        Ok(group
            .iter()
            .filter(|m| &m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn mark_direct_read(
        &self,
        reader: &UserId,
        peer: &UserId,
    ) -> Result<usize, RepositoryError> {
        let mut direct = self.direct.lock().await;
        let mut updated = 0;
        for message in direct
            .iter_mut()
            .filter(|m| &m.sender_id == peer && m.is_unread_by(reader))
        {
            message.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}
