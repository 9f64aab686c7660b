//! UseCase: グループメッセージ送信
//!
//! 永続化されたメンバーシップを確認してから保存し、保存が成功した場合だけ
//! グループルームに配信する。送信者へのエコーは共有ルーム経由で届く。
//! 保存と配信は 1 つのタスクで実行し、呼び出し元が中断されても片方だけで終わらない。

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    Exclude, GroupId, GroupMessage, GroupRepository, MessageContent, MessageRepository,
    NewGroupMessage, Notification, RepositoryError, RoomId, RoomManager, Timestamp, UserId,
    UserRepository,
};

use super::error::SendMessageError;

pub struct SendGroupMessageUseCase {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    messages: Arc<dyn MessageRepository>,
    rooms: Arc<dyn RoomManager>,
    clock: Arc<dyn Clock>,
}

impl SendGroupMessageUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        messages: Arc<dyn MessageRepository>,
        rooms: Arc<dyn RoomManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            groups,
            messages,
            rooms,
            clock,
        }
    }

    /// グループメッセージを保存し、グループルームの全接続（送信者を含む）に配信する
    pub async fn execute(
        &self,
        sender_id: &UserId,
        group_id: GroupId,
        content: String,
    ) -> Result<GroupMessage, SendMessageError> {
        let content = MessageContent::new(content)?;

        let group = self
            .groups
            .find_by_id(&group_id)
            .await?
            .ok_or_else(|| SendMessageError::GroupNotFound(group_id.clone()))?;
        if !group.is_member(sender_id) {
            tracing::warn!(
                "User '{}' is not a member of group '{}', message rejected",
                sender_id,
                group_id
            );
            return Err(SendMessageError::NotGroupMember(group_id));
        }

        let sender = self
            .users
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| SendMessageError::SenderNotFound(sender_id.to_string()))?;

        let draft = NewGroupMessage {
            group_id,
            sender_id: sender.id,
            sender_name: sender.username,
            content,
            created_at: Timestamp::new(self.clock.now_millis()),
        };

        let messages = self.messages.clone();
        let rooms = self.rooms.clone();
        tokio::spawn(async move { persist_and_deliver(&*messages, &*rooms, draft).await })
            .await
            .map_err(|e| {
                tracing::error!("Group message delivery task failed: {}", e);
                SendMessageError::Persistence(RepositoryError::Unavailable(e.to_string()))
            })?
    }
}

async fn persist_and_deliver(
    messages: &dyn MessageRepository,
    rooms: &dyn RoomManager,
    draft: NewGroupMessage,
) -> Result<GroupMessage, SendMessageError> {
    // 1. 永続化
    let message = messages
        .insert_group(draft)
        .await
        .inspect_err(|e| tracing::error!("Failed to store group message: {}", e))?;

    // 2. 配信
    let delivered = rooms
        .broadcast(
            &RoomId::Group(message.group_id.clone()),
            &Notification::NewGroupMessage(message.clone()),
            Exclude::Nobody,
        )
        .await;

    tracing::info!(
        "Group message '{}' in '{}' delivered to {} connections",
        message.id,
        message.group_id,
        delivered
    );

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RepositoryError, repository::MockMessageRepository},
        usecase::{
            error::{ErrorKind, UseCaseError},
            test_support::{GatedRooms, TestContext, drain, group_id, wait_until},
        },
    };
    use std::time::Duration;

    fn usecase(ctx: &TestContext) -> SendGroupMessageUseCase {
        SendGroupMessageUseCase::new(
            ctx.users.clone(),
            ctx.groups.clone(),
            ctx.messages.clone(),
            ctx.hub.clone(),
            ctx.clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_group_message_reaches_room_including_sender() {
        // テスト項目: グループメッセージはルームの全接続（送信者を含む）に届く
        // given (前提条件):
        let ctx = TestContext::new();
        let alice = ctx.seed_user("alice", "Alice").await;
        ctx.seed_user("bob", "Bob").await;
        let g1 = ctx.seed_group("g1", "alice", &["bob"]).await;
        let (alice_conn, mut alice_rx) = ctx.connect("alice").await;
        let (bob_conn, mut bob_rx) = ctx.connect("bob").await;
        for id in [alice_conn, bob_conn] {
            ctx.hub.join(&id, RoomId::Group(g1.clone())).await;
        }

        // when (操作):
        let message = usecase(&ctx)
            .execute(&alice, g1.clone(), "hello".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        for rx in [&mut alice_rx, &mut bob_rx] {
            let frames = drain(rx);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["event"], "new_group_message");
            assert_eq!(frames[0]["data"]["roomId"], "g1");
            assert_eq!(frames[0]["data"]["id"], message.id.as_str());
        }
        assert_eq!(ctx.messages.group_history(&g1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_member_is_rejected_without_side_effects() {
        // テスト項目: メンバーでないユーザーの送信は認可エラーで、配信も保存もされない
        // given (前提条件):
        let ctx = TestContext::new();
        ctx.seed_user("alice", "Alice").await;
        let u3 = ctx.seed_user("u3", "Carol").await;
        let g = ctx.seed_group("g", "alice", &[]).await;
        let (alice_conn, mut alice_rx) = ctx.connect("alice").await;
        ctx.hub.join(&alice_conn, RoomId::Group(g.clone())).await;

        // when (操作):
        let result = usecase(&ctx)
            .execute(&u3, g.clone(), "hello".to_string())
            .await;

        // then (期待する結果):
        let error = result.unwrap_err();
        assert_eq!(error, SendMessageError::NotGroupMember(g.clone()));
        assert_eq!(error.kind(), ErrorKind::Forbidden);
        assert!(drain(&mut alice_rx).is_empty());
        assert!(ctx.messages.group_history(&g).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_group_and_empty_content() {
        // テスト項目: 存在しないグループは Forbidden（非メンバーと区別しない）、空の本文は Validation
        // given (前提条件):
        let ctx = TestContext::new();
        let alice = ctx.seed_user("alice", "Alice").await;
        let g1 = ctx.seed_group("g1", "alice", &[]).await;
        let usecase = usecase(&ctx);

        // when (操作):
        let unknown = usecase
            .execute(&alice, group_id("ghost"), "hello".to_string())
            .await;
        let empty = usecase.execute(&alice, g1, "\n\t".to_string()).await;

        // then (期待する結果):
        assert_eq!(unknown.unwrap_err().kind(), ErrorKind::Forbidden);
        assert_eq!(empty.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_aborted_caller_still_delivers_persisted_message() {
        // テスト項目: 保存後・配信前に呼び出し元が中断されても、グループルームに配信される
        // given (前提条件):
        let ctx = TestContext::new();
        let alice = ctx.seed_user("alice", "Alice").await;
        ctx.seed_user("bob", "Bob").await;
        let g1 = ctx.seed_group("g1", "alice", &["bob"]).await;
        let (bob_conn, mut bob_rx) = ctx.connect("bob").await;
        ctx.hub.join(&bob_conn, RoomId::Group(g1.clone())).await;
        let rooms = Arc::new(GatedRooms::closed(ctx.hub.clone()));
        let usecase = Arc::new(SendGroupMessageUseCase::new(
            ctx.users.clone(),
            ctx.groups.clone(),
            ctx.messages.clone(),
            rooms.clone(),
            ctx.clock.clone(),
        ));

        // when (操作): 配信の手前で止まっている間に呼び出し元を中断する
        let caller = {
            let usecase = usecase.clone();
            let (sender, group) = (alice.clone(), g1.clone());
            tokio::spawn(async move {
                usecase
                    .execute(&sender, group, "hello".to_string())
                    .await
            })
        };
        let (messages, group) = (&ctx.messages, &g1);
        let persisted = wait_until(|| async move {
            messages.group_history(group).await.unwrap().len() == 1
        })
        .await;
        caller.abort();
        rooms.open();

        // then (期待する結果):
        assert!(persisted);
        let raw = tokio::time::timeout(Duration::from_secs(1), bob_rx.recv())
            .await
            .expect("persisted message must be delivered")
            .unwrap();
        let frame: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(frame["event"], "new_group_message");
        assert_eq!(frame["data"]["roomId"], "g1");
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_broadcast() {
        // テスト項目: 保存に失敗した場合はルームに配信されない
        // given (前提条件):
        let ctx = TestContext::new();
        let alice = ctx.seed_user("alice", "Alice").await;
        let g1 = ctx.seed_group("g1", "alice", &[]).await;
        let (conn, mut rx) = ctx.connect("alice").await;
        ctx.hub.join(&conn, RoomId::Group(g1.clone())).await;
        let mut messages = MockMessageRepository::new();
        messages
            .expect_insert_group()
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let usecase = SendGroupMessageUseCase::new(
            ctx.users.clone(),
            ctx.groups.clone(),
            Arc::new(messages),
            ctx.hub.clone(),
            ctx.clock.clone(),
        );

        // when (操作):
        let result = usecase.execute(&alice, g1, "hello".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Persistence);
        assert!(drain(&mut rx).is_empty());
    }
}
