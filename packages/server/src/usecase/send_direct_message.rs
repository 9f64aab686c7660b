//! UseCase: ダイレクトメッセージ送信
//!
//! 送信は 2 段階で行う。
//!
//! 1. 永続化: 本文と宛先を検証し、メッセージを保存して永続 ID を得る
//! 2. 配信: 保存が成功した場合だけ、受信者と送信者それぞれのプライベートルームに配信する
//!
//! 保存に失敗した場合は何も配信されない。受信者がオフラインでも保存は行われ、
//! 次回の履歴取得で参照できる。
//!
//! 永続化と配信は 1 つのタスクで実行する。呼び出し元（接続の受信ループなど）が
//! 途中で中断されても、保存が始まった送信は配信まで完了する。

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    DirectMessage, Exclude, MessageContent, MessageRepository, NewDirectMessage, Notification,
    RepositoryError, RoomId, RoomManager, Timestamp, User, UserId, UserRepository, Username,
};

use super::error::SendMessageError;

/// ダイレクトメッセージの宛先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Id(String),
    /// 大文字小文字を区別せずに照合する
    Username(String),
}

impl Recipient {
    /// `toUserId` / `toUsername` から宛先を決める。両方ある場合は ID を優先する。
    pub fn from_parts(
        to_user_id: Option<String>,
        to_username: Option<String>,
    ) -> Result<Self, SendMessageError> {
        match (to_user_id, to_username) {
            (Some(id), _) if !id.trim().is_empty() => Ok(Recipient::Id(id)),
            (_, Some(name)) if !name.trim().is_empty() => Ok(Recipient::Username(name)),
            _ => Err(SendMessageError::InvalidRecipient(
                "toUserId or toUsername is required".to_string(),
            )),
        }
    }
}

pub struct SendDirectMessageUseCase {
    users: Arc<dyn UserRepository>,
    messages: Arc<dyn MessageRepository>,
    rooms: Arc<dyn RoomManager>,
    clock: Arc<dyn Clock>,
}

impl SendDirectMessageUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        messages: Arc<dyn MessageRepository>,
        rooms: Arc<dyn RoomManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            messages,
            rooms,
            clock,
        }
    }

    /// ダイレクトメッセージを保存し、受信者と送信者の全接続に配信する
    ///
    /// # Returns
    ///
    /// * `Ok(DirectMessage)` - 永続 ID とタイムスタンプを持つ保存済みメッセージ
    /// * `Err(SendMessageError)` - 検証・認可・永続化のいずれかで失敗（配信は行われない）
    pub async fn execute(
        &self,
        sender_id: &UserId,
        recipient: Recipient,
        content: String,
    ) -> Result<DirectMessage, SendMessageError> {
        let content = MessageContent::new(content)?;
        let recipient = self.resolve_recipient(recipient).await?;

        if &recipient.id == sender_id {
            return Err(SendMessageError::InvalidRecipient(
                "cannot send a direct message to yourself".to_string(),
            ));
        }

        let sender = self
            .users
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| SendMessageError::SenderNotFound(sender_id.to_string()))?;

        let draft = NewDirectMessage {
            sender_id: sender.id,
            sender_name: sender.username,
            recipient_id: recipient.id,
            content,
            created_at: Timestamp::new(self.clock.now_millis()),
        };

        let messages = self.messages.clone();
        let rooms = self.rooms.clone();
        tokio::spawn(async move { persist_and_deliver(&*messages, &*rooms, draft).await })
            .await
            .map_err(|e| {
                tracing::error!("Direct message delivery task failed: {}", e);
                SendMessageError::Persistence(RepositoryError::Unavailable(e.to_string()))
            })?
    }

    async fn resolve_recipient(&self, recipient: Recipient) -> Result<User, SendMessageError> {
        match recipient {
            Recipient::Id(raw) => {
                let user_id = UserId::new(raw.clone())
                    .map_err(|e| SendMessageError::InvalidRecipient(e.to_string()))?;
                self.users
                    .find_by_id(&user_id)
                    .await?
                    .ok_or(SendMessageError::RecipientNotFound(raw))
            }
            Recipient::Username(raw) => {
                let username = Username::new(raw.clone())
                    .map_err(|e| SendMessageError::InvalidRecipient(e.to_string()))?;
                self.users
                    .find_by_username(&username)
                    .await?
                    .ok_or(SendMessageError::RecipientNotFound(raw))
            }
        }
    }
}

async fn persist_and_deliver(
    messages: &dyn MessageRepository,
    rooms: &dyn RoomManager,
    draft: NewDirectMessage,
) -> Result<DirectMessage, SendMessageError> {
    // 1. 永続化
    let message = messages
        .insert_direct(draft)
        .await
        .inspect_err(|e| tracing::error!("Failed to store direct message: {}", e))?;

    // 2. 配信（受信者の全接続、送信者自身の全接続へのエコー）
    let notification = Notification::NewDirectMessage(message.clone());
    let to_recipient = rooms
        .broadcast(
            &RoomId::User(message.recipient_id.clone()),
            &notification,
            Exclude::Nobody,
        )
        .await;
    let echoed = rooms
        .broadcast(
            &RoomId::User(message.sender_id.clone()),
            &notification,
            Exclude::Nobody,
        )
        .await;

    tracing::info!(
        "Direct message '{}' from '{}' to '{}' delivered to {} recipient and {} sender connections",
        message.id,
        message.sender_id,
        message.recipient_id,
        to_recipient,
        echoed
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
            test_support::{GatedRooms, NOW, TestContext, drain, user_id, wait_until},
        },
    };
    use std::time::Duration;

    fn usecase(ctx: &TestContext) -> SendDirectMessageUseCase {
        SendDirectMessageUseCase::new(
            ctx.users.clone(),
            ctx.messages.clone(),
            ctx.hub.clone(),
            ctx.clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_direct_message_reaches_every_session_and_echoes() {
        // テスト項目: 受信者の全接続に 1 回ずつ届き、送信者の接続にもエコーされる
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        ctx.seed_user("u2", "Bob").await;
        let (_c1, mut c1_rx) = ctx.connect("u2").await;
        let (_c2, mut c2_rx) = ctx.connect("u2").await;
        let (_s, mut sender_rx) = ctx.connect("u1").await;

        // when (操作):
        let message = usecase(&ctx)
            .execute(&u1, Recipient::Id("u2".to_string()), "hi".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        for rx in [&mut c1_rx, &mut c2_rx, &mut sender_rx] {
            let frames = drain(rx);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["event"], "new_direct_message");
            assert_eq!(frames[0]["data"]["content"], "hi");
            assert_eq!(frames[0]["data"]["id"], message.id.as_str());
            assert_eq!(frames[0]["data"]["senderName"], "Alice");
        }
        assert_eq!(message.created_at, Timestamp::new(NOW));
    }

    #[tokio::test]
    async fn test_broadcast_message_is_already_in_history() {
        // テスト項目: 配信されたメッセージは履歴から取得できる
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        let u2 = ctx.seed_user("u2", "Bob").await;
        let (_c, mut rx) = ctx.connect("u2").await;

        // when (操作):
        usecase(&ctx)
            .execute(&u1, Recipient::Id("u2".to_string()), "hi".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let delivered = drain(&mut rx);
        let history = ctx.messages.direct_between(&u1, &u2).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(delivered[0]["data"]["id"], history[0].id.as_str());
    }

    #[tokio::test]
    async fn test_recipient_by_username_is_case_insensitive() {
        // テスト項目: ユーザー名による宛先指定は大文字小文字を区別しない
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        ctx.seed_user("u2", "Bob").await;

        // when (操作):
        let message = usecase(&ctx)
            .execute(&u1, Recipient::Username(" BOB ".to_string()), "yo".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.recipient_id, user_id("u2"));
    }

    #[tokio::test]
    async fn test_offline_recipient_still_persists() {
        // テスト項目: 受信者がオフラインでもメッセージは保存される（配信なしはエラーではない）
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        let u2 = ctx.seed_user("u2", "Bob").await;

        // when (操作):
        let result = usecase(&ctx)
            .execute(&u1, Recipient::Id("u2".to_string()), "later".to_string())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(ctx.messages.direct_between(&u1, &u2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_without_side_effects() {
        // テスト項目: 空の本文・自分宛て・存在しない宛先は保存も配信もされない
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        ctx.seed_user("u2", "Bob").await;
        let (_c, mut rx) = ctx.connect("u2").await;
        let usecase = usecase(&ctx);

        // when (操作):
        let empty = usecase
            .execute(&u1, Recipient::Id("u2".to_string()), "   ".to_string())
            .await;
        let to_self = usecase
            .execute(&u1, Recipient::Id("u1".to_string()), "me".to_string())
            .await;
        let unknown = usecase
            .execute(&u1, Recipient::Id("ghost".to_string()), "hi".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(empty.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(to_self.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            unknown,
            Err(SendMessageError::RecipientNotFound("ghost".to_string()))
        );
        assert!(drain(&mut rx).is_empty());
        assert!(ctx.messages.direct_involving(&u1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_broadcast() {
        // テスト項目: 保存に失敗した場合は配信されず、呼び出し元に失敗が返る
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        ctx.seed_user("u2", "Bob").await;
        let (_c, mut rx) = ctx.connect("u2").await;
        let (_s, mut sender_rx) = ctx.connect("u1").await;
        let mut messages = MockMessageRepository::new();
        messages
            .expect_insert_direct()
            .returning(|_| Err(RepositoryError::Unavailable("disk full".to_string())));
        let usecase = SendDirectMessageUseCase::new(
            ctx.users.clone(),
            Arc::new(messages),
            ctx.hub.clone(),
            ctx.clock.clone(),
        );

        // when (操作):
        let result = usecase
            .execute(&u1, Recipient::Id("u2".to_string()), "hi".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Persistence);
        assert!(drain(&mut rx).is_empty());
        assert!(drain(&mut sender_rx).is_empty());
    }

    #[tokio::test]
    async fn test_aborted_caller_still_delivers_persisted_message() {
        // テスト項目: 保存後・配信前に呼び出し元が中断されても、保存されたメッセージは配信される
        // given (前提条件):
        let ctx = TestContext::new();
        let u1 = ctx.seed_user("u1", "Alice").await;
        let u2 = ctx.seed_user("u2", "Bob").await;
        let (_c, mut rx) = ctx.connect("u2").await;
        let rooms = Arc::new(GatedRooms::closed(ctx.hub.clone()));
        let usecase = Arc::new(SendDirectMessageUseCase::new(
            ctx.users.clone(),
            ctx.messages.clone(),
            rooms.clone(),
            ctx.clock.clone(),
        ));

        // when (操作): 配信の手前で止まっている間に呼び出し元を中断する
        let caller = {
            let usecase = usecase.clone();
            let sender = u1.clone();
            tokio::spawn(async move {
                usecase
                    .execute(&sender, Recipient::Id("u2".to_string()), "hi".to_string())
                    .await
            })
        };
        let (messages, a, b) = (&ctx.messages, &u1, &u2);
        let persisted = wait_until(|| async move {
            messages.direct_between(a, b).await.unwrap().len() == 1
        })
        .await;
        caller.abort();
        rooms.open();

        // then (期待する結果):
        assert!(persisted);
        let raw = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("persisted message must be delivered")
            .unwrap();
        let frame: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(frame["event"], "new_direct_message");
        assert_eq!(frame["data"]["content"], "hi");
        assert!(caller.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_recipient_from_parts() {
        // テスト項目: 宛先は ID が優先され、どちらもなければ InvalidRecipient
        // then (期待する結果):
        assert_eq!(
            Recipient::from_parts(Some("u2".to_string()), Some("bob".to_string())),
            Ok(Recipient::Id("u2".to_string()))
        );
        assert_eq!(
            Recipient::from_parts(None, Some("bob".to_string())),
            Ok(Recipient::Username("bob".to_string()))
        );
        assert!(matches!(
            Recipient::from_parts(Some(" ".to_string()), None),
            Err(SendMessageError::InvalidRecipient(_))
        ));
    }
}
