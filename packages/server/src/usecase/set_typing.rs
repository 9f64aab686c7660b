//! UseCase: 入力中シグナルの中継
//!
//! 入力中シグナルは永続化も確認応答もしない。受信側は最後に届いたシグナルを有効とみなす。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Exclude, GroupId, Notification, RoomId, RoomManager, TypingSignal, TypingTarget,
    UserId,
};

use super::error::TypingError;

pub struct SetTypingUseCase {
    rooms: Arc<dyn RoomManager>,
}

impl SetTypingUseCase {
    pub fn new(rooms: Arc<dyn RoomManager>) -> Self {
        Self { rooms }
    }

    /// 入力中シグナルを中継し、届いた接続数を返す
    ///
    /// * ルーム宛て: 送信側の接続がそのルームに参加している必要がある。送信者の全接続を除いて配信する。
    /// * 相手宛て: 相手のプライベートルームにだけ配信する。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        sender_id: &UserId,
        room_id: Option<String>,
        peer_id: Option<String>,
        is_typing: bool,
    ) -> Result<usize, TypingError> {
        let target = match (room_id, peer_id) {
            (Some(room_id), None) => TypingTarget::Room(GroupId::new(room_id)?),
            (None, Some(peer_id)) => TypingTarget::Peer(UserId::new(peer_id)?),
            _ => return Err(TypingError::MissingTarget),
        };

        let (room, exclude) = match &target {
            TypingTarget::Room(group_id) => {
                let room = RoomId::Group(group_id.clone());
                if !self.rooms.is_joined(connection_id, &room).await {
                    return Err(TypingError::NotJoined(group_id.clone()));
                }
                (room, Exclude::User(sender_id.clone()))
            }
            TypingTarget::Peer(peer_id) => {
                if peer_id == sender_id {
                    return Err(TypingError::SelfTarget);
                }
                (RoomId::User(peer_id.clone()), Exclude::Nobody)
            }
        };

        let notification = Notification::Typing(TypingSignal {
            from: sender_id.clone(),
            target,
            is_typing,
        });
        let delivered = self.rooms.broadcast(&room, &notification, exclude).await;

        tracing::debug!(
            "Typing({}) from '{}' relayed to {} connections in '{}'",
            is_typing,
            sender_id,
            delivered,
            room
        );
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{TestContext, drain, group_id, user_id};

    #[tokio::test]
    async fn test_peer_typing_reaches_only_the_peer() {
        // テスト項目: 相手宛ての入力中シグナルは相手にだけ、送った順に届く
        // given (前提条件):
        let ctx = TestContext::new();
        let (u1_conn, mut u1_rx) = ctx.connect("u1").await;
        let (_u2_conn, mut u2_rx) = ctx.connect("u2").await;
        let (_u3_conn, mut u3_rx) = ctx.connect("u3").await;
        let usecase = SetTypingUseCase::new(ctx.hub.clone());

        // when (操作):
        usecase
            .execute(&u1_conn, &user_id("u1"), None, Some("u2".to_string()), true)
            .await
            .unwrap();
        usecase
            .execute(&u1_conn, &user_id("u1"), None, Some("u2".to_string()), false)
            .await
            .unwrap();

        // then (期待する結果):
        let frames = drain(&mut u2_rx);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["data"]["isTyping"], true);
        assert_eq!(frames[1]["data"]["isTyping"], false);
        assert_eq!(frames[0]["data"]["from"], "u1");
        assert!(drain(&mut u1_rx).is_empty());
        assert!(drain(&mut u3_rx).is_empty());
    }

    #[tokio::test]
    async fn test_room_typing_excludes_every_sender_session() {
        // テスト項目: ルーム宛ての入力中シグナルは送信者の全接続を除くメンバーに届く
        // given (前提条件):
        let ctx = TestContext::new();
        let room = RoomId::Group(group_id("g1"));
        let (a1, mut a1_rx) = ctx.connect("alice").await;
        let (a2, mut a2_rx) = ctx.connect("alice").await;
        let (b, mut b_rx) = ctx.connect("bob").await;
        for id in [a1, a2, b] {
            ctx.hub.join(&id, room.clone()).await;
        }
        let usecase = SetTypingUseCase::new(ctx.hub.clone());

        // when (操作):
        let delivered = usecase
            .execute(&a1, &user_id("alice"), Some("g1".to_string()), None, true)
            .await;

        // then (期待する結果):
        assert_eq!(delivered, Ok(1));
        assert_eq!(drain(&mut b_rx)[0]["data"]["roomId"], "g1");
        assert!(drain(&mut a1_rx).is_empty());
        assert!(drain(&mut a2_rx).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_targets_are_rejected() {
        // テスト項目: 宛先なし・両方指定・自分宛て・未参加ルームは拒否される
        // given (前提条件):
        let ctx = TestContext::new();
        let (conn, _rx) = ctx.connect("alice").await;
        let usecase = SetTypingUseCase::new(ctx.hub.clone());
        let alice = user_id("alice");

        // when (操作):
        let none = usecase.execute(&conn, &alice, None, None, true).await;
        let both = usecase
            .execute(
                &conn,
                &alice,
                Some("g1".to_string()),
                Some("bob".to_string()),
                true,
            )
            .await;
        let to_self = usecase
            .execute(&conn, &alice, None, Some("alice".to_string()), true)
            .await;
        let not_joined = usecase
            .execute(&conn, &alice, Some("g1".to_string()), None, true)
            .await;

        // then (期待する結果):
        assert_eq!(none, Err(TypingError::MissingTarget));
        assert_eq!(both, Err(TypingError::MissingTarget));
        assert_eq!(to_self, Err(TypingError::SelfTarget));
        assert_eq!(not_joined, Err(TypingError::NotJoined(group_id("g1"))));
    }
}
