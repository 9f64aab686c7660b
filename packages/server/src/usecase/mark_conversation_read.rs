//! UseCase: 会話の既読化

use std::sync::Arc;

use crate::domain::{MessageRepository, UserId};

use super::error::ConversationError;

pub struct MarkConversationReadUseCase {
    messages: Arc<dyn MessageRepository>,
}

impl MarkConversationReadUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// `peer_id` から `reader_id` 宛ての未読メッセージを全て既読にし、更新件数を返す
    pub async fn execute(
        &self,
        reader_id: &UserId,
        peer_id: &UserId,
    ) -> Result<usize, ConversationError> {
        let updated = self.messages.mark_direct_read(reader_id, peer_id).await?;
        tracing::debug!(
            "Marked {} messages from '{}' as read by '{}'",
            updated,
            peer_id,
            reader_id
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageContent, NewDirectMessage, Timestamp, Username},
        usecase::test_support::{TestContext, user_id},
    };

    #[tokio::test]
    async fn test_mark_read_counts_only_incoming() {
        // テスト項目: 相手から届いた未読メッセージだけが既読になる
        // given (前提条件):
        let ctx = TestContext::new();
        for (from, to) in [("a", "b"), ("b", "a"), ("a", "b")] {
            ctx.messages
                .insert_direct(NewDirectMessage {
                    sender_id: user_id(from),
                    sender_name: Username::new(from.to_string()).unwrap(),
                    recipient_id: user_id(to),
                    content: MessageContent::new("hi".to_string()).unwrap(),
                    created_at: Timestamp::new(1_000),
                })
                .await
                .unwrap();
        }
        let usecase = MarkConversationReadUseCase::new(ctx.messages.clone());

        // when (操作):
        let updated = usecase.execute(&user_id("b"), &user_id("a")).await;

        // then (期待する結果):
        assert_eq!(updated, Ok(2));
    }
}
