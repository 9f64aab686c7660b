//! UseCase: ダイレクトメッセージ履歴の取得

use std::sync::Arc;

use crate::domain::{DirectMessage, MessageRepository, UserId};

use super::error::HistoryError;

pub struct GetDirectHistoryUseCase {
    messages: Arc<dyn MessageRepository>,
}

impl GetDirectHistoryUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// 2 ユーザー間の履歴を作成日時の昇順で返す（同時刻は保存順）
    pub async fn execute(
        &self,
        user_id: &UserId,
        peer_id: &UserId,
    ) -> Result<Vec<DirectMessage>, HistoryError> {
        let mut history = self.messages.direct_between(user_id, peer_id).await?;
        history.sort_by_key(|m| m.created_at);
        Ok(history)
    }
}
