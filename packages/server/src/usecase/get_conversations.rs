//! UseCase: 会話一覧の取得
//!
//! 会話の要約は保存せず、リクエストごとにダイレクトメッセージの履歴から集計する。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::domain::{
    ConversationSummary, MessageRepository, UserId, UserRepository, summarize_conversations,
};

use super::error::ConversationError;

pub struct GetConversationsUseCase {
    users: Arc<dyn UserRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl GetConversationsUseCase {
    pub fn new(users: Arc<dyn UserRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { users, messages }
    }

    /// 会話相手ごとの要約を、最終メッセージの新しい順で返す
    pub async fn execute(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConversationSummary>, ConversationError> {
        let messages = self.messages.direct_involving(user_id).await?;

        // 表示名は現在のユーザー情報を優先し、削除済みの相手はメッセージに残る名前を使う
        let mut names: HashMap<UserId, String> = HashMap::new();
        for message in &messages {
            if message.sender_id != *user_id {
                names
                    .entry(message.sender_id.clone())
                    .or_insert_with(|| message.sender_name.as_str().to_string());
            }
        }
        let peers: HashSet<&UserId> = messages
            .iter()
            .filter_map(|m| m.other_party(user_id))
            .collect();
        for peer_id in peers {
            if let Some(user) = self.users.find_by_id(peer_id).await? {
                names.insert(peer_id.clone(), user.username.into_string());
            }
        }

        Ok(summarize_conversations(user_id, &messages, |peer_id| {
            names
                .get(peer_id)
                .cloned()
                .unwrap_or_else(|| peer_id.to_string())
        }))
    }
}
