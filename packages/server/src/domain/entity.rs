//! Entities

use super::value_object::{
    GroupId, GroupName, MessageContent, MessageId, Timestamp, UserId, Username,
};

/// ユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
}

impl User {
    pub fn new(id: UserId, username: Username) -> Self {
        Self { id, username }
    }
}

/// グループ（永続化されたメンバーシップを持つ）
///
/// ライブ接続のルーム購読とは別物で、送信・参加可否の判定に使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: GroupName,
    pub created_by: UserId,
    /// 追加順に並んだメンバー。作成者が先頭。
    pub member_ids: Vec<UserId>,
    pub created_at: Timestamp,
}

impl Group {
    /// 作成者を最初のメンバーとしてグループを作る
    pub fn new(id: GroupId, name: GroupName, created_by: UserId, created_at: Timestamp) -> Self {
        Self {
            id,
            name,
            member_ids: vec![created_by.clone()],
            created_by,
            created_at,
        }
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.member_ids.contains(user_id)
    }

    /// メンバーを追加する。既に所属している場合は何もしない。
    ///
    /// # Returns
    ///
    /// 新たに追加された場合は `true`
    pub fn add_member(&mut self, user_id: UserId) -> bool {
        if self.is_member(&user_id) {
            return false;
        }
        self.member_ids.push(user_id);
        true
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

/// 永続化前のダイレクトメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDirectMessage {
    pub sender_id: UserId,
    pub sender_name: Username,
    pub recipient_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl NewDirectMessage {
    /// Attach the durable id. Freshly stored messages are unread.
    pub fn into_persisted(self, id: MessageId) -> DirectMessage {
        DirectMessage {
            id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            recipient_id: self.recipient_id,
            content: self.content,
            created_at: self.created_at,
            is_read: false,
        }
    }
}

/// 永続化済みのダイレクトメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: Username,
    pub recipient_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
    pub is_read: bool,
}

impl DirectMessage {
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.sender_id == user_id || &self.recipient_id == user_id
    }

    /// `user_id` から見た会話相手。`user_id` が当事者でなければ `None`。
    pub fn other_party(&self, user_id: &UserId) -> Option<&UserId> {
        if &self.sender_id == user_id {
            Some(&self.recipient_id)
        } else if &self.recipient_id == user_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }

    /// `reader` 宛てで未読のメッセージか
    pub fn is_unread_by(&self, reader: &UserId) -> bool {
        &self.recipient_id == reader && !self.is_read
    }
}

/// 永続化前のグループメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroupMessage {
    pub group_id: GroupId,
    pub sender_id: UserId,
    pub sender_name: Username,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl NewGroupMessage {
    pub fn into_persisted(self, id: MessageId) -> GroupMessage {
        GroupMessage {
            id,
            group_id: self.group_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// 永続化済みのグループメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMessage {
    pub id: MessageId,
    pub group_id: GroupId,
    pub sender_id: UserId,
    pub sender_name: Username,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

/// Per-peer conversation summary, derived from direct message history on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub peer_id: UserId,
    pub peer_name: String,
    pub last_message: String,
    pub last_message_at: Timestamp,
    pub unread_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_id(raw: &str) -> UserId {
        UserId::new(raw.to_string()).unwrap()
    }

    fn direct(sender: &str, recipient: &str) -> DirectMessage {
        NewDirectMessage {
            sender_id: user_id(sender),
            sender_name: Username::new(sender.to_string()).unwrap(),
            recipient_id: user_id(recipient),
            content: MessageContent::new("hi".to_string()).unwrap(),
            created_at: Timestamp::new(1_000),
        }
        .into_persisted(MessageId::generate())
    }

    #[test]
    fn test_group_creator_is_first_member() {
        // テスト項目: グループ作成者が最初のメンバーになる
        // when (操作):
        let group = Group::new(
            GroupId::new("g1".to_string()).unwrap(),
            GroupName::new("friends".to_string()).unwrap(),
            user_id("alice"),
            Timestamp::new(0),
        );

        // then (期待する結果):
        assert_eq!(group.member_ids, vec![user_id("alice")]);
        assert_eq!(group.member_count(), 1);
    }

    #[test]
    fn test_group_add_member_is_idempotent() {
        // テスト項目: 同じメンバーを 2 回追加しても 1 人として扱われる
        // given (前提条件):
        let mut group = Group::new(
            GroupId::new("g1".to_string()).unwrap(),
            GroupName::new("friends".to_string()).unwrap(),
            user_id("alice"),
            Timestamp::new(0),
        );

        // when (操作):
        let first = group.add_member(user_id("bob"));
        let second = group.add_member(user_id("bob"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(group.member_count(), 2);
    }

    #[test]
    fn test_direct_message_other_party() {
        // テスト項目: 当事者から見た会話相手が取得できる
        // given (前提条件):
        let message = direct("alice", "bob");

        // then (期待する結果):
        assert_eq!(message.other_party(&user_id("alice")), Some(&user_id("bob")));
        assert_eq!(message.other_party(&user_id("bob")), Some(&user_id("alice")));
        assert_eq!(message.other_party(&user_id("carol")), None);
    }

    #[test]
    fn test_new_direct_message_is_unread_for_recipient_only() {
        // テスト項目: 保存直後のメッセージは受信者にとってのみ未読
        // given (前提条件):
        let message = direct("alice", "bob");

        // then (期待する結果):
        assert!(message.is_unread_by(&user_id("bob")));
        assert!(!message.is_unread_by(&user_id("alice")));
    }
}
