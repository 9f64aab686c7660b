//! ライブ接続へプッシュする通知
//!
//! ドメイン側のイベント表現。ワイヤーフォーマットへの変換は Infrastructure 層の DTO が担う。

use super::{
    entity::{DirectMessage, GroupMessage},
    value_object::{GroupId, RoomId, UserId},
};

/// 入力が止まってからクライアントが停止シグナルを送るまでの猶予（ミリ秒）
pub const TYPING_IDLE_TIMEOUT_MS: u64 = 1200;

/// 入力中シグナルの宛先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingTarget {
    /// グループルームの他メンバー全員
    Room(GroupId),
    /// 相手ユーザーのプライベートルーム
    Peer(UserId),
}

impl TypingTarget {
    pub fn room_id(&self) -> RoomId {
        match self {
            TypingTarget::Room(group_id) => RoomId::Group(group_id.clone()),
            TypingTarget::Peer(user_id) => RoomId::User(user_id.clone()),
        }
    }
}

/// 入力中シグナル。永続化されず、最後に届いたものが有効。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSignal {
    pub from: UserId,
    pub target: TypingTarget,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NewDirectMessage(DirectMessage),
    NewGroupMessage(GroupMessage),
    Typing(TypingSignal),
}
