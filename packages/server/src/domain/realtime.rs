//! Realtime delivery traits
//!
//! ライブ接続の管理（ConnectionRegistry）とルーム単位の配信（RoomManager）のインターフェース。
//! UseCase 層はこの trait に依存し、具体的な実装（インメモリのハブ）には依存しない。

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::RegistryError,
    notification::Notification,
    value_object::{ConnectionId, RoomId, UserId},
};

/// 接続ごとの送信チャンネル（シリアライズ済みのフレームを流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ブロードキャストで配信対象から外す接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclude {
    Nobody,
    Connection(ConnectionId),
    /// このユーザーに紐付いたすべてのライブ接続
    User(UserId),
}

/// ユーザー ID とライブ接続の対応を管理する
///
/// 未知の接続 ID に対する操作は何もしない（切断との競合は想定内）。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 未認証の接続と、その送信チャンネルを登録
    async fn attach(&self, connection_id: ConnectionId, channel: PusherChannel);

    /// 接続をユーザーに紐付ける。副作用としてユーザーのプライベートルームに参加する。
    async fn register(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
    ) -> Result<(), RegistryError>;

    /// 接続をプレゼンスと全てのルームから取り除き、紐付いていたユーザーを返す
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<UserId>;

    /// ユーザーのライブ接続の集合（オフラインなら空）
    async fn connections_for(&self, user_id: &UserId) -> HashSet<ConnectionId>;

    async fn user_of(&self, connection_id: &ConnectionId) -> Option<UserId>;
}

/// ルーム ID と購読中の接続の対応を管理し、ルーム単位で配信する
///
/// メンバーシップの認可はここでは行わない。グループルームへの参加・配信の前に
/// UseCase 層が永続化されたメンバーシップを確認する。
#[async_trait]
pub trait RoomManager: Send + Sync {
    /// 冪等な参加。新たに参加した場合 `true`。
    async fn join(&self, connection_id: &ConnectionId, room_id: RoomId) -> bool;

    /// 冪等な退出。実際に退出した場合 `true`。
    async fn leave(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool;

    async fn is_joined(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool;

    async fn members_of(&self, room_id: &RoomId) -> HashSet<ConnectionId>;

    /// ルームの全メンバー（`exclude` を除く）に通知を配信し、配信できた接続数を返す
    ///
    /// 1 回の配信は同じルームへの後続の配信に対してアトミックに行われる。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        notification: &Notification,
        exclude: Exclude,
    ) -> usize;
}
