//! インメモリのリアルタイムハブ
//!
//! ## 責務
//!
//! - 接続ごとの `PusherChannel` を管理
//! - `PresenceTable` を使った接続・プレゼンス・ルームの管理（ConnectionRegistry, RoomManager）
//! - ルーム単位の配信（broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成とチャンネルの作成は UI 層で行われ、このハブはチャンネルを受け取って
//! 送信にだけ使う。対応表とチャンネルは 1 つの Mutex の内側にあり、1 回の broadcast は
//! ロックを保持したまま全メンバーのチャンネルに書き込む。そのため同じルームへの配信同士、
//! および配信と参加・退出・切断が交錯することはない。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ConnectionId, ConnectionRegistry, Exclude, Notification, PresenceTable, PusherChannel,
        RegistryError, RoomId, RoomManager, UserId,
    },
    infrastructure::dto::websocket::ServerFrame,
};

#[derive(Default)]
struct HubState {
    table: PresenceTable,
    channels: HashMap<ConnectionId, PusherChannel>,
}

/// ConnectionRegistry と RoomManager のインメモリ実装
#[derive(Default)]
pub struct InMemoryRealtimeHub {
    inner: Mutex<HubState>,
}

impl InMemoryRealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続数、オンラインユーザー数、ルーム数
    pub async fn stats(&self) -> (usize, usize, usize) {
        let state = self.inner.lock().await;
        (
            state.table.connection_count(),
            state.table.online_user_count(),
            state.table.room_count(),
        )
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryRealtimeHub {
    async fn attach(&self, connection_id: ConnectionId, channel: PusherChannel) {
        let mut state = self.inner.lock().await;
        if state.table.attach(connection_id) {
            state.channels.insert(connection_id, channel);
            tracing::debug!("Connection '{}' attached", connection_id);
        }
    }

    async fn register(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
    ) -> Result<(), RegistryError> {
        let mut state = self.inner.lock().await;
        if state.table.bind(connection_id, user_id.clone())? {
            tracing::info!(
                "Connection '{}' bound to user '{}' ({} live connections)",
                connection_id,
                user_id,
                state.table.connections_for(&user_id).len()
            );
        }
        Ok(())
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let mut state = self.inner.lock().await;
        state.channels.remove(connection_id);
        let detached = state.table.detach(connection_id)?;

        tracing::debug!(
            "Connection '{}' detached from {} rooms",
            connection_id,
            detached.rooms.len()
        );
        if detached.went_offline
            && let Some(user_id) = &detached.user_id
        {
            tracing::info!("User '{}' is now offline", user_id);
        }
        detached.user_id
    }

    async fn connections_for(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        let state = self.inner.lock().await;
        state.table.connections_for(user_id)
    }

    async fn user_of(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let state = self.inner.lock().await;
        state.table.user_of(connection_id).cloned()
    }
}

#[async_trait]
impl RoomManager for InMemoryRealtimeHub {
    async fn join(&self, connection_id: &ConnectionId, room_id: RoomId) -> bool {
        let mut state = self.inner.lock().await;
        let joined = state.table.join(connection_id, room_id.clone());
        if joined {
            tracing::debug!("Connection '{}' joined room '{}'", connection_id, room_id);
        }
        joined
    }

    async fn leave(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        let mut state = self.inner.lock().await;
        let left = state.table.leave(connection_id, room_id);
        if left {
            tracing::debug!("Connection '{}' left room '{}'", connection_id, room_id);
        }
        left
    }

    async fn is_joined(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        let state = self.inner.lock().await;
        state.table.is_joined(connection_id, room_id)
    }

    async fn members_of(&self, room_id: &RoomId) -> HashSet<ConnectionId> {
        let state = self.inner.lock().await;
        state.table.members_of(room_id)
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        notification: &Notification,
        exclude: Exclude,
    ) -> usize {
        let payload = match serde_json::to_string(&ServerFrame::from(notification)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize notification for '{}': {}", room_id, e);
                return 0;
            }
        };

        let state = self.inner.lock().await;
        let mut delivered = 0;

        for connection_id in state.table.members_of(room_id) {
            let skipped = match &exclude {
                Exclude::Nobody => false,
                Exclude::Connection(excluded) => excluded == &connection_id,
                Exclude::User(user_id) => state.table.user_of(&connection_id) == Some(user_id),
            };
            if skipped {
                continue;
            }

            let Some(channel) = state.channels.get(&connection_id) else {
                tracing::warn!(
                    "Connection '{}' has no pusher channel, skipping",
                    connection_id
                );
                continue;
            };
            // 切断処理中の接続への送信失敗は許容
            if let Err(e) = channel.send(payload.clone()) {
                tracing::warn!("Failed to push to connection '{}': {}", connection_id, e);
            } else {
                delivered += 1;
            }
        }

        tracing::debug!("Broadcast to '{}' reached {} connections", room_id, delivered);
        delivered
    }
}
