//! UseCase: ライブ接続の切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, UserId};

/// 切断のユースケース
///
/// 切断は即時かつ無条件。接続はプレゼンスと参加中の全ルームから同期的に取り除かれる。
pub struct DisconnectSessionUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectSessionUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行し、紐付いていたユーザーを返す（未認証・未知の接続は `None`）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let user_id = self.registry.unregister(connection_id).await;
        match &user_id {
            Some(user_id) => {
                tracing::info!("Connection '{}' of '{}' disconnected", connection_id, user_id)
            }
            None => tracing::debug!("Unauthenticated connection '{}' disconnected", connection_id),
        }
        user_id
    }
}
