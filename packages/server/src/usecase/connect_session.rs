//! UseCase: ライブ接続の開始と認証
//!
//! 接続は最初に未認証として登録され、認証情報が検証できた時点でユーザーに紐付けられる。
//! 紐付けによって接続はユーザーのプライベートルームに参加し、以後のダイレクトメッセージを受け取る。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRegistry, IdentityVerifier, PusherChannel, User, UserRepository,
};

use super::error::ConnectError;

/// 接続開始・認証のユースケース
pub struct ConnectSessionUseCase {
    identity: Arc<dyn IdentityVerifier>,
    users: Arc<dyn UserRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectSessionUseCase {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        users: Arc<dyn UserRepository>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            identity,
            users,
            registry,
        }
    }

    /// 新しい接続と送信チャンネルを登録する
    ///
    /// ハンドシェイクで解決済みのユーザーがいればそのまま紐付け、いなければ未認証のまま残す。
    pub async fn open(
        &self,
        connection_id: ConnectionId,
        channel: PusherChannel,
        user: Option<&User>,
    ) -> Result<(), ConnectError> {
        self.registry.attach(connection_id, channel).await;
        if let Some(user) = user {
            self.registry
                .register(&connection_id, user.id.clone())
                .await?;
        }
        Ok(())
    }

    /// 認証情報からユーザーを解決する（REST の Bearer 認証でも使う）
    pub async fn resolve(&self, credential: &str) -> Result<User, ConnectError> {
        let user_id = self.identity.verify(credential)?;
        self.users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| ConnectError::UnknownUser(user_id.into_string()))
    }

    /// 接続を認証し、ユーザーに紐付ける
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - 紐付けたユーザー（同じユーザーへの再認証も成功）
    /// * `Err(ConnectError)` - 認証情報が不正、未知のユーザー、または別ユーザーに紐付け済み
    pub async fn authenticate(
        &self,
        connection_id: &ConnectionId,
        credential: &str,
    ) -> Result<User, ConnectError> {
        let user = self.resolve(credential).await?;
        self.registry
            .register(connection_id, user.id.clone())
            .await?;
        Ok(user)
    }
}
