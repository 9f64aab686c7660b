//! Repository trait 定義
//!
//! ドメイン層が必要とする永続化ゲートウェイのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 依存性の逆転（DIP）
//!
//! - ドメイン層が必要とするインターフェースをドメイン層自身が定義
//! - Infrastructure 層がドメイン層のインターフェースに依存
//! - UseCase 層はこの trait にのみ依存する

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::{
    entity::{DirectMessage, Group, GroupMessage, NewDirectMessage, NewGroupMessage, User},
    error::RepositoryError,
    value_object::{GroupId, UserId, Username},
};

/// User Repository trait
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを追加（ID またはユーザー名が重複する場合は Conflict）
    async fn insert(&self, user: User) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// ユーザー名で検索（大文字小文字を区別しない）
    async fn find_by_username(&self, username: &Username)
    -> Result<Option<User>, RepositoryError>;
}

/// Group Repository trait（永続化されたメンバーシップ）
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn insert(&self, group: Group) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, group_id: &GroupId) -> Result<Option<Group>, RepositoryError>;

    /// メンバーを追加。新たに追加された場合 `true`、存在しないグループは NotFound。
    async fn add_member(&self, group_id: &GroupId, user_id: UserId)
    -> Result<bool, RepositoryError>;

    /// ユーザーが所属するグループ一覧（作成日時の新しい順）
    async fn list_for_member(&self, user_id: &UserId) -> Result<Vec<Group>, RepositoryError>;
}

/// Message Repository trait
///
/// 書き込みが成功した時点で永続 ID が割り当てられる。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert_direct(
        &self,
        message: NewDirectMessage,
    ) -> Result<DirectMessage, RepositoryError>;

    async fn insert_group(&self, message: NewGroupMessage)
    -> Result<GroupMessage, RepositoryError>;

    /// 2 ユーザー間のダイレクトメッセージ（保存順）
    async fn direct_between(
        &self,
        user_a: &UserId,
        user_b: &UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;

    /// ユーザーが送信者または受信者であるダイレクトメッセージ（保存順）
    async fn direct_involving(&self, user_id: &UserId)
    -> Result<Vec<DirectMessage>, RepositoryError>;

    /// グループのメッセージ（保存順）
    async fn group_history(&self, group_id: &GroupId)
    -> Result<Vec<GroupMessage>, RepositoryError>;

    /// `peer` から `reader` 宛ての未読メッセージを既読にし、更新件数を返す
    async fn mark_direct_read(
        &self,
        reader: &UserId,
        peer: &UserId,
    ) -> Result<usize, RepositoryError>;
}
