//! UseCase 層のエラー定義
//!
//! 各 UseCase のエラーは `UseCaseError` を実装し、共通の分類（`ErrorKind`）と
//! 機械可読なコードを返す。UI 層はこれを HTTP ステータスや ack フレームに変換する。

use thiserror::Error;

use crate::domain::{GroupId, IdentityError, RegistryError, RepositoryError, ValueObjectError};

/// エラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 入力が不正（空の本文、宛先なしなど）。副作用なしで同期的に拒否される。
    Validation,
    /// 認証情報がない、または不正
    Unauthenticated,
    /// 認証済みだが権限がない（グループのメンバーでないなど）
    Forbidden,
    NotFound,
    /// 永続化ストアが利用できない。配信は行われず、永続状態は変化しない。
    Persistence,
}

pub trait UseCaseError: std::error::Error {
    fn kind(&self) -> ErrorKind;

    /// 機械可読なエラーコード
    fn code(&self) -> &'static str;
}

/// セッション認証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] IdentityError),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    AlreadyBound(#[from] RegistryError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl UseCaseError for ConnectError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConnectError::InvalidCredential(_) | ConnectError::UnknownUser(_) => {
                ErrorKind::Unauthenticated
            }
            ConnectError::AlreadyBound(_) => ErrorKind::Forbidden,
            ConnectError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ConnectError::InvalidCredential(_) | ConnectError::UnknownUser(_) => "unauthenticated",
            ConnectError::AlreadyBound(_) => "already_authenticated",
            ConnectError::Persistence(_) => "persistence_failure",
        }
    }
}

/// グループルーム参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinGroupError {
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("not a member of group {0}")]
    NotGroupMember(GroupId),

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl UseCaseError for JoinGroupError {
    fn kind(&self) -> ErrorKind {
        match self {
            // 存在しないグループも非メンバーと同じ扱い（グループの有無を漏らさない）
            JoinGroupError::GroupNotFound(_) | JoinGroupError::NotGroupMember(_) => {
                ErrorKind::Forbidden
            }
            JoinGroupError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            JoinGroupError::GroupNotFound(_) | JoinGroupError::NotGroupMember(_) => {
                "not_group_member"
            }
            JoinGroupError::Persistence(_) => "persistence_failure",
        }
    }
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("invalid message: {0}")]
    InvalidContent(#[from] ValueObjectError),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("sender not found: {0}")]
    SenderNotFound(String),

    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("not a member of group {0}")]
    NotGroupMember(GroupId),

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl UseCaseError for SendMessageError {
    fn kind(&self) -> ErrorKind {
        match self {
            SendMessageError::InvalidContent(_) | SendMessageError::InvalidRecipient(_) => {
                ErrorKind::Validation
            }
            SendMessageError::RecipientNotFound(_) => ErrorKind::NotFound,
            SendMessageError::SenderNotFound(_) => ErrorKind::Unauthenticated,
            SendMessageError::GroupNotFound(_) | SendMessageError::NotGroupMember(_) => {
                ErrorKind::Forbidden
            }
            SendMessageError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            SendMessageError::InvalidContent(_) => "invalid_content",
            SendMessageError::InvalidRecipient(_) => "invalid_recipient",
            SendMessageError::RecipientNotFound(_) => "recipient_not_found",
            SendMessageError::SenderNotFound(_) => "unauthenticated",
            SendMessageError::GroupNotFound(_) | SendMessageError::NotGroupMember(_) => {
                "not_group_member"
            }
            SendMessageError::Persistence(_) => "persistence_failure",
        }
    }
}

/// 入力中シグナル中継のエラー（呼び出し元ではログに残すだけ）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    #[error("typing target must be exactly one of roomId or peerId")]
    MissingTarget,

    #[error("invalid typing target: {0}")]
    InvalidTarget(#[from] ValueObjectError),

    #[error("cannot signal typing to yourself")]
    SelfTarget,

    #[error("connection has not joined group {0}")]
    NotJoined(GroupId),
}

impl UseCaseError for TypingError {
    fn kind(&self) -> ErrorKind {
        match self {
            TypingError::MissingTarget
            | TypingError::InvalidTarget(_)
            | TypingError::SelfTarget => ErrorKind::Validation,
            TypingError::NotJoined(_) => ErrorKind::Forbidden,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TypingError::MissingTarget => "missing_target",
            TypingError::InvalidTarget(_) => "invalid_target",
            TypingError::SelfTarget => "self_target",
            TypingError::NotJoined(_) => "not_joined",
        }
    }
}

/// 履歴取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("not a member of group {0}")]
    NotGroupMember(GroupId),

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl UseCaseError for HistoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            HistoryError::GroupNotFound(_) | HistoryError::NotGroupMember(_) => {
                ErrorKind::Forbidden
            }
            HistoryError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            HistoryError::GroupNotFound(_) | HistoryError::NotGroupMember(_) => {
                "not_group_member"
            }
            HistoryError::Persistence(_) => "persistence_failure",
        }
    }
}

/// 会話一覧取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl UseCaseError for ConversationError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Persistence
    }

    fn code(&self) -> &'static str {
        "persistence_failure"
    }
}

/// グループ管理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupManagementError {
    #[error("invalid input: {0}")]
    Invalid(#[from] ValueObjectError),

    #[error("userId or username is required")]
    MissingMember,

    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("not a member of group {0}")]
    NotGroupMember(GroupId),

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

impl UseCaseError for GroupManagementError {
    fn kind(&self) -> ErrorKind {
        match self {
            GroupManagementError::Invalid(_) | GroupManagementError::MissingMember => {
                ErrorKind::Validation
            }
            GroupManagementError::GroupNotFound(_) | GroupManagementError::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            GroupManagementError::NotGroupMember(_) => ErrorKind::Forbidden,
            GroupManagementError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GroupManagementError::Invalid(_) => "invalid_input",
            GroupManagementError::MissingMember => "missing_member",
            GroupManagementError::GroupNotFound(_) => "group_not_found",
            GroupManagementError::UserNotFound(_) => "user_not_found",
            GroupManagementError::NotGroupMember(_) => "not_group_member",
            GroupManagementError::Persistence(_) => "persistence_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_error_classification() {
        // テスト項目: 送信エラーが分類ごとに正しい種別になる
        // given (前提条件):
        let group_id = GroupId::new("g1".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(
            SendMessageError::InvalidContent(ValueObjectError::Empty {
                field: "message content"
            })
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SendMessageError::NotGroupMember(group_id).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            SendMessageError::Persistence(RepositoryError::Unavailable("down".to_string())).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn test_unknown_group_is_indistinguishable_from_non_member() {
        // テスト項目: 存在しないグループへの参加・送信・履歴取得は非メンバーと同じ Forbidden になる
        // given (前提条件):
        let group_id = GroupId::new("ghost".to_string()).unwrap();

        // when (操作):
        let join = JoinGroupError::GroupNotFound(group_id.clone());
        let send = SendMessageError::GroupNotFound(group_id.clone());
        let history = HistoryError::GroupNotFound(group_id.clone());

        // then (期待する結果):
        assert_eq!(join.kind(), ErrorKind::Forbidden);
        assert_eq!(join.code(), "not_group_member");
        assert_eq!(send.kind(), ErrorKind::Forbidden);
        assert_eq!(send.code(), "not_group_member");
        assert_eq!(history.kind(), ErrorKind::Forbidden);
        assert_eq!(history.code(), "not_group_member");
        assert_eq!(
            GroupManagementError::GroupNotFound(group_id).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_connect_error_is_unauthenticated() {
        // テスト項目: 認証情報の検証失敗は unauthenticated に分類される
        // when (操作):
        let error = ConnectError::from(IdentityError::Expired { expired_at: 1 });

        // then (期待する結果):
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
        assert_eq!(error.code(), "unauthenticated");
    }
}
