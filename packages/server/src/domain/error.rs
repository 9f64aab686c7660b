//! Domain errors.

use thiserror::Error;

/// 値オブジェクトの生成時に発生するバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is too long (max {max} characters, got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} contains invalid characters: '{value}'")]
    InvalidCharacters { field: &'static str, value: String },
}

/// 永続化ゲートウェイのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The durable store could not complete the operation; durable state is unchanged.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    Conflict { entity: &'static str, id: String },
}

/// 認証情報の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("credential is missing")]
    Missing,

    #[error("credential is malformed")]
    Malformed,

    #[error("credential signature does not match")]
    InvalidSignature,

    #[error("credential expired at {expired_at}")]
    Expired { expired_at: i64 },
}

/// Connection registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection {connection_id} is already bound to user '{bound_to}'")]
    AlreadyBound {
        connection_id: String,
        bound_to: String,
    },
}
