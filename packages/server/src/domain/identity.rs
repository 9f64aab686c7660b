//! Identity gateway

#[cfg(test)]
use mockall::automock;

use super::{error::IdentityError, value_object::UserId};

/// Bearer 認証情報を検証し、安定したユーザー ID を返す
#[cfg_attr(test, automock)]
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<UserId, IdentityError>;
}
