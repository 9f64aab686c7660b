//! HMAC-SHA256 で署名された Bearer トークン
//!
//! トークン形式: `<user_id>.<expires_at_millis>.<hex(hmac_sha256(secret, "<user_id>.<expires_at_millis>"))>`
//!
//! ユーザー ID は英数字・`-`・`_` のみで構成されるため、`.` を区切りに使える。

use std::sync::Arc;

use ::hmac::{Hmac, Mac};
use hiroba_shared::time::Clock;
use sha2::Sha256;
use thiserror::Error;

use crate::domain::{IdentityError, IdentityVerifier, UserId};

type HmacSha256 = Hmac<Sha256>;

/// 24 時間
pub const DEFAULT_TOKEN_TTL_MILLIS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum IdentityConfigError {
    #[error("token secret must not be empty")]
    EmptySecret,

    #[error("invalid token secret: {0}")]
    InvalidKey(String),
}

/// Identity gateway backed by a shared HMAC secret
pub struct HmacIdentityGateway {
    /// 鍵を設定済みの MAC。署名・検証のたびに clone して使う。
    mac: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl HmacIdentityGateway {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, IdentityConfigError> {
        if secret.is_empty() {
            return Err(IdentityConfigError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| IdentityConfigError::InvalidKey(e.to_string()))?;
        Ok(Self { mac, clock })
    }

    /// `ttl_millis` 後に失効するトークンを発行する
    pub fn issue(&self, user_id: &UserId, ttl_millis: i64) -> String {
        let expires_at = self.clock.now_millis().saturating_add(ttl_millis);
        let claims = format!("{}.{}", user_id, expires_at);
        let signature = hex::encode(self.sign(&claims));
        format!("{}.{}", claims, signature)
    }

    fn sign(&self, claims: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(claims.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl IdentityVerifier for HmacIdentityGateway {
    fn verify(&self, credential: &str) -> Result<UserId, IdentityError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(IdentityError::Missing);
        }

        let (claims, signature) = credential
            .rsplit_once('.')
            .ok_or(IdentityError::Malformed)?;
        let (user_id, expires_at) = claims.split_once('.').ok_or(IdentityError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| IdentityError::Malformed)?;

        // 署名を先に検証し、改ざんされたクレームを解釈しない
        let mut mac = self.mac.clone();
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::InvalidSignature)?;

        let expires_at: i64 = expires_at.parse().map_err(|_| IdentityError::Malformed)?;
        if self.clock.now_millis() >= expires_at {
            return Err(IdentityError::Expired {
                expired_at: expires_at,
            });
        }

        UserId::new(user_id.to_string()).map_err(|_| IdentityError::Malformed)
    }
}
