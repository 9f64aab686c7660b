//! Bearer 認証

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::domain::User;

use super::{error::ApiError, state::AppState};

/// `Authorization: Bearer <token>` から取り出した認証情報
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 認証済みユーザー。認証情報がない・不正な場合は 401 で拒否する。
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(ApiError::unauthenticated("bearer credential is required"));
        };

        let user = state.connect_session.resolve(token).await.map_err(|e| {
            tracing::warn!("Rejected bearer credential: {}", e);
            ApiError::from(e)
        })?;
        Ok(AuthUser(user))
    }
}
