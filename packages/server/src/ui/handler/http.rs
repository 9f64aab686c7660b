//! HTTP API endpoint handlers.
//!
//! 全てのエンドポイント（ヘルスチェックを除く）は Bearer 認証が必要。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    domain::{GroupId, UserId},
    infrastructure::dto::{
        http::{
            AddMemberRequest, ConversationSummaryDto, CreateGroupRequest, GroupDto,
            HealthResponse, MarkReadResponse, SendDirectRequest, SendGroupRequest,
        },
        message::{DirectMessageDto, GroupMessageDto},
    },
    ui::{
        auth::AuthUser,
        error::ApiError,
        extract::{ApiJson, ApiPath},
        state::AppState,
    },
    usecase::{MemberRef, Recipient},
};

fn parse_user_id(raw: String) -> Result<UserId, ApiError> {
    UserId::new(raw).map_err(|e| ApiError::bad_request("invalid_id", e.to_string()))
}

fn parse_group_id(raw: String) -> Result<GroupId, ApiError> {
    GroupId::new(raw).map_err(|e| ApiError::bad_request("invalid_id", e.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// 呼び出し元の会話一覧（最終メッセージの新しい順）
pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ConversationSummaryDto>>, ApiError> {
    let summaries = state.get_conversations.execute(&user.id).await?;

    // Domain Model から DTO への変換
    Ok(Json(summaries.iter().map(ConversationSummaryDto::from).collect()))
}

/// ダイレクトメッセージを保存して配信する
pub async fn send_direct_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<SendDirectRequest>,
) -> Result<(StatusCode, Json<DirectMessageDto>), ApiError> {
    let recipient = Recipient::from_parts(request.to_user_id, request.to_username)?;
    let message = state
        .send_direct_message
        .execute(&user.id, recipient, request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(DirectMessageDto::from(&message))))
}

/// 相手とのダイレクトメッセージ履歴（古い順）
pub async fn get_direct_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(peer_id): ApiPath<String>,
) -> Result<Json<Vec<DirectMessageDto>>, ApiError> {
    let peer_id = parse_user_id(peer_id)?;
    let history = state.get_direct_history.execute(&user.id, &peer_id).await?;
    Ok(Json(history.iter().map(DirectMessageDto::from).collect()))
}

pub async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(peer_id): ApiPath<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let peer_id = parse_user_id(peer_id)?;
    let updated = state
        .mark_conversation_read
        .execute(&user.id, &peer_id)
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// 呼び出し元が所属するグループの一覧
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<GroupDto>>, ApiError> {
    let groups = state.list_groups.execute(&user.id).await?;
    Ok(Json(groups.iter().map(GroupDto::from).collect()))
}

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupDto>), ApiError> {
    let group = state.create_group.execute(&user.id, request.name).await?;
    Ok((StatusCode::CREATED, Json(GroupDto::from(&group))))
}

pub async fn add_group_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(group_id): ApiPath<String>,
    ApiJson(request): ApiJson<AddMemberRequest>,
) -> Result<Json<GroupDto>, ApiError> {
    let group_id = parse_group_id(group_id)?;
    let member = MemberRef::from_parts(request.user_id, request.username)?;
    let group = state
        .add_group_member
        .execute(&user.id, group_id, member)
        .await?;
    Ok(Json(GroupDto::from(&group)))
}

/// グループの履歴（古い順）。メンバーのみ。
pub async fn get_group_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(group_id): ApiPath<String>,
) -> Result<Json<Vec<GroupMessageDto>>, ApiError> {
    let group_id = parse_group_id(group_id)?;
    let history = state.get_group_history.execute(&user.id, group_id).await?;
    Ok(Json(history.iter().map(GroupMessageDto::from).collect()))
}

pub async fn send_group_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(group_id): ApiPath<String>,
    ApiJson(request): ApiJson<SendGroupRequest>,
) -> Result<(StatusCode, Json<GroupMessageDto>), ApiError> {
    let group_id = parse_group_id(group_id)?;
    let message = state
        .send_group_message
        .execute(&user.id, group_id, request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(GroupMessageDto::from(&message))))
}
