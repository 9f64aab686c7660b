//! WebSocket connection handlers.
//!
//! 1 接続につき 2 つのタスクを動かす。
//!
//! - recv タスク: クライアントからのフレームを 1 つずつ順番に処理する
//! - send タスク（pusher）: 接続の送信チャンネルに積まれたフレームをソケットに書き出す
//!
//! recv タスクが終了した場合は send タスクを止める。send タスクが先に終了した場合は
//! recv タスクに停止を通知し、処理中のコマンドを終えてフレームの区切りで抜けるのを待つ
//! （送信処理を途中で打ち切らない）。その後、接続をプレゼンスとルームから取り除く。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{ConnectionId, GroupId, PusherChannel, TYPING_IDLE_TIMEOUT_MS, User},
    infrastructure::dto::{
        message::{DirectMessageDto, GroupMessageDto},
        websocket::{AckPayload, ClientCommand, ClientFrame, ServerFrame, SessionReadyPayload},
    },
    ui::{auth::bearer_token, state::AppState},
    usecase::{Recipient, UseCaseError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// ハンドシェイク時の認証情報（`Authorization: Bearer` でも可）
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let credential = query
        .token
        .or_else(|| bearer_token(&headers).map(str::to_string));

    ws.on_upgrade(move |socket| handle_socket(socket, state, credential))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for serialized frames addressed to this connection
/// * `sender` - WebSocket sink of this connection
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, credential: Option<String>) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = ConnectionId::generate();

    // 認証情報が無い・不正な場合は未認証の接続として受け入れる
    let user = match credential {
        Some(credential) => match state.connect_session.resolve(&credential).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(
                    "Connection '{}' handshake credential rejected: {}",
                    connection_id,
                    e
                );
                None
            }
        },
        None => None,
    };

    let mut session = Session {
        connection_id,
        user,
        outbound: tx.clone(),
    };

    // session_ready は登録より前に積み、必ず最初のフレームになるようにする
    session.push(&ServerFrame::SessionReady(SessionReadyPayload {
        connection_id: connection_id.to_string(),
        user_id: session.user.as_ref().map(|u| u.id.to_string()),
        typing_idle_ms: TYPING_IDLE_TIMEOUT_MS,
    }));

    if let Err(e) = state
        .connect_session
        .open(connection_id, tx, session.user.as_ref())
        .await
    {
        tracing::error!("Failed to register connection '{}': {}", connection_id, e);
        state.disconnect_session.execute(&connection_id).await;
        return;
    }

    match &session.user {
        Some(user) => tracing::info!("Connection '{}' opened as '{}'", connection_id, user.id),
        None => tracing::info!("Connection '{}' opened unauthenticated", connection_id),
    }

    let state_clone = state.clone();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        loop {
            // 停止の通知はフレームの待機中にだけ受け付ける
            let next = tokio::select! {
                next = receiver.next() => next,
                _ = &mut stop_rx => {
                    tracing::debug!("Connection '{}' receive loop stopped", connection_id);
                    break;
                }
            };
            let Some(msg) = next else {
                break;
            };
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received frame on '{}': {}", connection_id, text.as_str());
                    handle_text(&state_clone, &mut session, text.as_str()).await;
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame on '{}'", connection_id);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    let writer_closed = tokio::select! {
        _ = &mut recv_task => {
            send_task.abort();
            false
        }
        _ = &mut send_task => true,
    };
    if writer_closed {
        let _ = stop_tx.send(());
        if let Err(e) = recv_task.await {
            tracing::error!("Receive loop of '{}' failed: {}", connection_id, e);
        }
    }

    match state.disconnect_session.execute(&connection_id).await {
        Some(user_id) => tracing::info!(
            "Connection '{}' of '{}' closed and removed from presence",
            connection_id,
            user_id
        ),
        None => tracing::info!("Connection '{}' closed", connection_id),
    }
}

/// 1 接続分の状態
struct Session {
    connection_id: ConnectionId,
    user: Option<User>,
    outbound: PusherChannel,
}

impl Session {
    fn push(&self, frame: &ServerFrame) {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize frame: {}", e);
                return;
            }
        };
        if self.outbound.send(json).is_err() {
            tracing::debug!("Connection '{}' is closing, frame dropped", self.connection_id);
        }
    }

    fn ack(&self, ack: AckPayload) {
        self.push(&ServerFrame::Ack(ack));
    }

    fn ack_error<E: UseCaseError>(&self, request_id: Option<String>, error: &E) {
        tracing::warn!(
            "Rejected request on '{}' ({}): {}",
            self.connection_id,
            error.code(),
            error
        );
        self.ack(AckPayload::failure(request_id, error.code(), error.to_string()));
    }

    /// 保存済みメッセージを載せた成功 ack
    fn ack_message<T: Serialize>(&self, request_id: Option<String>, message: &T) {
        match serde_json::to_value(message) {
            Ok(value) => self.ack(AckPayload::with_message(request_id, value)),
            Err(e) => {
                tracing::error!("Failed to serialize acknowledged message: {}", e);
                self.ack(AckPayload::success(request_id));
            }
        }
    }

    /// 認証済みユーザーを返す。未認証なら `unauthenticated` で ack する。
    fn require_user(&self, request_id: &Option<String>) -> Option<&User> {
        if self.user.is_none() {
            tracing::warn!(
                "Unauthenticated connection '{}' sent a protected event",
                self.connection_id
            );
            self.ack(AckPayload::failure(
                request_id.clone(),
                "unauthenticated",
                "authentication is required",
            ));
        }
        self.user.as_ref()
    }
}

/// 不正なフレームからでも読み取れる場合は requestId を取り出す
fn salvage_request_id(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("requestId")?.as_str().map(str::to_string)
}

async fn handle_text(state: &AppState, session: &mut Session, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Malformed frame on '{}': {}", session.connection_id, e);
            if let Some(request_id) = salvage_request_id(text) {
                session.ack(AckPayload::failure(
                    Some(request_id),
                    "invalid_event",
                    e.to_string(),
                ));
            }
            return;
        }
    };

    let request_id = frame.request_id.clone();
    let command = match frame.into_command() {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Invalid event on '{}': {}", session.connection_id, e);
            if request_id.is_some() {
                session.ack(AckPayload::failure(request_id, "invalid_event", e.to_string()));
            }
            return;
        }
    };

    dispatch(state, session, request_id, command).await;
}

async fn dispatch(
    state: &AppState,
    session: &mut Session,
    request_id: Option<String>,
    command: ClientCommand,
) {
    let connection_id = session.connection_id;

    match command {
        ClientCommand::Authenticate(payload) => {
            match state
                .connect_session
                .authenticate(&connection_id, &payload.token)
                .await
            {
                Ok(user) => {
                    tracing::info!("Connection '{}' authenticated as '{}'", connection_id, user.id);
                    session.ack(AckPayload::success(request_id));
                    session.user = Some(user);
                }
                Err(e) => session.ack_error(request_id, &e),
            }
        }
        ClientCommand::JoinGroup { room_id } => {
            let Some(user) = session.require_user(&request_id) else {
                return;
            };
            let Some(group_id) = parse_room(session, &request_id, room_id) else {
                return;
            };
            match state
                .join_group
                .execute(&connection_id, &user.id, group_id)
                .await
            {
                Ok(_) => session.ack(AckPayload::success(request_id)),
                Err(e) => session.ack_error(request_id, &e),
            }
        }
        ClientCommand::LeaveGroup { room_id } => {
            if session.require_user(&request_id).is_none() {
                return;
            }
            let Some(group_id) = parse_room(session, &request_id, room_id) else {
                return;
            };
            // 未参加のルームからの退出も成功として扱う（冪等）
            state.leave_group.execute(&connection_id, group_id).await;
            session.ack(AckPayload::success(request_id));
        }
        ClientCommand::Typing(payload) => {
            // fire-and-forget: 未認証や宛先不正でも ack は返さない
            let Some(user) = &session.user else {
                tracing::debug!("Dropping typing from unauthenticated '{}'", connection_id);
                return;
            };
            if let Err(e) = state
                .set_typing
                .execute(
                    &connection_id,
                    &user.id,
                    payload.room_id,
                    payload.peer_id,
                    payload.is_typing,
                )
                .await
            {
                tracing::debug!("Dropping typing from '{}': {}", user.id, e);
            }
        }
        ClientCommand::SendDirect(payload) => {
            let Some(user) = session.require_user(&request_id) else {
                return;
            };
            let recipient = match Recipient::from_parts(payload.to_user_id, payload.to_username) {
                Ok(recipient) => recipient,
                Err(e) => return session.ack_error(request_id, &e),
            };
            match state
                .send_direct_message
                .execute(&user.id, recipient, payload.content)
                .await
            {
                Ok(message) => session.ack_message(request_id, &DirectMessageDto::from(&message)),
                Err(e) => session.ack_error(request_id, &e),
            }
        }
        ClientCommand::SendGroup(payload) => {
            let Some(user) = session.require_user(&request_id) else {
                return;
            };
            let Some(group_id) = parse_room(session, &request_id, payload.room_id) else {
                return;
            };
            match state
                .send_group_message
                .execute(&user.id, group_id, payload.content)
                .await
            {
                Ok(message) => session.ack_message(request_id, &GroupMessageDto::from(&message)),
                Err(e) => session.ack_error(request_id, &e),
            }
        }
    }
}

fn parse_room(session: &Session, request_id: &Option<String>, room_id: String) -> Option<GroupId> {
    match GroupId::new(room_id) {
        Ok(group_id) => Some(group_id),
        Err(e) => {
            tracing::warn!("Invalid room id on '{}': {}", session.connection_id, e);
            session.ack(AckPayload::failure(
                request_id.clone(),
                "invalid_room",
                e.to_string(),
            ));
            None
        }
    }
}
