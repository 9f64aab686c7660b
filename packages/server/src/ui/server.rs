//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        http::{
            add_group_member, create_group, get_conversations, get_direct_history,
            get_group_history, health_check, list_groups, mark_conversation_read,
            send_direct_message, send_group_message,
        },
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Realtime chat delivery server
///
/// This struct owns the application state and builds the router from it.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(AppState::new(gateways));
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// WebSocket エンドポイントと REST API をまとめたルーター
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/conversations", get(get_conversations))
            .route("/api/messages/direct", post(send_direct_message))
            .route("/api/messages/direct/{peer_id}", get(get_direct_history))
            .route(
                "/api/messages/direct/{peer_id}/read",
                post(mark_conversation_read),
            )
            .route("/api/groups", get(list_groups).post(create_group))
            .route("/api/groups/{group_id}/members", post(add_group_member))
            .route(
                "/api/groups/{group_id}/messages",
                get(get_group_history).post(send_group_message),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// 既にバインド済みのリスナーで、`shutdown` が完了するまで処理する
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            "Realtime chat server listening on {}",
            listener.local_addr()?
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
