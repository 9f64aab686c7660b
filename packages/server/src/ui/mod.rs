//! UI layer: axum router, WebSocket and REST handlers.

mod auth;
mod error;
mod extract;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ApiError;
pub use server::Server;
pub use state::{AppState, Gateways};
