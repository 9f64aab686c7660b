//! Realtime chat delivery server library.
//!
//! Users exchange direct messages and group messages over a live WebSocket
//! connection, with typing signals and a REST surface for history and groups.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
