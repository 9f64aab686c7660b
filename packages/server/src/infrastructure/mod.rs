//! Infrastructure layer.
//!
//! Concrete implementations of the domain gateway traits: in-memory
//! repositories, the realtime hub, the HMAC identity gateway, and the wire DTOs.

pub mod dto;
pub mod identity;
pub mod realtime;
pub mod repository;
