//! In-process realtime delivery.

mod hub;

pub use hub::InMemoryRealtimeHub;
