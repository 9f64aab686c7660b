//! Repository 実装
//!
//! - `inmemory`: HashMap / Vec をストレージとして使うインメモリ実装

pub mod inmemory;

pub use inmemory::{
    FixtureError, Fixtures, InMemoryGroupRepository, InMemoryMessageRepository,
    InMemoryUserRepository,
};
