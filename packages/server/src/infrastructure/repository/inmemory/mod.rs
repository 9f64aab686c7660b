//! インメモリ Repository 実装
//!
//! 永続化ゲートウェイの単一プロセス向け実装。プロセスの寿命の間だけデータを保持する。

mod fixtures;
mod group;
mod message;
mod user;

pub use fixtures::{FixtureError, Fixtures};
pub use group::InMemoryGroupRepository;
pub use message::InMemoryMessageRepository;
pub use user::InMemoryUserRepository;
