//! Domain layer for the realtime delivery server.
//!
//! Value objects, entities, the presence table behind the connection registry
//! and room manager, and the gateway traits that the usecase layer depends on.
//! Concrete implementations live in the infrastructure layer.

pub mod conversation;
pub mod entity;
pub mod error;
pub mod identity;
pub mod notification;
pub mod presence;
pub mod realtime;
pub mod repository;
pub mod value_object;

pub use conversation::summarize_conversations;
pub use entity::{
    ConversationSummary, DirectMessage, Group, GroupMessage, NewDirectMessage, NewGroupMessage,
    User,
};
pub use error::{IdentityError, RegistryError, RepositoryError, ValueObjectError};
pub use identity::IdentityVerifier;
pub use notification::{Notification, TYPING_IDLE_TIMEOUT_MS, TypingSignal, TypingTarget};
pub use presence::{DetachedConnection, PresenceTable};
pub use realtime::{ConnectionRegistry, Exclude, PusherChannel, RoomManager};
pub use repository::{GroupRepository, MessageRepository, UserRepository};
pub use value_object::{
    ConnectionId, GroupId, GroupName, MessageContent, MessageId, RoomId, Timestamp, UserId,
    Username,
};
