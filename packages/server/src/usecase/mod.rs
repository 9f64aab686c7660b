//! UseCase layer
//!
//! 1 つの操作につき 1 つの UseCase 構造体を持つ。UseCase はドメイン層の trait にだけ依存し、
//! 永続化してから配信する（persist-then-broadcast）順序を保証する。

pub mod error;

mod add_group_member;
mod connect_session;
mod create_group;
mod disconnect_session;
mod get_conversations;
mod get_direct_history;
mod get_group_history;
mod join_group;
mod leave_group;
mod list_groups;
mod mark_conversation_read;
mod send_direct_message;
mod send_group_message;
mod set_typing;

#[cfg(test)]
mod test_support;

pub use add_group_member::{AddGroupMemberUseCase, MemberRef};
pub use connect_session::ConnectSessionUseCase;
pub use create_group::CreateGroupUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{
    ConnectError, ConversationError, ErrorKind, GroupManagementError, HistoryError,
    JoinGroupError, SendMessageError, TypingError, UseCaseError,
};
pub use get_conversations::GetConversationsUseCase;
pub use get_direct_history::GetDirectHistoryUseCase;
pub use get_group_history::GetGroupHistoryUseCase;
pub use join_group::JoinGroupUseCase;
pub use leave_group::LeaveGroupUseCase;
pub use list_groups::ListGroupsUseCase;
pub use mark_conversation_read::MarkConversationReadUseCase;
pub use send_direct_message::{Recipient, SendDirectMessageUseCase};
pub use send_group_message::SendGroupMessageUseCase;
pub use set_typing::SetTypingUseCase;
