//! Shared application state.

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    domain::{
        ConnectionRegistry, GroupRepository, IdentityVerifier, MessageRepository, RoomManager,
        UserRepository,
    },
    usecase::{
        AddGroupMemberUseCase, ConnectSessionUseCase, CreateGroupUseCase,
        DisconnectSessionUseCase, GetConversationsUseCase, GetDirectHistoryUseCase,
        GetGroupHistoryUseCase, JoinGroupUseCase, LeaveGroupUseCase, ListGroupsUseCase,
        MarkConversationReadUseCase, SendDirectMessageUseCase, SendGroupMessageUseCase,
        SetTypingUseCase,
    },
};

/// UseCase の組み立てに使うゲートウェイ一式
pub struct Gateways {
    pub identity: Arc<dyn IdentityVerifier>,
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub rooms: Arc<dyn RoomManager>,
    pub clock: Arc<dyn Clock>,
}

/// Shared application state
pub struct AppState {
    pub connect_session: ConnectSessionUseCase,
    pub disconnect_session: DisconnectSessionUseCase,
    pub join_group: JoinGroupUseCase,
    pub leave_group: LeaveGroupUseCase,
    pub send_direct_message: SendDirectMessageUseCase,
    pub send_group_message: SendGroupMessageUseCase,
    pub set_typing: SetTypingUseCase,
    pub get_conversations: GetConversationsUseCase,
    pub get_direct_history: GetDirectHistoryUseCase,
    pub get_group_history: GetGroupHistoryUseCase,
    pub mark_conversation_read: MarkConversationReadUseCase,
    pub create_group: CreateGroupUseCase,
    pub add_group_member: AddGroupMemberUseCase,
    pub list_groups: ListGroupsUseCase,
}

impl AppState {
    pub fn new(gateways: Gateways) -> Self {
        let Gateways {
            identity,
            users,
            groups,
            messages,
            registry,
            rooms,
            clock,
        } = gateways;

        Self {
            connect_session: ConnectSessionUseCase::new(identity, users.clone(), registry.clone()),
            disconnect_session: DisconnectSessionUseCase::new(registry),
            join_group: JoinGroupUseCase::new(groups.clone(), rooms.clone()),
            leave_group: LeaveGroupUseCase::new(rooms.clone()),
            send_direct_message: SendDirectMessageUseCase::new(
                users.clone(),
                messages.clone(),
                rooms.clone(),
                clock.clone(),
            ),
            send_group_message: SendGroupMessageUseCase::new(
                users.clone(),
                groups.clone(),
                messages.clone(),
                rooms.clone(),
                clock.clone(),
            ),
            set_typing: SetTypingUseCase::new(rooms),
            get_conversations: GetConversationsUseCase::new(users.clone(), messages.clone()),
            get_direct_history: GetDirectHistoryUseCase::new(messages.clone()),
            get_group_history: GetGroupHistoryUseCase::new(groups.clone(), messages.clone()),
            mark_conversation_read: MarkConversationReadUseCase::new(messages),
            create_group: CreateGroupUseCase::new(groups.clone(), clock),
            add_group_member: AddGroupMemberUseCase::new(users, groups.clone()),
            list_groups: ListGroupsUseCase::new(groups),
        }
    }
}
