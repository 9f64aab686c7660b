//! Domain model → DTO conversions.

use hiroba_shared::time::timestamp_to_rfc3339;

use super::{
    http::{ConversationSummaryDto, GroupDto},
    message::{DirectMessageDto, GroupMessageDto},
    websocket::{ServerFrame, TypingEventDto},
};
use crate::domain::{
    ConversationSummary, DirectMessage, Group, GroupMessage, Notification, TypingSignal,
    TypingTarget,
};

impl From<&DirectMessage> for DirectMessageDto {
    fn from(message: &DirectMessage) -> Self {
        Self {
            id: message.id.to_string(),
            sender_id: message.sender_id.to_string(),
            sender_name: message.sender_name.as_str().to_string(),
            recipient_id: message.recipient_id.to_string(),
            content: message.content.as_str().to_string(),
            created_at: timestamp_to_rfc3339(message.created_at.value()),
            is_read: message.is_read,
        }
    }
}

impl From<&GroupMessage> for GroupMessageDto {
    fn from(message: &GroupMessage) -> Self {
        Self {
            id: message.id.to_string(),
            room_id: message.group_id.to_string(),
            sender_id: message.sender_id.to_string(),
            sender_name: message.sender_name.as_str().to_string(),
            content: message.content.as_str().to_string(),
            created_at: timestamp_to_rfc3339(message.created_at.value()),
        }
    }
}

impl From<&TypingSignal> for TypingEventDto {
    fn from(signal: &TypingSignal) -> Self {
        let (room_id, peer_id) = match &signal.target {
            TypingTarget::Room(group_id) => (Some(group_id.to_string()), None),
            // 受信側から見た相手は送信者
            TypingTarget::Peer(_) => (None, Some(signal.from.to_string())),
        };
        Self {
            from: signal.from.to_string(),
            room_id,
            peer_id,
            is_typing: signal.is_typing,
        }
    }
}

impl From<&Notification> for ServerFrame {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::NewDirectMessage(message) => ServerFrame::NewDirectMessage(message.into()),
            Notification::NewGroupMessage(message) => ServerFrame::NewGroupMessage(message.into()),
            Notification::Typing(signal) => ServerFrame::Typing(signal.into()),
        }
    }
}

impl From<&ConversationSummary> for ConversationSummaryDto {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            peer_id: summary.peer_id.to_string(),
            peer_name: summary.peer_name.clone(),
            last_message: summary.last_message.clone(),
            last_message_at: timestamp_to_rfc3339(summary.last_message_at.value()),
            unread_count: summary.unread_count,
        }
    }
}

impl From<&Group> for GroupDto {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.to_string(),
            name: group.name.as_str().to_string(),
            created_by: group.created_by.to_string(),
            member_ids: group.member_ids.iter().map(ToString::to_string).collect(),
            member_count: group.member_count(),
            created_at: timestamp_to_rfc3339(group.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GroupId, MessageContent, MessageId, NewGroupMessage, Timestamp, UserId, Username,
    };

    #[test]
    fn test_group_message_notification_to_frame() {
        // テスト項目: グループメッセージ通知が new_group_message フレームに変換される
        // given (前提条件):
        let message = NewGroupMessage {
            group_id: GroupId::new("g1".to_string()).unwrap(),
            sender_id: UserId::new("alice".to_string()).unwrap(),
            sender_name: Username::new("Alice".to_string()).unwrap(),
            content: MessageContent::new("hello".to_string()).unwrap(),
            created_at: Timestamp::new(1_672_531_200_123),
        }
        .into_persisted(MessageId::generate());

        // when (操作):
        let frame = ServerFrame::from(&Notification::NewGroupMessage(message));
        let json = serde_json::to_value(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(json["event"], "new_group_message");
        assert_eq!(json["data"]["roomId"], "g1");
        assert_eq!(json["data"]["senderName"], "Alice");
        assert_eq!(json["data"]["createdAt"], "2023-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_peer_typing_carries_sender_as_peer() {
        // テスト項目: 1 対 1 の入力中シグナルは受信側から見た相手（送信者）を peerId に持つ
        // given (前提条件):
        let signal = TypingSignal {
            from: UserId::new("alice".to_string()).unwrap(),
            target: TypingTarget::Peer(UserId::new("bob".to_string()).unwrap()),
            is_typing: true,
        };

        // when (操作):
        let dto = TypingEventDto::from(&signal);

        // then (期待する結果):
        assert_eq!(dto.peer_id.as_deref(), Some("alice"));
        assert_eq!(dto.room_id, None);
        assert!(dto.is_typing);
    }
}
