//! UseCase テスト用のヘルパー

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use hiroba_shared::time::FixedClock;
use tokio::sync::{Semaphore, mpsc};

use crate::{
    domain::{
        ConnectionId, ConnectionRegistry, Exclude, Group, GroupId, GroupName, GroupRepository,
        Notification, RoomId, RoomManager, Timestamp, User, UserId, UserRepository, Username,
    },
    infrastructure::{
        realtime::InMemoryRealtimeHub,
        repository::{InMemoryGroupRepository, InMemoryMessageRepository, InMemoryUserRepository},
    },
};

pub const NOW: i64 = 1_700_000_000_000;

pub struct TestContext {
    pub users: Arc<InMemoryUserRepository>,
    pub groups: Arc<InMemoryGroupRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub hub: Arc<InMemoryRealtimeHub>,
    pub clock: Arc<FixedClock>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            groups: Arc::new(InMemoryGroupRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            hub: Arc::new(InMemoryRealtimeHub::new()),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    pub async fn seed_user(&self, id: &str, name: &str) -> UserId {
        let user_id = user_id(id);
        self.users
            .insert(User::new(
                user_id.clone(),
                Username::new(name.to_string()).unwrap(),
            ))
            .await
            .unwrap();
        user_id
    }

    pub async fn seed_group(&self, id: &str, creator: &str, members: &[&str]) -> GroupId {
        let group_id = group_id(id);
        let mut group = Group::new(
            group_id.clone(),
            GroupName::new(format!("group {id}")).unwrap(),
            user_id(creator),
            Timestamp::new(NOW),
        );
        for member in members {
            group.add_member(user_id(member));
        }
        self.groups.insert(group).await.unwrap();
        group_id
    }

    /// 認証済みの接続を開き、送信チャンネルの受信側を返す
    pub async fn connect(&self, user: &str) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::generate();
        self.hub.attach(connection_id, tx).await;
        self.hub
            .register(&connection_id, user_id(user))
            .await
            .unwrap();
        (connection_id, rx)
    }
}

pub fn user_id(raw: &str) -> UserId {
    UserId::new(raw.to_string()).unwrap()
}

pub fn group_id(raw: &str) -> GroupId {
    GroupId::new(raw.to_string()).unwrap()
}

/// 受信済みのフレームを全て取り出す
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        frames.push(serde_json::from_str(&raw).unwrap());
    }
    frames
}

/// 配信をゲートで止められる RoomManager
///
/// `open` されるまで `broadcast` は待機する。保存後・配信前に呼び出し元を中断するテストに使う。
pub struct GatedRooms {
    hub: Arc<InMemoryRealtimeHub>,
    gate: Semaphore,
}

impl GatedRooms {
    pub fn closed(hub: Arc<InMemoryRealtimeHub>) -> Self {
        Self {
            hub,
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1024);
    }
}

#[async_trait]
impl RoomManager for GatedRooms {
    async fn join(&self, connection_id: &ConnectionId, room_id: RoomId) -> bool {
        self.hub.join(connection_id, room_id).await
    }

    async fn leave(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.hub.leave(connection_id, room_id).await
    }

    async fn is_joined(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.hub.is_joined(connection_id, room_id).await
    }

    async fn members_of(&self, room_id: &RoomId) -> HashSet<ConnectionId> {
        self.hub.members_of(room_id).await
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        notification: &Notification,
        exclude: Exclude,
    ) -> usize {
        let _permit = self.gate.acquire().await.unwrap();
        self.hub.broadcast(room_id, notification, exclude).await
    }
}

/// 条件が満たされるまで最大 1 秒待つ
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}
