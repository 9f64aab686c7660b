//! Presence table
//!
//! 接続・プレゼンス・ルーム購読の 3 つの対応表をまとめて保持する純粋なデータ構造。
//! 副作用を持たないため単体でテストでき、Infrastructure 層のハブが Mutex で包んで使う。
//!
//! ## 不変条件
//!
//! - プレゼンスのエントリは接続集合が空でない間だけ存在する
//! - ルームのエントリはメンバー集合が空でない間だけ存在する
//! - 1 つの接続 ID が複数ユーザーのプレゼンスに属することはない
//! - 接続が参加しているルーム集合と、ルーム側のメンバー集合は常に一致する

use std::collections::{HashMap, HashSet};

use super::{
    error::RegistryError,
    value_object::{ConnectionId, RoomId, UserId},
};

#[derive(Debug, Default)]
struct ConnectionState {
    user_id: Option<UserId>,
    rooms: HashSet<RoomId>,
}

/// 切断された接続の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedConnection {
    pub user_id: Option<UserId>,
    pub rooms: HashSet<RoomId>,
    /// 切断によってこのユーザーのプレゼンスが消えた場合 `true`
    pub went_offline: bool,
}

#[derive(Debug, Default)]
pub struct PresenceTable {
    connections: HashMap<ConnectionId, ConnectionState>,
    presence: HashMap<UserId, HashSet<ConnectionId>>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未認証の接続として登録する。既に存在する場合は何もしない。
    pub fn attach(&mut self, connection_id: ConnectionId) -> bool {
        if self.connections.contains_key(&connection_id) {
            return false;
        }
        self.connections
            .insert(connection_id, ConnectionState::default());
        true
    }

    /// 接続をユーザーに紐付け、ユーザーのプライベートルームに参加させる。
    ///
    /// 同じユーザーへの再紐付けは何もしない。未知の接続も何もしない。
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 新たに紐付けた
    /// * `Ok(false)` - 既に同じユーザーに紐付いている、または未知の接続
    /// * `Err(RegistryError::AlreadyBound)` - 別のユーザーに紐付いている
    pub fn bind(
        &mut self,
        connection_id: &ConnectionId,
        user_id: UserId,
    ) -> Result<bool, RegistryError> {
        let Some(state) = self.connections.get_mut(connection_id) else {
            return Ok(false);
        };

        match &state.user_id {
            Some(bound) if bound == &user_id => return Ok(false),
            Some(bound) => {
                return Err(RegistryError::AlreadyBound {
                    connection_id: connection_id.to_string(),
                    bound_to: bound.to_string(),
                });
            }
            None => {}
        }

        state.user_id = Some(user_id.clone());
        self.presence
            .entry(user_id.clone())
            .or_default()
            .insert(*connection_id);
        self.join(connection_id, RoomId::User(user_id));
        Ok(true)
    }

    /// 接続を削除し、プレゼンスと全てのルームから外す。未知の接続なら `None`。
    pub fn detach(&mut self, connection_id: &ConnectionId) -> Option<DetachedConnection> {
        let state = self.connections.remove(connection_id)?;

        for room_id in &state.rooms {
            self.remove_room_member(room_id, connection_id);
        }

        let mut went_offline = false;
        if let Some(user_id) = &state.user_id {
            if let Some(connections) = self.presence.get_mut(user_id) {
                connections.remove(connection_id);
                if connections.is_empty() {
                    self.presence.remove(user_id);
                    went_offline = true;
                }
            }
        }

        Some(DetachedConnection {
            user_id: state.user_id,
            rooms: state.rooms,
            went_offline,
        })
    }

    /// ルームに参加する。ルームは最初の参加で作られる。
    ///
    /// # Returns
    ///
    /// 新たに参加した場合は `true`（既に参加済み・未知の接続は `false`）
    pub fn join(&mut self, connection_id: &ConnectionId, room_id: RoomId) -> bool {
        let Some(state) = self.connections.get_mut(connection_id) else {
            return false;
        };
        if !state.rooms.insert(room_id.clone()) {
            return false;
        }
        self.rooms.entry(room_id).or_default().insert(*connection_id);
        true
    }

    /// ルームから抜ける。最後のメンバーが抜けたルームは消える。
    pub fn leave(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        let Some(state) = self.connections.get_mut(connection_id) else {
            return false;
        };
        if !state.rooms.remove(room_id) {
            return false;
        }
        self.remove_room_member(room_id, connection_id);
        true
    }

    fn remove_room_member(&mut self, room_id: &RoomId, connection_id: &ConnectionId) {
        if let Some(members) = self.rooms.get_mut(room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(room_id);
            }
        }
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn user_of(&self, connection_id: &ConnectionId) -> Option<&UserId> {
        self.connections
            .get(connection_id)
            .and_then(|state| state.user_id.as_ref())
    }

    pub fn connections_for(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        self.presence.get(user_id).cloned().unwrap_or_default()
    }

    pub fn is_joined(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|members| members.contains(connection_id))
    }

    pub fn members_of(&self, room_id: &RoomId) -> HashSet<ConnectionId> {
        self.rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn online_user_count(&self) -> usize {
        self.presence.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
