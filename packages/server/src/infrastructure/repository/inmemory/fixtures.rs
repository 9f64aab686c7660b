//! 起動時にインメモリストアへ投入する初期データ
//!
//! ```json
//! {
//!   "users": [{ "id": "alice", "username": "Alice" }],
//!   "groups": [{ "id": "friends", "name": "Friends", "createdBy": "alice", "members": ["bob"] }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    Group, GroupId, GroupName, GroupRepository, RepositoryError, Timestamp, User, UserId,
    UserRepository, Username,
};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixtures file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse fixtures: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to store fixture: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserFixture {
    pub id: UserId,
    pub username: Username,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFixture {
    #[serde(default)]
    pub id: Option<GroupId>,
    pub name: GroupName,
    pub created_by: UserId,
    #[serde(default)]
    pub members: Vec<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<UserFixture>,
    #[serde(default)]
    pub groups: Vec<GroupFixture>,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// ユーザー、グループの順に投入する
    pub async fn apply(
        &self,
        users: &dyn UserRepository,
        groups: &dyn GroupRepository,
        created_at: Timestamp,
    ) -> Result<(), FixtureError> {
        for fixture in &self.users {
            users
                .insert(User::new(fixture.id.clone(), fixture.username.clone()))
                .await?;
        }

        for fixture in &self.groups {
            let id = fixture.id.clone().unwrap_or_else(GroupId::generate);
            let mut group = Group::new(
                id,
                fixture.name.clone(),
                fixture.created_by.clone(),
                created_at,
            );
            for member in &fixture.members {
                group.add_member(member.clone());
            }
            groups.insert(group).await?;
        }

        tracing::info!(
            "Loaded fixtures: {} users, {} groups",
            self.users.len(),
            self.groups.len()
        );
        Ok(())
    }
}
