//! Value objects
//!
//! 生成時にバリデーションを行い、不正な値を持つインスタンスが存在しないことを保証します。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

const IDENTIFIER_MAX_LEN: usize = 64;
const USERNAME_MAX_LEN: usize = 32;
const GROUP_NAME_MAX_LEN: usize = 100;

/// メッセージ本文の最大文字数
pub const MESSAGE_CONTENT_MAX_LEN: usize = 4000;

/// ID 系の値オブジェクトに共通する検証
///
/// 英数字・`-`・`_` のみを許可する。`.` はトークン形式の区切り文字なので使えない。
fn validate_identifier(field: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty { field });
    }
    let len = value.chars().count();
    if len > IDENTIFIER_MAX_LEN {
        return Err(ValueObjectError::TooLong {
            field,
            max: IDENTIFIER_MAX_LEN,
            actual: len,
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValueObjectError::InvalidCharacters {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// ユーザー ID（Identity Gateway が返す安定した識別子）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("user id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// グループ ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

impl GroupId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("group id", &value)?;
        Ok(Self(value))
    }

    /// 新しいグループ ID を UUID v4 で生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for GroupId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupId> for String {
    fn from(value: GroupId) -> Self {
        value.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable message id, assigned by the persistence gateway after a successful write
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque id of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ブロードキャスト用のルーム ID
///
/// ユーザーごとのプライベートルーム（ダイレクトメッセージ配信用）と、
/// グループごとのルームの 2 種類がある。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    User(UserId),
    Group(GroupId),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::User(id) => write!(f, "user:{id}"),
            RoomId::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// 表示名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// 前後の空白を除去して生成する
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty { field: "username" });
        }
        let len = trimmed.chars().count();
        if len > USERNAME_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "username",
                max: USERNAME_MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key: usernames match case-insensitively
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// グループ名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty {
                field: "group name",
            });
        }
        let len = trimmed.chars().count();
        if len > GROUP_NAME_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "group name",
                max: GROUP_NAME_MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupName> for String {
    fn from(value: GroupName) -> Self {
        value.0
    }
}

/// メッセージ本文
///
/// 空白のみの本文は拒否するが、保存する値はトリムしない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty {
                field: "message content",
            });
        }
        let len = value.chars().count();
        if len > MESSAGE_CONTENT_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "message content",
                max: MESSAGE_CONTENT_MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_alphanumeric_dash_underscore() {
        // テスト項目: 英数字・ハイフン・アンダースコアのみの ID は生成できる
        // given (前提条件):
        let raw = "alice_01-x".to_string();

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "alice_01-x");
    }

    #[test]
    fn test_user_id_rejects_empty_and_dot() {
        // テスト項目: 空文字列と `.` を含む ID は拒否される
        // when (操作):
        let empty = UserId::new(String::new());
        let dotted = UserId::new("alice.bob".to_string());

        // then (期待する結果):
        assert_eq!(empty, Err(ValueObjectError::Empty { field: "user id" }));
        assert!(matches!(
            dotted,
            Err(ValueObjectError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn test_message_content_rejects_whitespace_only() {
        // テスト項目: 空白のみの本文は拒否される
        // when (操作):
        let result = MessageContent::new("   \n\t".to_string());

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::Empty { .. })));
    }

    #[test]
    fn test_message_content_keeps_original_text() {
        // テスト項目: 本文はトリムされずそのまま保持される
        // when (操作):
        let content = MessageContent::new("  hi  ".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(content.as_str(), "  hi  ");
    }

    #[test]
    fn test_message_content_rejects_too_long() {
        // テスト項目: 最大文字数を超える本文は拒否される
        // given (前提条件):
        let raw = "a".repeat(MESSAGE_CONTENT_MAX_LEN + 1);

        // when (操作):
        let result = MessageContent::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::TooLong {
                field: "message content",
                max: MESSAGE_CONTENT_MAX_LEN,
                actual: MESSAGE_CONTENT_MAX_LEN + 1,
            })
        );
    }

    #[test]
    fn test_username_is_trimmed_and_normalized() {
        // テスト項目: ユーザー名はトリムされ、検索キーは小文字になる
        // when (操作):
        let username = Username::new("  Alice ".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(username.as_str(), "Alice");
        assert_eq!(username.normalized(), "alice");
    }

    #[test]
    fn test_room_id_display() {
        // テスト項目: ルーム ID の文字列表現が種類ごとに区別される
        // given (前提条件):
        let user_room = RoomId::User(UserId::new("alice".to_string()).unwrap());
        let group_room = RoomId::Group(GroupId::new("g1".to_string()).unwrap());

        // then (期待する結果):
        assert_eq!(user_room.to_string(), "user:alice");
        assert_eq!(group_room.to_string(), "group:g1");
    }

    #[test]
    fn test_user_id_deserialize_validates() {
        // テスト項目: デシリアライズ時にもバリデーションが行われる
        // when (操作):
        let ok: Result<UserId, _> = serde_json::from_str("\"bob\"");
        let ng: Result<UserId, _> = serde_json::from_str("\"\"");

        // then (期待する結果):
        assert_eq!(ok.unwrap().as_str(), "bob");
        assert!(ng.is_err());
    }
}
