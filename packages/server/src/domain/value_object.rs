//! Value objects of the matchmaking domain.
//!
//! Strings arriving from the wire are validated here once; everything past the
//! UI layer works with these types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

const MAX_PARTICIPANT_ID_LEN: usize = 64;
const MAX_ROOM_NAME_LEN: usize = 128;
const MAX_TOPIC_LEN: usize = 64;

/// 接続（参加者）を識別する ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyParticipantId);
        }
        if value.len() > MAX_PARTICIPANT_ID_LEN {
            return Err(ValueObjectError::ParticipantIdTooLong(MAX_PARTICIPANT_ID_LEN));
        }
        Ok(Self(value))
    }

    /// 新しい接続に割り当てる ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルーム名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ValueObjectError::EmptyRoomName);
        }
        if value.len() > MAX_ROOM_NAME_LEN {
            return Err(ValueObjectError::RoomNameTooLong(MAX_ROOM_NAME_LEN));
        }
        Ok(Self(value))
    }

    /// 参加者専用ルームの名前（`solo_<id>` / `training_<id>`）
    pub fn private_for(kind: RoomKind, owner: &ParticipantId) -> Self {
        Self(format!("{}_{}", kind.as_str(), owner.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルームの種別
///
/// 共有ルームはプロセスの生存期間中ずっと存在し、空になるとクリアされる。
/// Solo / Training は接続ごとの専用ルームで、退出・切断で削除される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    #[default]
    Shared,
    Solo,
    Training,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Shared => "shared",
            RoomKind::Solo => "solo",
            RoomKind::Training => "training",
        }
    }

    pub fn is_private(&self) -> bool {
        !matches!(self, RoomKind::Shared)
    }

    /// 同時に入室できる最大人数
    pub fn capacity(&self) -> usize {
        if self.is_private() { 1 } else { 2 }
    }
}

/// お題（分類器のラベルと同じ語彙）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ValueObjectError::EmptyTopic);
        }
        if value.len() > MAX_TOPIC_LEN {
            return Err(ValueObjectError::TopicTooLong(MAX_TOPIC_LEN));
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

impl TryFrom<String> for Topic {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
