//! Runtime configuration of the duel server.

use std::time::Duration;

use crate::domain::{RoomName, ValueObjectError};

/// Shared rooms created at startup when none are configured.
pub const DEFAULT_SHARED_ROOMS: [&str; 4] = ["room1", "room2", "room3", "room4"];

/// Timer settings and room pool of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub shared_rooms: Vec<String>,
    /// Interval between matchmaking retries while a room waits for identities
    /// or a departure to finish.
    pub matchmaking_retry: Duration,
    pub matchmaking_max_attempts: u32,
    /// How long a lone topic proposal waits for the peer's proposal.
    pub topic_timeout: Duration,
    /// Grace window between `leave` and forced room clear.
    pub leave_grace: Duration,
    /// Seed for topic resolution. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shared_rooms: DEFAULT_SHARED_ROOMS.iter().map(|s| s.to_string()).collect(),
            matchmaking_retry: Duration::from_millis(50),
            matchmaking_max_attempts: 600,
            topic_timeout: Duration::from_secs(10),
            leave_grace: Duration::from_secs(60),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Validated shared room names, in configured order.
    pub fn shared_room_names(&self) -> Result<Vec<RoomName>, ValueObjectError> {
        self.shared_rooms
            .iter()
            .map(|name| RoomName::new(name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: 既定値は共有ルーム 4 つ、再試行 50ms、猶予 60 秒
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let names = config.shared_room_names().unwrap();

        // then (期待する結果):
        assert_eq!(names.len(), 4);
        assert_eq!(names[0].as_str(), "room1");
        assert_eq!(config.matchmaking_retry, Duration::from_millis(50));
        assert_eq!(config.leave_grace, Duration::from_secs(60));
        assert_eq!(config.topic_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_room_name_is_rejected() {
        // テスト項目: 空のルーム名を含む設定は検証エラーになる
        // given (前提条件):
        let config = ServerConfig {
            shared_rooms: vec!["room1".to_string(), "  ".to_string()],
            ..ServerConfig::default()
        };

        // when (操作):
        let result = config.shared_room_names();

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyRoomName));
    }
}
