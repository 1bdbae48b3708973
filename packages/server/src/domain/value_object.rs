//! Value objects for the connection registry.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValueObjectError;

/// Opaque identifier assigned to a connection at accept time.
///
/// Rendered as 32 lowercase hex characters (a random 128-bit token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing identifier, rejecting empty or blank input.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
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

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

/// Unix timestamp in UTC milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
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
    fn test_generate_returns_32_hex_chars() {
        // テスト項目: 生成された ConnectionId は 32 文字の小文字 16 進数
        // given (前提条件):

        // when (操作):
        let id = ConnectionId::generate();

        // then (期待する結果):
        assert_eq!(id.as_str().len(), 32);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_generate_is_unique() {
        // テスト項目: 連続して生成しても ID が衝突しない
        // given (前提条件):
        let count = 1000;

        // when (操作):
        let ids: std::collections::HashSet<ConnectionId> =
            (0..count).map(|_| ConnectionId::generate()).collect();

        // then (期待する結果):
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_new_rejects_blank() {
        // テスト項目: 空白のみの ID は拒否される
        // given (前提条件):
        let blank = "   ".to_string();

        // when (操作):
        let result = ConnectionId::new(blank);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::ConnectionIdEmpty)));
    }

    #[test]
    fn test_try_from_str_keeps_value() {
        // テスト項目: &str から変換した ID は元の値を保持する
        // given (前提条件):
        let raw = "abc123";

        // when (操作):
        let id = ConnectionId::try_from(raw).unwrap();

        // then (期待する結果):
        assert_eq!(id.as_str(), raw);
        assert_eq!(id.to_string(), raw);
        assert_eq!(id.into_string(), raw.to_string());
    }

    #[test]
    fn test_timestamp_ordering() {
        // テスト項目: Timestamp は値の大小で比較できる
        // given (前提条件):
        let earlier = Timestamp::new(1000);
        let later = Timestamp::new(2000);

        // when (操作):
        let ordered = earlier < later;

        // then (期待する結果):
        assert!(ordered);
        assert_eq!(later.value(), 2000);
    }
}
