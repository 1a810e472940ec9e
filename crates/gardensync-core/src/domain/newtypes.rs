//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the two identifier kinds the core deals
//! with: task ids (server-assigned or client-temporary) and the session
//! page id that scopes a sync conversation. Each newtype validates at
//! construction time so blank ids can never reach the wire.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Prefix that marks a client-generated temporary task id
///
/// The remote store never allocates ids with this prefix, so the two id
/// spaces cannot collide.
pub const TEMP_ID_PREFIX: &str = "temp-";

// ============================================================================
// TaskId
// ============================================================================

/// Identifier for a task
///
/// Either a durable, server-assigned opaque id, or a client-temporary id
/// carrying the [`TEMP_ID_PREFIX`]. Temporary ids are built from a
/// millisecond timestamp plus a random component so they are unique
/// within a session and sortable by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh client-temporary id
    #[must_use]
    pub fn new_temp() -> Self {
        let millis = Utc::now().timestamp_millis();
        let nonce = Uuid::new_v4().simple().to_string();
        Self(format!("{TEMP_ID_PREFIX}{millis}-{}", &nonce[..8]))
    }

    /// Returns true if this is a client-temporary id that the remote
    /// store has never seen
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(DomainError::InvalidTaskId(value));
        }
        Ok(Self(value))
    }
}

impl FromStr for TaskId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SessionPageId
// ============================================================================

/// Identifier for the remote page backing a sync session
///
/// Opaque to the core; used only to address the per-session sync
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPageId(String);

impl SessionPageId {
    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionPageId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(DomainError::InvalidSessionPageId(value));
        }
        Ok(Self(value))
    }
}

impl FromStr for SessionPageId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl Display for SessionPageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_temp_has_prefix() {
        let id = TaskId::new_temp();
        assert!(id.is_temp());
        assert!(id.as_str().starts_with(TEMP_ID_PREFIX));
    }

    #[test]
    fn test_new_temp_ids_are_unique() {
        let a = TaskId::new_temp();
        let b = TaskId::new_temp();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remote_id_is_not_temp() {
        let id = TaskId::try_from("blk_999".to_string()).unwrap();
        assert!(!id.is_temp());
        assert_eq!(id.as_str(), "blk_999");
    }

    #[test]
    fn test_blank_task_id_rejected() {
        assert!(TaskId::try_from(String::new()).is_err());
        assert!(TaskId::try_from("   ".to_string()).is_err());
    }

    #[test]
    fn test_task_id_from_str() {
        let id: TaskId = "blk_123".parse().unwrap();
        assert_eq!(id.to_string(), "blk_123");
    }

    #[test]
    fn test_blank_session_page_id_rejected() {
        assert!(SessionPageId::try_from(String::new()).is_err());
        assert!(SessionPageId::try_from("\t".to_string()).is_err());
    }

    #[test]
    fn test_session_page_id_roundtrip() {
        let id = SessionPageId::try_from("page-abc".to_string()).unwrap();
        assert_eq!(id.as_str(), "page-abc");
        assert_eq!(id.to_string(), "page-abc");
    }

    #[test]
    fn test_task_id_serde_transparent() {
        let id = TaskId::try_from("blk_1".to_string()).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"blk_1\"");
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
