use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::process::ProcessKind;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a live soul (one conversation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoulId(pub Uuid);

impl SoulId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SoulId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SoulId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SoulId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Process-scoped notes kept across turns.
///
/// Both fields are overwritten on every update, never appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoulNotes {
    /// Running paragraph about the conversation, folded in by compression.
    pub conversation: String,
    /// Running bullet notes about the user.
    pub user: String,
}

impl SoulNotes {
    /// Notes a fresh soul starts with.
    pub fn initial(soul_name: &str) -> Self {
        Self {
            conversation: format!(
                "{soul_name} is talking to one or more people and trying to learn as much as possible about them."
            ),
            user: String::new(),
        }
    }
}

/// Read-only view of a soul for status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoulSnapshot {
    pub id: SoulId,
    pub soul_name: String,
    pub process: ProcessKind,
    pub memory_len: usize,
    pub notes: SoulNotes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soul_id_roundtrip() {
        let id = SoulId::new();
        let parsed: SoulId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_soul_id_serializes_as_plain_uuid() {
        let id = SoulId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_initial_notes_mention_soul() {
        let notes = SoulNotes::initial("Kathor");
        assert!(notes.conversation.starts_with("Kathor is talking"));
        assert!(notes.user.is_empty());
    }
}
