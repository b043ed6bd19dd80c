//! Working-memory entries.
//!
//! A `Memory` is one role-tagged line of the conversation log that is passed
//! between cognitive steps. The ordered collection lives in
//! `kathor_core::memory::WorkingMemory`.

use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole};

/// A single role-tagged entry in working memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub role: MessageRole,
    pub content: String,
    /// Speaker name, when the entry came from a named participant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "MemoryMetadata::is_empty")]
    pub metadata: MemoryMetadata,
}

/// Metadata tags attached to a memory entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// Set on the entry the compression subprocess writes in place of the
    /// turns it dropped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub conversation_summary: bool,
}

impl MemoryMetadata {
    pub fn is_empty(&self) -> bool {
        !self.conversation_summary
    }
}

impl Memory {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            metadata: MemoryMetadata::default(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Attach a speaker name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Tag this entry as a compression summary.
    pub fn as_conversation_summary(mut self) -> Self {
        self.metadata.conversation_summary = true;
        self
    }

    pub fn is_conversation_summary(&self) -> bool {
        self.metadata.conversation_summary
    }

    /// Convert to the provider-facing message shape.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_memory_omits_metadata() {
        let memory = Memory::user("User said: \"hi\"").with_name("User");
        let json = serde_json::to_value(&memory).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["name"], "User");
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_summary_tag_serializes() {
        let memory = Memory::assistant("## Conversation so far").as_conversation_summary();
        assert!(memory.is_conversation_summary());
        let json = serde_json::to_value(&memory).unwrap();
        assert_eq!(json["metadata"]["conversation_summary"], true);

        let parsed: Memory = serde_json::from_value(json).unwrap();
        assert!(parsed.is_conversation_summary());
    }

    #[test]
    fn test_to_message_drops_name_and_metadata() {
        let memory = Memory::system("You are Kathor.").with_name("Kathor");
        let message = memory.to_message();
        assert_eq!(message.role, MessageRole::System);
        assert_eq!(message.content, "You are Kathor.");
    }
}
