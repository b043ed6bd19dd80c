//! Immutable, ordered working memory.
//!
//! Every operation returns a new `WorkingMemory`; the receiver is never
//! mutated. Cognitive steps take a memory and hand back an extended copy,
//! which is what lets a failed turn leave the soul's committed state alone.

use serde::{Deserialize, Serialize};

use kathor_types::llm::Message;
use kathor_types::memory::Memory;

/// Ordered conversation log owned by one soul.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingMemory {
    soul_name: String,
    memories: Vec<Memory>,
}

impl WorkingMemory {
    /// Empty memory for the named soul.
    pub fn new(soul_name: impl Into<String>) -> Self {
        Self {
            soul_name: soul_name.into(),
            memories: Vec::new(),
        }
    }

    /// Memory seeded with the persona blueprint as its first system entry.
    pub fn with_persona(soul_name: impl Into<String>, persona: impl Into<String>) -> Self {
        Self::new(soul_name).with_memory(Memory::system(persona))
    }

    pub fn soul_name(&self) -> &str {
        &self.soul_name
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn first(&self) -> Option<&Memory> {
        self.memories.first()
    }

    pub fn last(&self) -> Option<&Memory> {
        self.memories.last()
    }

    /// A copy with `memory` appended.
    pub fn with_memory(&self, memory: Memory) -> Self {
        let mut memories = Vec::with_capacity(self.memories.len() + 1);
        memories.extend_from_slice(&self.memories);
        memories.push(memory);
        Self {
            soul_name: self.soul_name.clone(),
            memories,
        }
    }

    /// The first `n` entries (all of them if fewer).
    pub fn head(&self, n: usize) -> Self {
        Self {
            soul_name: self.soul_name.clone(),
            memories: self.memories.iter().take(n).cloned().collect(),
        }
    }

    /// The last `n` entries (all of them if fewer).
    pub fn tail(&self, n: usize) -> Self {
        let start = self.memories.len().saturating_sub(n);
        Self {
            soul_name: self.soul_name.clone(),
            memories: self.memories[start..].to_vec(),
        }
    }

    /// `self` followed by `other`. Keeps this memory's soul name.
    pub fn concat(&self, other: &WorkingMemory) -> Self {
        let mut memories = self.memories.clone();
        memories.extend_from_slice(&other.memories);
        Self {
            soul_name: self.soul_name.clone(),
            memories,
        }
    }

    /// Provider-facing message list, in order.
    pub fn to_messages(&self) -> Vec<Message> {
        self.memories.iter().map(Memory::to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kathor_types::llm::MessageRole;

    fn sample(n: usize) -> WorkingMemory {
        (0..n).fold(WorkingMemory::new("Kathor"), |m, i| {
            m.with_memory(Memory::user(format!("entry {i}")))
        })
    }

    #[test]
    fn with_memory_leaves_original_untouched() {
        let base = sample(2);
        let extended = base.with_memory(Memory::assistant("reply"));
        assert_eq!(base.len(), 2);
        assert_eq!(extended.len(), 3);
        assert_eq!(extended.last().unwrap().content, "reply");
    }

    #[test]
    fn head_and_tail_clamp() {
        let memory = sample(5);
        assert_eq!(memory.head(1).memories()[0].content, "entry 0");
        assert_eq!(memory.tail(2).memories()[0].content, "entry 3");
        assert_eq!(memory.tail(50).len(), 5);
        assert_eq!(memory.head(50).len(), 5);
        assert!(memory.tail(0).is_empty());
    }

    #[test]
    fn concat_preserves_order_and_name() {
        let left = sample(2);
        let right = WorkingMemory::new("Other").with_memory(Memory::assistant("tail"));
        let joined = left.concat(&right);
        assert_eq!(joined.soul_name(), "Kathor");
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.last().unwrap().content, "tail");
    }

    #[test]
    fn persona_is_first_system_entry() {
        let memory = WorkingMemory::with_persona("Kathor", "# Kathor Minos");
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.first().unwrap().role, MessageRole::System);
        assert_eq!(memory.to_messages()[0].content, "# Kathor Minos");
    }
}
