//! Shared, read-only context every step and process runs against.

use kathor_types::config::{KathorConfig, LlmConfig, MemoryConfig};

use crate::llm::BoxLlmProvider;
use crate::memory::WorkingMemory;

/// Provider, persona and tuning shared by all souls of one engine.
#[derive(Debug)]
pub struct SoulRuntime {
    provider: BoxLlmProvider,
    soul_name: String,
    persona: String,
    llm: LlmConfig,
    memory: MemoryConfig,
}

impl SoulRuntime {
    pub fn new(provider: BoxLlmProvider, config: &KathorConfig, persona: impl Into<String>) -> Self {
        Self {
            provider,
            soul_name: config.soul.name.clone(),
            persona: persona.into(),
            llm: config.llm.clone(),
            memory: config.memory.clone(),
        }
    }

    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn soul_name(&self) -> &str {
        &self.soul_name
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn llm(&self) -> &LlmConfig {
        &self.llm
    }

    pub fn memory_config(&self) -> &MemoryConfig {
        &self.memory
    }

    /// Working memory a fresh or reset soul starts from.
    pub fn fresh_memory(&self) -> WorkingMemory {
        WorkingMemory::with_persona(&self.soul_name, &self.persona)
    }
}
